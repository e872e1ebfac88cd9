//! Listener
//!
//! Binds one endpoint and serves it with a blocking accept loop.

use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::handler::Handler;
use crate::transport::{ServerStream, TransportKind, TransportPolicy};

use super::Connection;

/// A bound endpoint plus the policy its connections run under
pub struct Listener {
    listener: TcpListener,
    policy: TransportPolicy,
    handler: Arc<Handler>,
    read_timeout_ms: u64,
    write_timeout_ms: u64,
}

impl Listener {
    /// Bind `addr` (host:port); port 0 picks an ephemeral port
    pub fn bind(addr: &str, policy: TransportPolicy, handler: Arc<Handler>) -> Result<Self> {
        let listener = TcpListener::bind(addr)?;
        Ok(Self {
            listener,
            policy,
            handler,
            read_timeout_ms: 0,
            write_timeout_ms: 0,
        })
    }

    /// Configure per-connection timeouts (0 = none)
    pub fn with_timeouts(mut self, read_ms: u64, write_ms: u64) -> Self {
        self.read_timeout_ms = read_ms;
        self.write_timeout_ms = write_ms;
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn kind(&self) -> TransportKind {
        self.policy.kind()
    }

    /// Accept and serve connections one at a time, forever
    ///
    /// A failing connection is logged and dropped; it never ends the loop.
    pub fn serve(&self) -> Result<()> {
        tracing::info!(
            "{} listener serving on {}",
            self.kind(),
            self.local_addr()?
        );

        for incoming in self.listener.incoming() {
            match incoming {
                Ok(tcp) => {
                    let peer_addr = peer_label(&tcp);
                    if let Err(e) = self.serve_connection(tcp) {
                        tracing::warn!(
                            "{} connection from {} closed with error: {}",
                            self.kind(),
                            peer_addr,
                            e
                        );
                    }
                }
                Err(e) => {
                    tracing::error!("{} accept failed: {}", self.kind(), e);
                }
            }
        }

        Ok(())
    }

    /// Apply the transport policy to one accepted socket and serve it
    ///
    /// Errors are returned, not logged; `serve` reports them once.
    pub fn serve_connection(&self, tcp: TcpStream) -> Result<()> {
        let peer_addr = peer_label(&tcp);

        // Disable Nagle's algorithm; every exchange is one small frame each way
        tcp.set_nodelay(true)?;
        if self.read_timeout_ms > 0 {
            tcp.set_read_timeout(Some(Duration::from_millis(self.read_timeout_ms)))?;
        }
        if self.write_timeout_ms > 0 {
            tcp.set_write_timeout(Some(Duration::from_millis(self.write_timeout_ms)))?;
        }

        let stream = ServerStream::accept(tcp, &self.policy)?;

        Connection::new(stream, Arc::clone(&self.handler), peer_addr, self.kind()).handle()
    }
}

fn peer_label(tcp: &TcpStream) -> String {
    tcp.peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}
