//! Server
//!
//! Owns the one handler and runs both listeners on their own threads.

use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::config::Config;
use crate::error::{KvError, Result};
use crate::handler::Handler;
use crate::transport::{load_server_tls, TransportKind, TransportPolicy};

use super::Listener;

/// DualKV server: one store, one handler, two listeners
pub struct Server {
    config: Config,
    handler: Arc<Handler>,
}

impl Server {
    /// Create a server over a fresh, empty store
    pub fn new(config: Config) -> Self {
        Self::with_handler(config, Arc::new(Handler::new()))
    }

    /// Create a server around an existing handler
    pub fn with_handler(config: Config, handler: Arc<Handler>) -> Self {
        Self { config, handler }
    }

    pub fn handler(&self) -> &Arc<Handler> {
        &self.handler
    }

    /// Bind both listeners and start serving them
    ///
    /// Binding happens on the calling thread, so the handler is fully built
    /// before either listener thread runs. A listener that cannot start is
    /// logged and skipped; the call only fails if neither could.
    pub fn start(&self) -> Result<RunningServer> {
        let mut listeners = Vec::with_capacity(2);

        for kind in [TransportKind::Plaintext, TransportKind::Encrypted] {
            let listener = match self.bind(kind) {
                Ok(Some(listener)) => listener,
                Ok(None) => continue,
                Err(e) => {
                    tracing::error!("Failed to start {} listener: {}", kind, e);
                    continue;
                }
            };

            match ListenerHandle::spawn(listener) {
                Ok(handle) => listeners.push(handle),
                Err(e) => tracing::error!("Failed to spawn {} listener: {}", kind, e),
            }
        }

        if listeners.is_empty() {
            return Err(KvError::Config("no listener could be started".to_string()));
        }

        Ok(RunningServer { listeners })
    }

    /// Bind the listener for `kind`; `None` when it is not configured
    fn bind(&self, kind: TransportKind) -> Result<Option<Listener>> {
        let (addr, policy) = match kind {
            TransportKind::Plaintext => (self.config.plaintext_addr(), TransportPolicy::Plaintext),
            TransportKind::Encrypted => {
                let Some(tls) = &self.config.tls else {
                    tracing::warn!("No TLS credentials configured; encrypted listener disabled");
                    return Ok(None);
                };
                let server_tls = load_server_tls(&tls.cert_path, &tls.key_path)?;
                (self.config.encrypted_addr(), TransportPolicy::Tls(server_tls))
            }
        };

        let listener = Listener::bind(&addr, policy, Arc::clone(&self.handler))?
            .with_timeouts(self.config.read_timeout_ms, self.config.write_timeout_ms);
        Ok(Some(listener))
    }
}

/// A listener running on its own thread
pub struct ListenerHandle {
    kind: TransportKind,
    addr: SocketAddr,
    thread: JoinHandle<Result<()>>,
}

impl ListenerHandle {
    fn spawn(listener: Listener) -> Result<Self> {
        let kind = listener.kind();
        let addr = listener.local_addr()?;
        let thread = thread::Builder::new()
            .name(format!("{}-listener", kind))
            .spawn(move || listener.serve())?;

        Ok(Self { kind, addr, thread })
    }

    pub fn kind(&self) -> TransportKind {
        self.kind
    }

    /// Address actually bound (resolves port 0)
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

/// Handle to the listeners started by `Server::start`
pub struct RunningServer {
    listeners: Vec<ListenerHandle>,
}

impl RunningServer {
    /// Listeners that are up
    pub fn listeners(&self) -> &[ListenerHandle] {
        &self.listeners
    }

    /// Bound address of the listener for `kind`, if it started
    pub fn addr(&self, kind: TransportKind) -> Option<SocketAddr> {
        self.listeners
            .iter()
            .find(|l| l.kind == kind)
            .map(|l| l.addr)
    }

    /// Block for the lifetime of the listeners
    pub fn wait(self) -> Result<()> {
        let mut result = Ok(());
        for listener in self.listeners {
            match listener.thread.join() {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::error!("{} listener stopped: {}", listener.kind, e);
                    if result.is_ok() {
                        result = Err(e);
                    }
                }
                Err(_) => {
                    tracing::error!("{} listener panicked", listener.kind);
                    if result.is_ok() {
                        result = Err(KvError::Config(format!(
                            "{} listener panicked",
                            listener.kind
                        )));
                    }
                }
            }
        }
        result
    }
}
