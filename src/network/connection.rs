//! Connection Handler
//!
//! Serves a single client connection.

use std::io::{BufReader, Read, Write};
use std::sync::Arc;

use crate::error::Result;
use crate::handler::Handler;
use crate::protocol::{read_request, write_response, Request, Response};
use crate::transport::TransportKind;

/// Serves one client connection over any byte stream
pub struct Connection<S: Read + Write> {
    /// Stream (buffered on the read side; responses go out in one write)
    stream: BufReader<S>,

    /// The handler shared with the other listener
    handler: Arc<Handler>,

    /// Peer address for logging
    peer_addr: String,

    /// Listener this connection arrived on, for logging
    kind: TransportKind,
}

impl<S: Read + Write> Connection<S> {
    /// Create a new connection handler
    pub fn new(
        stream: S,
        handler: Arc<Handler>,
        peer_addr: impl Into<String>,
        kind: TransportKind,
    ) -> Self {
        Self {
            stream: BufReader::new(stream),
            handler,
            peer_addr: peer_addr.into(),
            kind,
        }
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Reads requests in a loop and sends responses, one fully completed
    /// before the next is read. Returns `Ok` when the client goes away and
    /// `Err` when it sent something undecodable or the transport failed.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("{} connection established from {}", self.kind, self.peer_addr);

        loop {
            let request = match read_request(&mut self.stream) {
                Ok(request) => request,
                Err(e) if e.is_disconnect() => {
                    tracing::debug!("Client {} disconnected", self.peer_addr);
                    return Ok(());
                }
                Err(e) if e.is_timeout() => {
                    tracing::debug!("Read timeout for client {}", self.peer_addr);
                    return Ok(());
                }
                Err(e) => {
                    tracing::debug!("Error reading from {}: {}", self.peer_addr, e);
                    return Err(e);
                }
            };

            tracing::trace!("Received request from {}: {:?}", self.peer_addr, request);

            let response = self.execute(request);

            if let Err(e) = write_response(self.stream.get_mut(), &response) {
                if e.is_disconnect() {
                    tracing::debug!(
                        "Client {} disconnected before response could be sent: {}",
                        self.peer_addr,
                        e
                    );
                    return Ok(());
                }
                tracing::debug!("Error writing to {}: {}", self.peer_addr, e);
                return Err(e);
            }
        }
    }

    fn execute(&self, request: Request) -> Response {
        let op = request.name();
        let response = self.handler.handle(request);
        if let Response::InvalidOperation { why } = &response {
            tracing::debug!("{} from {} rejected: {}", op, self.peer_addr, why);
        }
        response
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    /// Give back the underlying stream
    pub fn into_inner(self) -> S {
        self.stream.into_inner()
    }
}
