//! Request Handler
//!
//! Adapts decoded requests to `Store` operations. One instance is built by the
//! server and shared by both listeners, so a write on either transport is
//! visible to reads on the other.

use crate::protocol::{Request, Response};
use crate::store::Store;

/// Dispatches requests against the one store
#[derive(Debug, Default)]
pub struct Handler {
    store: Store,
}

impl Handler {
    /// Create a handler over an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a handler over an existing store
    pub fn with_store(store: Store) -> Self {
        Self { store }
    }

    /// Execute one request and build its response
    ///
    /// `KeyNotFound` becomes `Response::InvalidOperation`; nothing else fails.
    pub fn handle(&self, request: Request) -> Response {
        match request {
            Request::Get { key } => match self.store.get(&key) {
                Ok(value) => Response::Value(value),
                Err(not_found) => Response::invalid_operation(not_found.reason),
            },
            Request::Put { key, value } => {
                self.store.put(key, value);
                Response::Done
            }
        }
    }

    /// Access the underlying store
    pub fn store(&self) -> &Store {
        &self.store
    }
}
