//! Error types for DualKV
//!
//! Provides a unified error type for all operations, plus the one typed
//! failure the store itself can produce.

use thiserror::Error;

/// Result type alias using KvError
pub type Result<T> = std::result::Result<T, KvError>;

/// Reason text carried by every not-found failure
pub const KEY_NOT_FOUND_REASON: &str = "Key not found in store.";

/// Unified error type for DualKV operations
#[derive(Debug, Error)]
pub enum KvError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    #[error("Credential error: {0}")]
    Credentials(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Application Errors
    // -------------------------------------------------------------------------
    /// The server rejected the call; the only wire-visible failure.
    #[error("Invalid operation: \"{why}\"")]
    InvalidOperation { why: String },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl KvError {
    /// True for errors that mean the peer went away rather than misbehaved
    pub fn is_disconnect(&self) -> bool {
        match self {
            KvError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::UnexpectedEof
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }

    /// True for read/write timeouts (Windows reports TimedOut, unix WouldBlock)
    pub fn is_timeout(&self) -> bool {
        match self {
            KvError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }
}

/// A `get` on a key that was never written
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct KeyNotFound {
    pub reason: String,
}

impl Default for KeyNotFound {
    fn default() -> Self {
        Self {
            reason: KEY_NOT_FOUND_REASON.to_string(),
        }
    }
}

impl From<KeyNotFound> for KvError {
    fn from(e: KeyNotFound) -> Self {
        KvError::InvalidOperation { why: e.reason }
    }
}
