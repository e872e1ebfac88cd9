//! # DualKV
//!
//! A minimal remote key-value store:
//! - `get(key)` / `put(key, value)` over a small binary RPC protocol
//! - One in-memory store, last write wins
//! - Two listeners sharing one handler: plaintext TCP and TLS
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────┐      ┌──────────────────────┐
//! │  Plaintext Listener  │      │  Encrypted Listener  │
//! │   (own thread, TCP)  │      │   (own thread, TLS)  │
//! └──────────┬───────────┘      └──────────┬───────────┘
//!            │                             │
//!            └──────────────┬──────────────┘
//!                           ▼
//!                ┌─────────────────────┐
//!                │       Handler       │
//!                │  (Arc, shared once) │
//!                └──────────┬──────────┘
//!                           ▼
//!                ┌─────────────────────┐
//!                │        Store        │
//!                │      (RwLock)       │
//!                └─────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod store;
pub mod handler;
pub mod protocol;
pub mod transport;
pub mod network;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{KeyNotFound, KvError, Result};
pub use config::{ClientConfig, Config, TlsCredentials};
pub use store::Store;
pub use handler::Handler;
pub use client::Client;
pub use transport::TransportKind;
pub use network::Server;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of DualKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
