//! Network Module
//!
//! TCP listeners and per-connection serving.
//!
//! ## Architecture
//! - One thread per listener (plaintext, encrypted)
//! - Each listener serves one connection at a time, one request at a time
//! - Both listeners dispatch into the same `Handler`

mod server;
mod listener;
mod connection;

pub use server::{ListenerHandle, RunningServer, Server};
pub use listener::Listener;
pub use connection::Connection;
