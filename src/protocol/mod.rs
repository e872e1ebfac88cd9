//! Protocol Module
//!
//! Defines the wire protocol for client-server communication. Both listeners
//! speak exactly the same frames; only the byte stream underneath differs.
//!
//! ## Request Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │  Op (1)  │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Operations
//! - 0x01: GET - Payload: key_len (4) + key
//! - 0x02: PUT - Payload: key_len (4) + key + value
//!
//! ## Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Status Codes
//! - 0x00: VALUE             - Payload: value
//! - 0x01: DONE              - Payload: empty
//! - 0x02: INVALID_OPERATION - Payload: reason

mod request;
mod response;
mod codec;

pub use request::{OpCode, Request};
pub use response::{Response, Status};
pub use codec::{
    decode_request, decode_response, encode_request, encode_response, read_request,
    read_response, write_request, write_response, HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
