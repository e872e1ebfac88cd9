//! Response definitions
//!
//! Represents replies sent back to clients.

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Value = 0x00,
    Done = 0x01,
    InvalidOperation = 0x02,
}

/// A reply to one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Successful `get`
    Value(String),

    /// Successful `put`
    Done,

    /// The call was rejected; `why` is shown to the user
    InvalidOperation { why: String },
}

impl Response {
    /// Create an invalid-operation response
    pub fn invalid_operation(why: impl Into<String>) -> Self {
        Response::InvalidOperation { why: why.into() }
    }

    /// Get the status code
    pub fn status(&self) -> Status {
        match self {
            Response::Value(_) => Status::Value,
            Response::Done => Status::Done,
            Response::InvalidOperation { .. } => Status::InvalidOperation,
        }
    }

    /// Payload bytes as they go on the wire
    pub fn payload(&self) -> &[u8] {
        match self {
            Response::Value(value) => value.as_bytes(),
            Response::Done => &[],
            Response::InvalidOperation { why } => why.as_bytes(),
        }
    }
}
