//! Request definitions
//!
//! Represents calls issued by clients.

/// Operation codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    Get = 0x01,
    Put = 0x02,
}

/// A decoded RPC call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Look up the value of a key
    Get { key: String },

    /// Insert or overwrite a key
    Put { key: String, value: String },
}

impl Request {
    pub fn get(key: impl Into<String>) -> Self {
        Request::Get { key: key.into() }
    }

    pub fn put(key: impl Into<String>, value: impl Into<String>) -> Self {
        Request::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Get the operation code
    pub fn op_code(&self) -> OpCode {
        match self {
            Request::Get { .. } => OpCode::Get,
            Request::Put { .. } => OpCode::Put,
        }
    }

    /// Operation name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Request::Get { .. } => "get",
            Request::Put { .. } => "put",
        }
    }
}
