//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ### Payload by Operation
//! - GET: key_len (4 bytes) + key
//! - PUT: key_len (4 bytes) + key + value
//!
//! All text is UTF-8 and all integers are big-endian.

use std::io::{self, Read, Write};

use super::{OpCode, Request, Response, Status};
use crate::error::{KvError, Result};

/// Header size: 1 byte op/status + 4 bytes length
pub const HEADER_SIZE: usize = 5;

/// Maximum payload size: whatever the 4-byte length field can express
pub const MAX_PAYLOAD_SIZE: u32 = u32::MAX;

/// Initial read buffer; grows with the bytes actually received
const READ_CHUNK: usize = 64 * 1024;

// =============================================================================
// Request Encoding/Decoding
// =============================================================================

/// Encode a request to bytes
///
/// Format: op (1) + payload_len (4) + payload
pub fn encode_request(request: &Request) -> Vec<u8> {
    let payload = match request {
        Request::Get { key } => {
            let mut payload = Vec::with_capacity(4 + key.len());
            payload.extend_from_slice(&(key.len() as u32).to_be_bytes());
            payload.extend_from_slice(key.as_bytes());
            payload
        }
        Request::Put { key, value } => {
            let mut payload = Vec::with_capacity(4 + key.len() + value.len());
            payload.extend_from_slice(&(key.len() as u32).to_be_bytes());
            payload.extend_from_slice(key.as_bytes());
            payload.extend_from_slice(value.as_bytes());
            payload
        }
    };

    frame(request.op_code() as u8, &payload)
}

/// Decode a request from a complete frame
pub fn decode_request(bytes: &[u8]) -> Result<Request> {
    let (op, payload) = split_frame(bytes, "request")?;

    match op {
        x if x == OpCode::Get as u8 => {
            let (key, rest) = split_key(payload, "GET")?;
            if !rest.is_empty() {
                return Err(KvError::Protocol(format!(
                    "GET request: unexpected {} trailing bytes",
                    rest.len()
                )));
            }
            Ok(Request::Get {
                key: utf8(key, "GET key")?,
            })
        }
        x if x == OpCode::Put as u8 => {
            let (key, value) = split_key(payload, "PUT")?;
            Ok(Request::Put {
                key: utf8(key, "PUT key")?,
                value: utf8(value, "PUT value")?,
            })
        }
        _ => Err(KvError::Protocol(format!(
            "Unknown request op: 0x{:02x}",
            op
        ))),
    }
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to bytes
///
/// Format: status (1) + payload_len (4) + payload
pub fn encode_response(response: &Response) -> Vec<u8> {
    frame(response.status() as u8, response.payload())
}

/// Decode a response from a complete frame
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    let (status, payload) = split_frame(bytes, "response")?;

    match status {
        x if x == Status::Value as u8 => Ok(Response::Value(utf8(payload, "value")?)),
        x if x == Status::Done as u8 => {
            if !payload.is_empty() {
                return Err(KvError::Protocol(format!(
                    "DONE response: unexpected payload of {} bytes",
                    payload.len()
                )));
            }
            Ok(Response::Done)
        }
        x if x == Status::InvalidOperation as u8 => Ok(Response::InvalidOperation {
            why: utf8(payload, "reason")?,
        }),
        _ => Err(KvError::Protocol(format!(
            "Unknown response status: 0x{:02x}",
            status
        ))),
    }
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read a complete request from a stream
///
/// Blocks until a complete request is received or an error occurs
pub fn read_request<R: Read>(reader: &mut R) -> Result<Request> {
    let frame = read_frame(reader)?;
    decode_request(&frame)
}

/// Write a request to a stream
///
/// Fails with `Protocol`, before anything is written, when the payload does
/// not fit the length field.
pub fn write_request<W: Write>(writer: &mut W, request: &Request) -> Result<()> {
    write_request_limited(writer, request, MAX_PAYLOAD_SIZE as usize)
}

fn write_request_limited<W: Write>(writer: &mut W, request: &Request, limit: usize) -> Result<()> {
    check_payload_len(request_payload_len(request), limit, "Request")?;
    let bytes = encode_request(request);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    let frame = read_frame(reader)?;
    decode_response(&frame)
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    check_payload_len(response.payload().len(), MAX_PAYLOAD_SIZE as usize, "Response")?;
    let bytes = encode_response(response);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

// =============================================================================
// Framing helpers
// =============================================================================

fn frame(tag: u8, payload: &[u8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(HEADER_SIZE + payload.len());
    message.push(tag);
    message.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    message.extend_from_slice(payload);
    message
}

fn request_payload_len(request: &Request) -> usize {
    match request {
        Request::Get { key } => 4 + key.len(),
        Request::Put { key, value } => 4 + key.len() + value.len(),
    }
}

fn check_payload_len(payload_len: usize, limit: usize, what: &str) -> Result<()> {
    if payload_len > limit {
        return Err(KvError::Protocol(format!(
            "{} payload too large: {} bytes (max {})",
            what, payload_len, limit
        )));
    }
    Ok(())
}

/// Split a full frame into its tag and payload, rejecting short or long input
fn split_frame<'a>(bytes: &'a [u8], what: &str) -> Result<(u8, &'a [u8])> {
    if bytes.len() < HEADER_SIZE {
        return Err(KvError::Protocol(format!(
            "Incomplete {} header: expected {} bytes, got {}",
            what,
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let tag = bytes[0];
    let payload_len = u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]) as usize;

    let total_len = HEADER_SIZE + payload_len;
    if bytes.len() != total_len {
        return Err(KvError::Protocol(format!(
            "Malformed {} frame: expected {} bytes, got {}",
            what,
            total_len,
            bytes.len()
        )));
    }

    Ok((tag, &bytes[HEADER_SIZE..]))
}

/// Read header then payload
///
/// The buffer grows with the bytes that actually arrive, so a corrupt length
/// field costs nothing until the peer sends that much data.
fn read_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let payload_len = u32::from_be_bytes([header[1], header[2], header[3], header[4]]) as usize;

    let mut message = Vec::with_capacity(HEADER_SIZE + payload_len.min(READ_CHUNK));
    message.extend_from_slice(&header);
    let received = (&mut *reader)
        .take(payload_len as u64)
        .read_to_end(&mut message)?;
    if received < payload_len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("frame truncated: expected {} bytes, got {}", payload_len, received),
        )
        .into());
    }

    Ok(message)
}

/// Split `key_len (4) + key + rest`
fn split_key<'a>(payload: &'a [u8], op: &str) -> Result<(&'a [u8], &'a [u8])> {
    if payload.len() < 4 {
        return Err(KvError::Protocol(format!(
            "{} request: missing key length",
            op
        )));
    }

    let key_len = u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]) as usize;

    if payload.len() - 4 < key_len {
        return Err(KvError::Protocol(format!(
            "{} request: incomplete key (expected {}, got {})",
            op,
            key_len,
            payload.len() - 4
        )));
    }

    Ok((&payload[4..4 + key_len], &payload[4 + key_len..]))
}

fn utf8(bytes: &[u8], field: &str) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| KvError::Protocol(format!("{} is not valid UTF-8: {}", field, e)))
}
