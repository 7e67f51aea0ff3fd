//! Serialization for the Taskdeck wire protocol.
//!
//! Provides postcard encode/decode helpers, along with length-prefix
//! framing variants for stream-based transports that do not preserve
//! message boundaries.

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Error type for codec encode/decode operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// Frame is incomplete or has an invalid length prefix.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
}

/// Encodes a value into a byte vector using postcard.
///
/// # Errors
///
/// Returns `CodecError::Serialization` if the value cannot be serialized.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    postcard::to_allocvec(value).map_err(|e| CodecError::Serialization(e.to_string()))
}

/// Decodes a value from a byte slice using postcard.
///
/// # Errors
///
/// Returns `CodecError::Serialization` if the bytes cannot be deserialized.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    postcard::from_bytes(bytes).map_err(|e| CodecError::Serialization(e.to_string()))
}

/// Encodes a value with a 4-byte little-endian length prefix.
///
/// Wire format: `[u32 length (LE)][payload bytes]`
///
/// # Errors
///
/// Returns `CodecError::Serialization` if the value cannot be serialized,
/// or `CodecError::InvalidFrame` if the payload exceeds `u32::MAX` bytes.
pub fn encode_framed<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    let payload = encode(value)?;
    let len = u32::try_from(payload.len())
        .map_err(|_| CodecError::InvalidFrame("payload exceeds u32::MAX bytes".to_string()))?;
    let mut framed = Vec::with_capacity(4 + payload.len());
    framed.extend_from_slice(&len.to_le_bytes());
    framed.extend_from_slice(&payload);
    Ok(framed)
}

/// Decodes a length-prefixed value, returning it and the bytes consumed.
///
/// # Errors
///
/// Returns `CodecError::InvalidFrame` if the buffer is shorter than the
/// prefix plus the declared payload length, or `CodecError::Serialization`
/// if the payload cannot be deserialized.
pub fn decode_framed<T: DeserializeOwned>(bytes: &[u8]) -> Result<(T, usize), CodecError> {
    let prefix: [u8; 4] = bytes
        .get(..4)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| CodecError::InvalidFrame("missing length prefix".to_string()))?;
    let len = u32::from_le_bytes(prefix) as usize;

    let payload = bytes
        .get(4..4 + len)
        .ok_or_else(|| CodecError::InvalidFrame(format!("declared {len} bytes, frame truncated")))?;

    let value = decode(payload)?;
    Ok((value, 4 + len))
}
