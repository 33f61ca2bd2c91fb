//! Binary codec shared by persistence and the authority wire protocol.
//!
//! Empty input decodes to `None` without error, and `None` encodes to empty bytes, so an
//! absent record and an empty payload are the same thing on disk and on the wire.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::LedgerError;

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, LedgerError> {
    bincode::serialize(value).map_err(|e| LedgerError::Codec(e.to_string()))
}

pub fn encode_opt<T: Serialize>(value: Option<&T>) -> Result<Vec<u8>, LedgerError> {
    match value {
        Some(v) => encode(v),
        None => Ok(Vec::new()),
    }
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<Option<T>, LedgerError> {
    if bytes.is_empty() {
        return Ok(None);
    }
    bincode::deserialize(bytes)
        .map(Some)
        .map_err(|e| LedgerError::Codec(e.to_string()))
}
