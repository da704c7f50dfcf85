//! Typed boundary between resolver values and cache bytes
//!
//! Every cached value is wrapped in a versioned envelope. A payload written by
//! a different schema version, for a different kind, or that no longer
//! deserializes is reported as a miss instead of being decoded into the wrong
//! shape.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::shared::errors::AppResult;

/// Bump whenever a cached payload's shape changes
pub const CACHE_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct CacheEnvelope<T> {
    version: u32,
    kind: String,
    payload: T,
}

pub fn encode<T: Serialize>(kind: &str, payload: &T) -> AppResult<Vec<u8>> {
    let envelope = CacheEnvelope {
        version: CACHE_SCHEMA_VERSION,
        kind: kind.to_string(),
        payload,
    };
    Ok(serde_json::to_vec(&envelope)?)
}

/// Decode cache bytes, failing closed (returning `None`) on any mismatch
pub fn decode<T: DeserializeOwned>(kind: &str, bytes: &[u8]) -> Option<T> {
    match serde_json::from_slice::<CacheEnvelope<T>>(bytes) {
        Ok(envelope) if envelope.version == CACHE_SCHEMA_VERSION && envelope.kind == kind => {
            Some(envelope.payload)
        }
        Ok(envelope) => {
            log::debug!(
                "Discarding cached {} payload (version {}, kind {})",
                kind,
                envelope.version,
                envelope.kind
            );
            None
        }
        Err(e) => {
            log::debug!("Discarding undecodable cached {} payload: {}", kind, e);
            None
        }
    }
}
