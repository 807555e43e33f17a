//! Claim request contract and fingerprint normalization.
//!
//! The client supplies a fingerprint hash and an opaque device descriptor.
//! Source IP and user-agent come from transport metadata, never from the
//! request body, so a client cannot spoof the signals the abuse detector
//! keys on.

use crate::MinegateError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Width of a normalized fingerprint hash (SHA-256, lowercase hex).
pub const FINGERPRINT_HEX_LEN: usize = 64;

/// Client-supplied claim request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimRequest {
    /// SHA-256 hash of client-derived device signals, lowercase hex.
    pub fingerprint_hash: String,

    /// Opaque device descriptor (browser, OS, model). Stored verbatim for
    /// review tooling, never interpreted.
    pub device_descriptor: Option<String>,
}

/// Transport-derived request metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestMeta {
    /// Source IP as observed by the transport.
    pub source_ip: String,

    /// User-agent header as observed by the transport.
    pub user_agent: String,
}

impl ClaimRequest {
    /// Validate the request body.
    ///
    /// Rejected requests have no side effects; validation runs before any
    /// store access.
    pub fn validate(&self) -> Result<(), MinegateError> {
        if self.fingerprint_hash.len() != FINGERPRINT_HEX_LEN {
            return Err(MinegateError::Validation(format!(
                "fingerprint_hash must be {} hex characters, got {}",
                FINGERPRINT_HEX_LEN,
                self.fingerprint_hash.len()
            )));
        }
        if !self
            .fingerprint_hash
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
        {
            return Err(MinegateError::Validation(
                "fingerprint_hash must be lowercase hex".to_string(),
            ));
        }
        Ok(())
    }
}

/// Hash raw device signals into the canonical fingerprint form.
///
/// Signals are joined with a separator before hashing so `["ab", "c"]` and
/// `["a", "bc"]` produce different fingerprints.
pub fn fingerprint_from_signals(signals: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for signal in signals {
        hasher.update(signal.as_bytes());
        hasher.update([0x1f]);
    }
    hex::encode(hasher.finalize())
}
