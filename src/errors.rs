//! Minegate error types.

use thiserror::Error;

/// Errors that can occur while processing a claim.
#[derive(Debug, Error)]
pub enum MinegateError {
    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Caller is not authenticated.
    #[error("Caller is not authenticated")]
    Authentication,

    /// Claim request body is malformed.
    #[error("Invalid claim request: {0}")]
    Validation(String),

    /// No account exists for the authenticated caller.
    #[error("Account not found")]
    AccountNotFound,

    /// Account is suspended or banned.
    #[error("Account is suspended")]
    AccountSuspended,

    /// Cooldown has not elapsed since the last accepted claim.
    #[error("Cooldown active, next claim in {remaining_seconds}s")]
    CooldownActive {
        /// Seconds until the next claim is admissible.
        remaining_seconds: i64,
    },

    /// Another account recently claimed from the same source address.
    #[error("Claim blocked: source address recently used by another account")]
    IpReuseBlocked,

    /// Presented device fingerprint is bound to a different account.
    #[error("Claim blocked: device fingerprint belongs to another account")]
    FingerprintConflict,

    /// Underlying store is unavailable or rejected a write.
    #[error("Storage error: {0}")]
    Persistence(String),
}

impl MinegateError {
    /// HTTP-style status class for this error.
    ///
    /// The embedding transport layer maps this straight onto a response
    /// status. Storage detail never leaks past the 500 class.
    pub fn status_class(&self) -> u16 {
        match self {
            Self::Authentication => 401,
            Self::Validation(_) => 400,
            Self::AccountNotFound => 404,
            Self::AccountSuspended => 403,
            Self::CooldownActive { .. } => 429,
            Self::IpReuseBlocked => 403,
            Self::FingerprintConflict => 403,
            Self::ConfigError(_) => 500,
            Self::Persistence(_) => 500,
        }
    }
}
