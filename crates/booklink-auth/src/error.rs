//! Error types for token issuing and verification.

use booklink_core::ErrorClass;
use thiserror::Error;

/// Errors that can occur while issuing or validating a token.
#[derive(Debug, Error)]
pub enum AuthError {
    /// `token` was called without every required claim.
    #[error("missing required claims: {0:?}")]
    MissingClaims(Vec<String>),

    /// A supplied claim uses a name the token format reserves.
    #[error("claim name is reserved: {0}")]
    ReservedClaim(String),

    /// The token could not be encoded.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Malformed token or bad signature.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Signature is fine but the claimed identity differs from the signed one.
    #[error("token does not match the claimed identity")]
    ClaimMismatch,

    /// The token is older than the configured lifetime.
    #[error("token issued at {issued_at} is older than {max_age_secs}s")]
    Expired { issued_at: i64, max_age_secs: u64 },
}

impl AuthError {
    /// Coarse classification for adapters.
    pub fn class(&self) -> ErrorClass {
        match self {
            AuthError::MissingClaims(_) | AuthError::ReservedClaim(_) | AuthError::Encoding(_) => {
                ErrorClass::Invalid
            }
            AuthError::InvalidToken(_) | AuthError::ClaimMismatch | AuthError::Expired { .. } => {
                ErrorClass::Authentication
            }
        }
    }
}

/// Result type for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;
