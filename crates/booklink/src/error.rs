//! Error types for the application service.

use booklink_auth::AuthError;
use booklink_core::ErrorClass;
use booklink_pairing::PairingError;
use booklink_store::StoreError;
use thiserror::Error;

/// Errors that can occur during service operations.
#[derive(Debug, Error)]
pub enum BookLinkError {
    /// Pairing error.
    #[error("pairing error: {0}")]
    Pairing(#[from] PairingError),

    /// File storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Authentication error.
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// The service configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl BookLinkError {
    /// Coarse classification for adapters.
    pub fn class(&self) -> ErrorClass {
        match self {
            BookLinkError::Pairing(e) => e.class(),
            BookLinkError::Store(e) => e.class(),
            BookLinkError::Auth(e) => e.class(),
            BookLinkError::Config(_) => ErrorClass::Invalid,
        }
    }
}

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, BookLinkError>;
