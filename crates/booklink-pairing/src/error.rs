//! Error types for the pairing register.

use booklink_core::{ClientId, ErrorClass, PairingCode};
use thiserror::Error;

/// Errors that can occur during pairing operations.
#[derive(Debug, Error)]
pub enum PairingError {
    /// The register already tracks the maximum number of clients.
    #[error("exceeding maximum number of clients in pairing ({max})")]
    TooManyClients { max: usize },

    /// No live client uses this pairing code.
    #[error("client with pairing code {0} not found")]
    CodeNotFound(PairingCode),

    /// No live client has this id.
    #[error("client with id {0} not found")]
    ClientNotFound(ClientId),

    /// Every random draw collided with an existing value.
    #[error("failed to generate a unique {what} after {attempts} draws")]
    Exhausted { what: &'static str, attempts: usize },
}

impl PairingError {
    /// Coarse classification for adapters.
    pub fn class(&self) -> ErrorClass {
        match self {
            PairingError::TooManyClients { .. } => ErrorClass::Capacity,
            PairingError::CodeNotFound(_) | PairingError::ClientNotFound(_) => {
                ErrorClass::NotFound
            }
            PairingError::Exhausted { .. } => ErrorClass::Exhausted,
        }
    }
}

/// Result type for pairing operations.
pub type Result<T> = std::result::Result<T, PairingError>;
