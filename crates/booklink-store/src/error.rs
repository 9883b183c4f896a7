//! Error types for the file register.

use booklink_core::{ChannelId, ErrorClass, FileId};
use thiserror::Error;

/// Errors that can occur during file register operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Adding the file would push the register over its byte cap.
    #[error("total file size exceeds limit: {used} + {requested} > {max} bytes")]
    TotalSizeExceeded { requested: u64, used: u64, max: u64 },

    /// The channel already holds the maximum number of files.
    #[error("channel {channel_id} is full ({max} files)")]
    ChannelFull { channel_id: ChannelId, max: usize },

    /// No file with this id (in the queried scope).
    #[error("file not found: {0}")]
    FileNotFound(FileId),

    /// The channel holds no files.
    #[error("channel not found: {0}")]
    ChannelNotFound(ChannelId),

    /// Every random file id draw collided.
    #[error("failed to generate a unique file id after {attempts} draws")]
    Exhausted { attempts: usize },
}

impl StoreError {
    /// Coarse classification for adapters.
    pub fn class(&self) -> ErrorClass {
        match self {
            StoreError::TotalSizeExceeded { .. } | StoreError::ChannelFull { .. } => {
                ErrorClass::Capacity
            }
            StoreError::FileNotFound(_) | StoreError::ChannelNotFound(_) => ErrorClass::NotFound,
            StoreError::Exhausted { .. } => ErrorClass::Exhausted,
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
