//! Channels between a sending device and an e-reader.

use serde::{Deserialize, Serialize};

use crate::types::ChannelId;

/// A relay between two paired clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub channel_id: ChannelId,
    /// Friendly name of the client that typed the pairing code.
    pub sender_name: String,
    /// Friendly name of the client that displayed the pairing code.
    pub ereader_name: String,
    /// Creation time (Unix ms).
    pub created_at: i64,
}

impl Channel {
    pub fn new(
        channel_id: ChannelId,
        sender_name: impl Into<String>,
        ereader_name: impl Into<String>,
        created_at: i64,
    ) -> Self {
        Self {
            channel_id,
            sender_name: sender_name.into(),
            ereader_name: ereader_name.into(),
            created_at,
        }
    }
}
