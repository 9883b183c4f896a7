//! Service configuration.

use serde::{Deserialize, Serialize};

use booklink_pairing::PairingConfig;
use booklink_presence::PresenceConfig;
use booklink_store::FileRegisterConfig;

use crate::error::{BookLinkError, Result};

/// Configuration for [`ApplicationService`](crate::ApplicationService).
///
/// Missing fields take their defaults when deserialized, except that the
/// two secrets default to empty and [`ServiceConfig::validate`] rejects
/// them.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Signs client identity tokens.
    pub client_token_secret: String,
    /// Signs channel membership tokens.
    pub channel_token_secret: String,

    pub max_clients_in_pairing: usize,
    pub client_expiration_secs: u64,

    pub max_files_in_channel: usize,
    pub total_file_capacity_bytes: u64,
    pub file_expiration_secs: u64,

    pub presence_timeout_secs: u64,

    /// Random draws before unique id generation gives up.
    pub max_random_draws: usize,

    /// Reject tokens older than this. `None` accepts tokens of any age.
    pub token_max_age_secs: Option<u64>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            client_token_secret: String::new(),
            channel_token_secret: String::new(),
            max_clients_in_pairing: 100,
            client_expiration_secs: 60 * 60 * 24,
            max_files_in_channel: 20,
            total_file_capacity_bytes: 100 * 1024 * 1024,
            file_expiration_secs: 60 * 2,
            presence_timeout_secs: 5,
            max_random_draws: 10,
            token_max_age_secs: None,
        }
    }
}

impl ServiceConfig {
    /// Default limits with the given secrets.
    pub fn new(
        client_token_secret: impl Into<String>,
        channel_token_secret: impl Into<String>,
    ) -> Self {
        Self {
            client_token_secret: client_token_secret.into(),
            channel_token_secret: channel_token_secret.into(),
            ..Self::default()
        }
    }

    /// Check that the service can run with this configuration.
    pub fn validate(&self) -> Result<()> {
        if self.client_token_secret.is_empty() || self.channel_token_secret.is_empty() {
            return Err(BookLinkError::Config("token secrets must not be empty".into()));
        }
        // a client token must never pass as a channel token
        if self.client_token_secret == self.channel_token_secret {
            return Err(BookLinkError::Config(
                "client and channel token secrets must differ".into(),
            ));
        }

        let zero = [
            ("max_clients_in_pairing", self.max_clients_in_pairing == 0),
            ("max_files_in_channel", self.max_files_in_channel == 0),
            ("total_file_capacity_bytes", self.total_file_capacity_bytes == 0),
            ("max_random_draws", self.max_random_draws == 0),
            ("token_max_age_secs", self.token_max_age_secs == Some(0)),
        ];
        if let Some((name, _)) = zero.iter().find(|(_, is_zero)| *is_zero) {
            return Err(BookLinkError::Config(format!("{name} must be greater than zero")));
        }

        Ok(())
    }

    pub fn pairing(&self) -> PairingConfig {
        PairingConfig {
            max_clients_in_pairing: self.max_clients_in_pairing,
            client_expiration_secs: self.client_expiration_secs,
            max_random_draws: self.max_random_draws,
        }
    }

    pub fn files(&self) -> FileRegisterConfig {
        FileRegisterConfig {
            max_files_in_channel: self.max_files_in_channel,
            file_expiration_secs: self.file_expiration_secs,
            max_total_file_size_bytes: self.total_file_capacity_bytes,
            max_random_draws: self.max_random_draws,
        }
    }

    pub fn presence(&self) -> PresenceConfig {
        PresenceConfig {
            timeout_secs: self.presence_timeout_secs,
        }
    }
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("client_token_secret", &"<redacted>")
            .field("channel_token_secret", &"<redacted>")
            .field("max_clients_in_pairing", &self.max_clients_in_pairing)
            .field("client_expiration_secs", &self.client_expiration_secs)
            .field("max_files_in_channel", &self.max_files_in_channel)
            .field("total_file_capacity_bytes", &self.total_file_capacity_bytes)
            .field("file_expiration_secs", &self.file_expiration_secs)
            .field("presence_timeout_secs", &self.presence_timeout_secs)
            .field("max_random_draws", &self.max_random_draws)
            .field("token_max_age_secs", &self.token_max_age_secs)
            .finish()
    }
}
