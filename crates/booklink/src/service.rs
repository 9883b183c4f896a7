//! The application service.
//!
//! Ties the registries and authenticators together behind one boundary.
//! Every operation that touches a channel first checks the caller's channel
//! token; operations on a client first check the client token. Callers work
//! only with the request and response types defined here.

use std::collections::BTreeSet;
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::debug;

use booklink_auth::{Authenticator, CHANNEL_CLIENT_CLAIM, CHANNEL_ID_CLAIM, CLIENT_ID_CLAIM};
use booklink_core::{
    format_size, ChannelId, ClientId, Clock, CodeSource, FileId, PairingCode, RandomCodes,
    SystemClock, MILLIS_PER_SEC,
};
use booklink_pairing::PairingRegister;
use booklink_presence::ClientsOnline;
use booklink_store::{FileRegister, InMemoryEbookFile, RegisteredFile};

use crate::config::ServiceConfig;
use crate::error::Result;

/// A freshly registered client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientResponse {
    pub id: ClientId,
    pub pairing_code: PairingCode,
    /// Client identity token.
    pub token: String,
}

/// A channel together with a membership token for the asking client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelResponse {
    pub id: ChannelId,
    pub token: String,
}

/// Listing entry for a stored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescription {
    pub id: FileId,
    pub name: String,
    pub size: u64,
    /// `size` for humans, e.g. `"1.2MB"`.
    pub size_display: String,
    pub title: Option<String>,
    pub author: Option<String>,
    /// When the file stops being served (Unix ms).
    pub expires_at_ms: i64,
}

/// The BookLink application service.
pub struct ApplicationService {
    config: ServiceConfig,
    clock: Arc<dyn Clock>,
    pairing: PairingRegister,
    files: FileRegister<InMemoryEbookFile>,
    online: ClientsOnline,
    client_auth: Authenticator,
    channel_auth: Authenticator,
}

impl ApplicationService {
    /// Create a service using wall-clock time and random codes.
    pub fn new(config: ServiceConfig) -> Result<Self> {
        Self::with_sources(config, Arc::new(SystemClock), Arc::new(RandomCodes))
    }

    /// Create a service with explicit time and code sources.
    pub fn with_sources(
        config: ServiceConfig,
        clock: Arc<dyn Clock>,
        codes: Arc<dyn CodeSource>,
    ) -> Result<Self> {
        config.validate()?;

        let mut client_auth = Authenticator::for_clients(&config.client_token_secret);
        let mut channel_auth = Authenticator::for_channels(&config.channel_token_secret);
        if let Some(max_age) = config.token_max_age_secs {
            client_auth = client_auth.with_max_age(max_age, clock.clone());
            channel_auth = channel_auth.with_max_age(max_age, clock.clone());
        }

        Ok(Self {
            pairing: PairingRegister::with_sources(config.pairing(), clock.clone(), codes.clone()),
            files: FileRegister::with_sources(config.files(), clock.clone(), codes),
            online: ClientsOnline::new(config.presence(), clock.clone()),
            clock,
            client_auth,
            channel_auth,
            config,
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Authentication
    // ─────────────────────────────────────────────────────────────────────────

    /// Check that `token` was issued to `client_id`.
    pub fn verify_client_claim(&self, client_id: &ClientId, token: &str) -> Result<()> {
        self.client_auth
            .validate(token, &[(CLIENT_ID_CLAIM, client_id.as_str())])?;
        Ok(())
    }

    /// Check that `token` grants `client_id` access to `channel_id`.
    pub fn verify_channel_claim(
        &self,
        channel_id: &ChannelId,
        client_id: &ClientId,
        token: &str,
    ) -> Result<()> {
        self.channel_auth.validate(
            token,
            &[
                (CHANNEL_ID_CLAIM, channel_id.as_str()),
                (CHANNEL_CLIENT_CLAIM, client_id.as_str()),
            ],
        )?;
        Ok(())
    }

    fn channel_token(
        &self,
        channel_id: &ChannelId,
        client_id: &ClientId,
        issued_at: i64,
    ) -> Result<String> {
        let token = self.channel_auth.token(
            issued_at,
            &[
                (CHANNEL_ID_CLAIM, channel_id.as_str()),
                (CHANNEL_CLIENT_CLAIM, client_id.as_str()),
            ],
        )?;
        Ok(token)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Pairing
    // ─────────────────────────────────────────────────────────────────────────

    /// Register a client and hand out its pairing code and identity token.
    pub fn new_client(&self, friendly_name: Option<&str>) -> Result<ClientResponse> {
        let client = self.pairing.new_client(friendly_name)?;
        let token = self
            .client_auth
            .token(client.created_at, &[(CLIENT_ID_CLAIM, client.id.as_str())])?;

        Ok(ClientResponse {
            id: client.id,
            pairing_code: client.pairing_code,
            token,
        })
    }

    /// Open a channel from `client_id` to the client showing `pairing_code`.
    ///
    /// The code is matched case-insensitively. The returned token is the
    /// requester's membership token for the new channel.
    pub fn new_channel_using_code(
        &self,
        client_id: &ClientId,
        token: &str,
        pairing_code: &str,
    ) -> Result<ChannelResponse> {
        self.verify_client_claim(client_id, token)?;

        let code = PairingCode::normalized(pairing_code);
        let channel = self.pairing.new_channel(client_id, &code)?;
        let token = self.channel_token(&channel.channel_id, client_id, channel.created_at)?;

        Ok(ChannelResponse {
            id: channel.channel_id,
            token,
        })
    }

    /// Channels opened towards `client_id`, each with a token for that client.
    pub fn channels_for_client(
        &self,
        client_id: &ClientId,
        token: &str,
    ) -> Result<Vec<ChannelResponse>> {
        self.verify_client_claim(client_id, token)?;

        self.pairing
            .channels_for(client_id)
            .into_iter()
            .map(|channel| -> Result<ChannelResponse> {
                let token =
                    self.channel_token(&channel.channel_id, client_id, channel.created_at)?;
                Ok(ChannelResponse {
                    id: channel.channel_id,
                    token,
                })
            })
            .collect()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Files
    // ─────────────────────────────────────────────────────────────────────────

    /// Store uploaded content in a channel.
    pub fn store_file_for_channel(
        &self,
        channel_id: &ChannelId,
        client_id: &ClientId,
        token: &str,
        filename: &str,
        data: impl Into<Bytes>,
    ) -> Result<FileId> {
        self.verify_channel_claim(channel_id, client_id, token)?;
        let file = InMemoryEbookFile::new(filename, data, self.now_millis());
        self.store(channel_id, file)
    }

    /// Store an already built file, e.g. one carrying metadata.
    pub fn store_ebook_for_channel(
        &self,
        channel_id: &ChannelId,
        client_id: &ClientId,
        token: &str,
        file: InMemoryEbookFile,
    ) -> Result<FileId> {
        self.verify_channel_claim(channel_id, client_id, token)?;
        self.store(channel_id, file)
    }

    fn store(&self, channel_id: &ChannelId, file: InMemoryEbookFile) -> Result<FileId> {
        let name = file.name.clone();
        let file_id = self.files.add_file(channel_id, file)?;
        debug!(channel_id = %channel_id, file_id = %file_id, name = %name, "file uploaded");
        Ok(file_id)
    }

    /// Describe the live files of a channel, oldest first.
    pub fn get_files_for_channel(
        &self,
        channel_id: &ChannelId,
        client_id: &ClientId,
        token: &str,
    ) -> Result<Vec<FileDescription>> {
        self.verify_channel_claim(channel_id, client_id, token)?;

        let lifetime_ms = i64::try_from(self.config.file_expiration_secs)
            .unwrap_or(i64::MAX)
            .saturating_mul(MILLIS_PER_SEC);

        Ok(self
            .files
            .get_files_for_channel(channel_id)
            .into_iter()
            .map(|(id, file)| {
                let size = file.size_bytes();
                FileDescription {
                    id,
                    name: file.name.clone(),
                    size,
                    size_display: format_size(i64::try_from(size).unwrap_or(i64::MAX)),
                    title: file.title().map(str::to_owned),
                    author: file.author().map(str::to_owned),
                    expires_at_ms: file.created_at().saturating_add(lifetime_ms),
                }
            })
            .collect())
    }

    /// Fetch a file stored in the channel.
    pub fn get_file(
        &self,
        channel_id: &ChannelId,
        client_id: &ClientId,
        token: &str,
        file_id: &FileId,
    ) -> Result<Arc<InMemoryEbookFile>> {
        self.verify_channel_claim(channel_id, client_id, token)?;
        Ok(self.files.get_file_for_channel(channel_id, file_id)?)
    }

    /// Delete a file from the channel.
    ///
    /// Only files of the channel the token grants access to can be removed.
    pub fn remove_file(
        &self,
        channel_id: &ChannelId,
        client_id: &ClientId,
        token: &str,
        file_id: &FileId,
    ) -> Result<()> {
        self.verify_channel_claim(channel_id, client_id, token)?;
        self.files.get_file_for_channel(channel_id, file_id)?;
        self.files.remove_file(file_id)?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Presence
    // ─────────────────────────────────────────────────────────────────────────

    /// Record that `client_id` is currently using the channel.
    pub fn mark_online(
        &self,
        channel_id: &ChannelId,
        client_id: &ClientId,
        token: &str,
    ) -> Result<()> {
        self.verify_channel_claim(channel_id, client_id, token)?;
        self.online.refresh_last_seen(client_id, channel_id);
        Ok(())
    }

    /// Clients recently seen in the channel.
    pub fn clients_online(
        &self,
        channel_id: &ChannelId,
        client_id: &ClientId,
        token: &str,
    ) -> Result<BTreeSet<ClientId>> {
        self.verify_channel_claim(channel_id, client_id, token)?;
        Ok(self.online.all_for_channel(channel_id))
    }

    fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }
}

impl std::fmt::Debug for ApplicationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
