//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;

use booklink::{
    ApplicationService, ChannelResponse, ClientResponse, FileId, Result, ServiceConfig,
};
use booklink_core::{CodeSource, MockClock};
use booklink_store::RegisteredFile;

use crate::codes::SeededCodes;

/// Fixed start time for fixtures, 2023-11-14T22:13:20Z.
pub const FIXTURE_EPOCH_MS: i64 = 1_700_000_000_000;

/// A file with a size and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DummyFile {
    pub size: u64,
    pub created_at: i64,
}

impl DummyFile {
    pub fn new(size: u64, created_at: i64) -> Self {
        Self { size, created_at }
    }
}

impl RegisteredFile for DummyFile {
    fn created_at(&self) -> i64 {
        self.created_at
    }

    fn size_bytes(&self) -> u64 {
        self.size
    }
}

/// Two clients joined by a channel, seen from both ends.
#[derive(Debug, Clone)]
pub struct Pairing {
    pub sender: ClientResponse,
    pub ereader: ClientResponse,
    /// The sender's handle on the channel.
    pub sender_channel: ChannelResponse,
    /// The e-reader's handle on the same channel.
    pub ereader_channel: ChannelResponse,
}

/// A service on a mock clock with seeded codes.
pub struct TestFixture {
    pub clock: Arc<MockClock>,
    pub service: ApplicationService,
}

impl TestFixture {
    /// Create a fixture with default limits.
    pub fn new() -> Self {
        Self::with_config(ServiceConfig::new("client-secret", "channel-secret"))
    }

    /// Create a fixture with the given configuration.
    ///
    /// Panics if the configuration is invalid.
    pub fn with_config(config: ServiceConfig) -> Self {
        Self::with_codes(config, Arc::new(SeededCodes::new(0)))
    }

    /// Create a fixture drawing codes from `codes`.
    pub fn with_codes(config: ServiceConfig, codes: Arc<dyn CodeSource>) -> Self {
        let clock = Arc::new(MockClock::at(FIXTURE_EPOCH_MS));
        let service = ApplicationService::with_sources(config, clock.clone(), codes)
            .expect("fixture configuration must be valid");
        Self { clock, service }
    }

    /// Register a sender and an e-reader and open a channel between them.
    ///
    /// Panics if the new channel is not offered to the e-reader.
    pub fn pair(&self, sender_name: &str, ereader_name: &str) -> Result<Pairing> {
        let sender = self.service.new_client(Some(sender_name))?;
        let ereader = self.service.new_client(Some(ereader_name))?;
        let sender_channel = self.service.new_channel_using_code(
            &sender.id,
            &sender.token,
            ereader.pairing_code.as_str(),
        )?;
        let ereader_channel = self
            .service
            .channels_for_client(&ereader.id, &ereader.token)?
            .into_iter()
            .find(|c| c.id == sender_channel.id)
            .expect("new channel is offered to the e-reader");

        Ok(Pairing {
            sender,
            ereader,
            sender_channel,
            ereader_channel,
        })
    }

    /// Upload `data` from the sender's end of `pairing`.
    pub fn upload(&self, pairing: &Pairing, name: &str, data: &[u8]) -> Result<FileId> {
        self.service.store_file_for_channel(
            &pairing.sender_channel.id,
            &pairing.sender.id,
            &pairing.sender_channel.token,
            name,
            data.to_vec(),
        )
    }

    pub fn advance_secs(&self, secs: i64) {
        self.clock.advance_secs(secs);
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
