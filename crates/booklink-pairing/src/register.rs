//! The pairing register.
//!
//! Tracks clients waiting to be paired (keyed by pairing code) and the
//! channels created for each e-reader (keyed by client id). Both maps live
//! behind their own lock; when both are needed the clients lock is always
//! taken first.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use booklink_core::{
    draw_unique, is_expired, Channel, ChannelId, Client, ClientId, Clock, CodeSource, PairingCode,
    RandomCodes, SystemClock, LONG_CODE_BYTES,
};

use crate::error::{PairingError, Result};

/// Configuration for the pairing register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairingConfig {
    /// Upper bound on tracked clients.
    pub max_clients_in_pairing: usize,
    /// Seconds a client stays live after registration.
    pub client_expiration_secs: u64,
    /// Random draws before unique code generation gives up.
    pub max_random_draws: usize,
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            max_clients_in_pairing: 100,
            client_expiration_secs: 300,
            max_random_draws: 10,
        }
    }
}

#[derive(Default)]
struct ClientTable {
    by_code: HashMap<PairingCode, Client>,
    /// Secondary index, kept in step with `by_code`.
    code_by_id: HashMap<ClientId, PairingCode>,
}

impl ClientTable {
    fn by_id(&self, id: &ClientId) -> Option<&Client> {
        self.code_by_id.get(id).and_then(|code| self.by_code.get(code))
    }

    fn insert(&mut self, client: Client) {
        self.code_by_id
            .insert(client.id.clone(), client.pairing_code.clone());
        self.by_code.insert(client.pairing_code.clone(), client);
    }

    fn remove(&mut self, code: &PairingCode) -> Option<Client> {
        let client = self.by_code.remove(code)?;
        self.code_by_id.remove(&client.id);
        Some(client)
    }
}

#[derive(Default)]
struct ChannelTable {
    /// E-reader client id -> channels offered to it, oldest first.
    by_client: HashMap<ClientId, Vec<Channel>>,
    /// Every channel id ever handed out by this register.
    issued: HashSet<ChannelId>,
}

/// Manages clients in the pairing process and the channels between them.
///
/// Expired clients are evicted lazily by [`PairingRegister::prune_data`],
/// which every public operation runs. No background timer is involved.
///
/// Every channel id ever issued is remembered so ids are never reused. That
/// set is the one structure here that only grows: it is not bounded by
/// expiry and lives as long as the register.
pub struct PairingRegister {
    config: PairingConfig,
    clock: Arc<dyn Clock>,
    codes: Arc<dyn CodeSource>,
    clients: Mutex<ClientTable>,
    channels: Mutex<ChannelTable>,
}

impl PairingRegister {
    /// Create a register using wall-clock time and random codes.
    pub fn new(config: PairingConfig) -> Self {
        Self::with_sources(config, Arc::new(SystemClock), Arc::new(RandomCodes))
    }

    /// Create a register with explicit time and code sources.
    pub fn with_sources(
        config: PairingConfig,
        clock: Arc<dyn Clock>,
        codes: Arc<dyn CodeSource>,
    ) -> Self {
        Self {
            config,
            clock,
            codes,
            clients: Mutex::new(ClientTable::default()),
            channels: Mutex::new(ChannelTable::default()),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &PairingConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Clients
    // ─────────────────────────────────────────────────────────────────────────

    /// Register a new client under a fresh pairing code.
    ///
    /// The capacity check comes before any draw. A full table is swept once
    /// so that only live clients count against the limit. Otherwise expired
    /// clients are pruned after the insert, so the code was drawn against the
    /// larger pre-sweep set and the new client cannot be evicted by its own
    /// sweep.
    pub fn new_client(&self, friendly_name: Option<&str>) -> Result<Client> {
        let mut clients = self.clients.lock();

        let max = self.config.max_clients_in_pairing;
        if clients.by_code.len() >= max {
            self.sweep(&mut clients);
        }
        if clients.by_code.len() >= max {
            warn!(max, "pairing register full");
            return Err(PairingError::TooManyClients { max });
        }

        let attempts = self.config.max_random_draws;
        let pairing_code = draw_unique(
            attempts,
            || PairingCode::new(self.codes.pairing_code()),
            |code| clients.by_code.contains_key(code),
        )
        .ok_or_else(|| {
            warn!(attempts, "pairing code space exhausted");
            PairingError::Exhausted {
                what: "pairing code",
                attempts,
            }
        })?;

        let now = self.clock.now_millis();
        let client = draw_unique(
            attempts,
            || Client::make(self.codes.as_ref(), pairing_code.clone(), friendly_name, now),
            |client| clients.code_by_id.contains_key(&client.id),
        )
        .ok_or(PairingError::Exhausted {
            what: "client id",
            attempts,
        })?;

        debug!(client_id = %client.id, "registered client");
        clients.insert(client.clone());
        self.sweep(&mut clients);

        Ok(client)
    }

    /// Look up a live client by pairing code.
    pub fn get_client_by_pairing_code(&self, pairing_code: &PairingCode) -> Result<Client> {
        let mut clients = self.clients.lock();
        self.sweep(&mut clients);
        clients
            .by_code
            .get(pairing_code)
            .cloned()
            .ok_or_else(|| PairingError::CodeNotFound(pairing_code.clone()))
    }

    /// Look up a live client by id.
    pub fn get_client_by_id(&self, client_id: &ClientId) -> Result<Client> {
        let mut clients = self.clients.lock();
        self.sweep(&mut clients);
        clients
            .by_id(client_id)
            .cloned()
            .ok_or_else(|| PairingError::ClientNotFound(client_id.clone()))
    }

    /// Whether a live client uses this pairing code.
    pub fn client_is_in_pairing(&self, pairing_code: &PairingCode) -> bool {
        self.get_client_by_pairing_code(pairing_code).is_ok()
    }

    /// Snapshot of every live client.
    pub fn live_clients(&self) -> Vec<Client> {
        let mut clients = self.clients.lock();
        self.sweep(&mut clients);
        clients.by_code.values().cloned().collect()
    }

    /// Number of live clients.
    pub fn len(&self) -> usize {
        let mut clients = self.clients.lock();
        self.sweep(&mut clients);
        clients.by_code.len()
    }

    /// Whether no client is live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Channels
    // ─────────────────────────────────────────────────────────────────────────

    /// Open a channel from `requester_id` to the client showing `target_code`.
    ///
    /// The channel is filed under the target's client id, where the target
    /// picks it up with [`PairingRegister::channels_for`].
    pub fn new_channel(
        &self,
        requester_id: &ClientId,
        target_code: &PairingCode,
    ) -> Result<Channel> {
        let mut clients = self.clients.lock();
        self.sweep(&mut clients);

        let sender = clients
            .by_id(requester_id)
            .ok_or_else(|| PairingError::ClientNotFound(requester_id.clone()))?;
        let ereader = clients
            .by_code
            .get(target_code)
            .ok_or_else(|| PairingError::CodeNotFound(target_code.clone()))?;

        let mut channels = self.channels.lock();
        let attempts = self.config.max_random_draws;
        let channel_id = draw_unique(
            attempts,
            || ChannelId::new(self.codes.url_code(LONG_CODE_BYTES)),
            |id| channels.issued.contains(id),
        )
        .ok_or_else(|| {
            warn!(attempts, "channel id space exhausted");
            PairingError::Exhausted {
                what: "channel id",
                attempts,
            }
        })?;

        let channel = Channel::new(
            channel_id.clone(),
            sender.friendly_name.as_str(),
            ereader.friendly_name.as_str(),
            self.clock.now_millis(),
        );
        debug!(channel_id = %channel_id, ereader = %ereader.id, "opened channel");

        channels.issued.insert(channel_id);
        channels
            .by_client
            .entry(ereader.id.clone())
            .or_default()
            .push(channel.clone());

        Ok(channel)
    }

    /// Channels opened towards `client_id`, oldest first.
    pub fn channels_for(&self, client_id: &ClientId) -> Vec<Channel> {
        {
            let mut clients = self.clients.lock();
            self.sweep(&mut clients);
        }
        self.channels
            .lock()
            .by_client
            .get(client_id)
            .cloned()
            .unwrap_or_default()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expiration
    // ─────────────────────────────────────────────────────────────────────────

    /// Evict every expired client together with its channel list.
    ///
    /// Channels already delivered keep working for file transfer; only
    /// future delivery to the evicted id stops. Returns the eviction count.
    pub fn prune_data(&self) -> usize {
        let mut clients = self.clients.lock();
        self.sweep(&mut clients)
    }

    fn sweep(&self, clients: &mut ClientTable) -> usize {
        let now = self.clock.now_millis();
        let ttl = self.config.client_expiration_secs;

        let expired: Vec<PairingCode> = clients
            .by_code
            .iter()
            .filter(|(_, client)| is_expired(client.created_at, ttl, now))
            .map(|(code, _)| code.clone())
            .collect();
        if expired.is_empty() {
            return 0;
        }

        let mut channels = self.channels.lock();
        for code in &expired {
            if let Some(client) = clients.remove(code) {
                channels.by_client.remove(&client.id);
            }
        }

        debug!(evicted = expired.len(), "pruned expired clients");
        expired.len()
    }
}

impl std::fmt::Debug for PairingRegister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PairingRegister")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use booklink_core::{ErrorClass, MockClock};
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Hands out the same codes every time.
    struct FixedCodes;

    impl CodeSource for FixedCodes {
        fn pairing_code(&self) -> String {
            "aaaa".to_string()
        }

        fn url_code(&self, _n_bytes: usize) -> String {
            "fixed".to_string()
        }
    }

    fn register_with(config: PairingConfig) -> (PairingRegister, Arc<MockClock>) {
        let clock = Arc::new(MockClock::at(1_700_000_000_000));
        let register = PairingRegister::with_sources(config, clock.clone(), Arc::new(RandomCodes));
        (register, clock)
    }

    fn register() -> (PairingRegister, Arc<MockClock>) {
        register_with(PairingConfig::default())
    }

    #[test]
    fn test_new_client() {
        let (register, _) = register();
        let client = register.new_client(Some("Bob")).unwrap();

        assert_eq!(client.friendly_name, "Bob");
        assert_eq!(client.pairing_code.as_str().len(), 4);
        assert_eq!(register.len(), 1);
    }

    #[test]
    fn test_get_client_by_pairing_code() {
        let (register, _) = register();
        let client = register.new_client(None).unwrap();

        let found = register
            .get_client_by_pairing_code(&client.pairing_code)
            .unwrap();
        assert_eq!(found, client);
    }

    #[test]
    fn test_get_client_by_pairing_code_invalid() {
        let (register, _) = register();
        let client = register.new_client(None).unwrap();
        let bogus = PairingCode::new(format!("{}invalid", client.pairing_code));

        let err = register.get_client_by_pairing_code(&bogus).unwrap_err();
        assert!(matches!(err, PairingError::CodeNotFound(_)));
        assert_eq!(err.class(), ErrorClass::NotFound);
    }

    #[test]
    fn test_get_client_by_id() {
        let (register, _) = register();
        let client = register.new_client(None).unwrap();

        assert_eq!(register.get_client_by_id(&client.id).unwrap(), client);
        assert!(matches!(
            register.get_client_by_id(&ClientId::new("nobody")),
            Err(PairingError::ClientNotFound(_))
        ));
    }

    #[test]
    fn test_capacity() {
        let (register, _) = register_with(PairingConfig {
            max_clients_in_pairing: 10,
            ..PairingConfig::default()
        });
        for _ in 0..10 {
            register.new_client(None).unwrap();
        }

        let err = register.new_client(None).unwrap_err();
        assert!(matches!(err, PairingError::TooManyClients { max: 10 }));
        assert_eq!(err.class(), ErrorClass::Capacity);
        assert_eq!(register.len(), 10);
    }

    #[test]
    fn test_full_register_of_expired_clients_accepts_new_client() {
        let (register, clock) = register_with(PairingConfig {
            max_clients_in_pairing: 3,
            client_expiration_secs: 10,
            ..PairingConfig::default()
        });
        for _ in 0..3 {
            register.new_client(None).unwrap();
        }

        clock.advance_secs(3600);
        // only registrations, no other operation sweeps in between
        for _ in 0..3 {
            register.new_client(None).unwrap();
        }
        assert!(matches!(
            register.new_client(None),
            Err(PairingError::TooManyClients { max: 3 })
        ));
        assert_eq!(register.len(), 3);
    }

    #[test]
    fn test_capacity_checked_before_draw() {
        let clock = Arc::new(MockClock::at(0));
        let register = PairingRegister::with_sources(
            PairingConfig {
                max_clients_in_pairing: 1,
                ..PairingConfig::default()
            },
            clock,
            Arc::new(FixedCodes),
        );
        register.new_client(None).unwrap();

        // FixedCodes would collide, but the capacity error wins.
        assert!(matches!(
            register.new_client(None),
            Err(PairingError::TooManyClients { .. })
        ));
    }

    #[test]
    fn test_pairing_code_exhaustion() {
        let clock = Arc::new(MockClock::at(0));
        let register =
            PairingRegister::with_sources(PairingConfig::default(), clock, Arc::new(FixedCodes));
        register.new_client(None).unwrap();

        let err = register.new_client(None).unwrap_err();
        assert!(matches!(
            err,
            PairingError::Exhausted {
                what: "pairing code",
                attempts: 10
            }
        ));
        assert_eq!(err.class(), ErrorClass::Exhausted);
    }

    #[test]
    fn test_pairing_codes_unique() {
        let (register, _) = register();
        for _ in 0..50 {
            register.new_client(None).unwrap();
        }

        let codes: HashSet<_> = register
            .live_clients()
            .into_iter()
            .map(|c| c.pairing_code)
            .collect();
        assert_eq!(codes.len(), 50);
    }

    #[test]
    fn test_client_expiration() {
        let (register, clock) = register_with(PairingConfig {
            client_expiration_secs: 0,
            ..PairingConfig::default()
        });
        for _ in 0..3 {
            register.new_client(None).unwrap();
        }
        assert_eq!(register.live_clients().len(), 3);

        clock.advance_secs(1);
        let survivor = register.new_client(None).unwrap();

        let live = register.live_clients();
        assert_eq!(live, vec![survivor]);
    }

    #[test]
    fn test_expiration_boundary() {
        let (register, clock) = register_with(PairingConfig {
            client_expiration_secs: 60,
            ..PairingConfig::default()
        });
        let client = register.new_client(None).unwrap();

        clock.advance_secs(60);
        assert!(register.client_is_in_pairing(&client.pairing_code));
        assert!(register.get_client_by_id(&client.id).is_ok());

        clock.advance_millis(1);
        assert!(!register.client_is_in_pairing(&client.pairing_code));
        assert!(matches!(
            register.get_client_by_id(&client.id),
            Err(PairingError::ClientNotFound(_))
        ));
    }

    #[test]
    fn test_expired_code_is_reusable() {
        let clock = Arc::new(MockClock::at(0));
        let register = PairingRegister::with_sources(
            PairingConfig {
                client_expiration_secs: 10,
                ..PairingConfig::default()
            },
            clock.clone(),
            Arc::new(FixedCodes),
        );
        let first = register.new_client(None).unwrap();

        clock.advance_secs(11);
        register.prune_data();
        let second = register.new_client(None).unwrap();

        assert_eq!(first.pairing_code, second.pairing_code);
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_new_channel() {
        let (register, _) = register();
        let a = register.new_client(Some("phone")).unwrap();
        let b = register.new_client(Some("kobo")).unwrap();

        let channel = register.new_channel(&a.id, &b.pairing_code).unwrap();
        assert_eq!(channel.sender_name, "phone");
        assert_eq!(channel.ereader_name, "kobo");

        let for_b = register.channels_for(&b.id);
        assert_eq!(for_b.len(), 1);
        assert_eq!(for_b[0].channel_id, channel.channel_id);
        assert!(register.channels_for(&a.id).is_empty());
    }

    #[test]
    fn test_new_channel_unknown_parties() {
        let (register, _) = register();
        let a = register.new_client(None).unwrap();

        assert!(matches!(
            register.new_channel(&ClientId::new("ghost"), &a.pairing_code),
            Err(PairingError::ClientNotFound(_))
        ));
        assert!(matches!(
            register.new_channel(&a.id, &PairingCode::new("zzzzz")),
            Err(PairingError::CodeNotFound(_))
        ));
    }

    #[test]
    fn test_channel_id_exhaustion() {
        let fixed = PairingRegister::with_sources(
            PairingConfig::default(),
            Arc::new(MockClock::at(0)),
            Arc::new(FixedCodes),
        );
        let c = fixed.new_client(None).unwrap();
        fixed.new_channel(&c.id, &c.pairing_code).unwrap();
        let err = fixed.new_channel(&c.id, &c.pairing_code).unwrap_err();
        assert!(matches!(
            err,
            PairingError::Exhausted {
                what: "channel id",
                ..
            }
        ));
    }

    #[test]
    fn test_channel_ids_unique_across_register() {
        let (register, _) = register();
        let clients: Vec<_> = (0..4).map(|_| register.new_client(None).unwrap()).collect();

        let mut ids = HashSet::new();
        for sender in &clients {
            for target in &clients {
                let channel = register.new_channel(&sender.id, &target.pairing_code).unwrap();
                assert!(ids.insert(channel.channel_id));
            }
        }
        assert_eq!(ids.len(), 16);
    }

    #[test]
    fn test_channels_for_ordered() {
        let (register, clock) = register();
        let a = register.new_client(None).unwrap();
        let b = register.new_client(None).unwrap();
        let c = register.new_client(None).unwrap();

        let channel_a = register.new_channel(&a.id, &c.pairing_code).unwrap();
        clock.advance_secs(1);
        let channel_b = register.new_channel(&b.id, &c.pairing_code).unwrap();

        assert_eq!(register.channels_for(&c.id), vec![channel_a, channel_b]);
    }

    #[test]
    fn test_channels_for_invalid() {
        let (register, _) = register();
        assert!(register.channels_for(&ClientId::new("invalid-code")).is_empty());
    }

    #[test]
    fn test_channels_for_expired_client() {
        let (register, clock) = register_with(PairingConfig {
            client_expiration_secs: 300,
            ..PairingConfig::default()
        });
        let a = register.new_client(None).unwrap();
        let b = register.new_client(None).unwrap();
        let c = register.new_client(None).unwrap();
        register.new_channel(&a.id, &c.pairing_code).unwrap();
        register.new_channel(&b.id, &c.pairing_code).unwrap();
        assert_eq!(register.channels_for(&c.id).len(), 2);

        clock.advance_secs(301);
        assert_eq!(register.prune_data(), 3);
        assert!(register.channels_for(&c.id).is_empty());
        assert!(register.is_empty());
    }

    #[test]
    fn test_concurrent_registration_respects_capacity() {
        let (register, _) = register_with(PairingConfig {
            max_clients_in_pairing: 20,
            max_random_draws: 100,
            ..PairingConfig::default()
        });

        let successes = AtomicUsize::new(0);
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..5 {
                        if register.new_client(None).is_ok() {
                            successes.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                });
            }
        });

        assert_eq!(successes.load(Ordering::SeqCst), 20);
        assert_eq!(register.len(), 20);
    }

    #[test]
    fn test_config_defaults_from_partial_json() {
        let config: PairingConfig =
            serde_json::from_str(r#"{"max_clients_in_pairing": 3}"#).unwrap();
        assert_eq!(config.max_clients_in_pairing, 3);
        assert_eq!(config.client_expiration_secs, 300);
        assert_eq!(config.max_random_draws, 10);
    }

    proptest! {
        #[test]
        fn test_capacity_never_exceeded(max in 1usize..15, attempts in 0usize..30, step in 0i64..200_000) {
            let (register, clock) = register_with(PairingConfig {
                max_clients_in_pairing: max,
                ..PairingConfig::default()
            });

            for _ in 0..attempts {
                let _ = register.new_client(None);
                clock.advance_millis(step);
                prop_assert!(register.len() <= max);
            }
        }
    }
}
