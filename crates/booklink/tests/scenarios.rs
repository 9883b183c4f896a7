//! Concrete scenarios for each registry, driven through the public API.
//!
//! Time is controlled with a `MockClock`, so expiry is checked at exact
//! instants rather than by sleeping.

use std::collections::HashSet;
use std::sync::Arc;

use booklink::core::{ChannelId, ClientId, ErrorClass, MockClock, RandomCodes};
use booklink::pairing::{PairingConfig, PairingError, PairingRegister};
use booklink::presence::{ClientsOnline, PresenceConfig};
use booklink::store::{FileRegister, FileRegisterConfig, InMemoryEbookFile, StoreError};
use booklink_testkit::{SequentialCodes, FIXTURE_EPOCH_MS as T0};

fn clock() -> Arc<MockClock> {
    Arc::new(MockClock::at(T0))
}

fn pairing(max_clients: usize, clock: Arc<MockClock>) -> PairingRegister {
    let config = PairingConfig {
        max_clients_in_pairing: max_clients,
        ..Default::default()
    };
    PairingRegister::with_sources(config, clock, Arc::new(SequentialCodes::new()))
}

fn files(config: FileRegisterConfig, clock: Arc<MockClock>) -> FileRegister<InMemoryEbookFile> {
    FileRegister::with_sources(config, clock, Arc::new(RandomCodes))
}

fn ten_bytes(clock: &MockClock, i: usize) -> InMemoryEbookFile {
    InMemoryEbookFile::make(format!("book_{i}.epub"), vec![b'x'; 10], clock)
}

#[test]
fn scenario_1_pairing_capacity() {
    let register = pairing(10, clock());

    let clients: Vec<_> = (0..10)
        .map(|_| register.new_client(None).unwrap())
        .collect();
    let codes: HashSet<_> = clients.iter().map(|c| c.pairing_code.clone()).collect();
    assert_eq!(codes.len(), 10);
    // codes and ids share one counter
    assert_eq!(clients[0].pairing_code.as_str(), "0000");
    assert_eq!(clients[1].pairing_code.as_str(), "0002");

    let err = register.new_client(None).unwrap_err();
    assert!(matches!(err, PairingError::TooManyClients { max: 10 }));
    assert_eq!(err.class(), ErrorClass::Capacity);
    assert_eq!(register.len(), 10);
}

#[test]
fn scenario_2_channel_is_offered_to_the_target() {
    let register = pairing(10, clock());
    let a = register.new_client(Some("Alice")).unwrap();
    let b = register.new_client(Some("Bob")).unwrap();

    let channel = register.new_channel(&a.id, &b.pairing_code).unwrap();
    assert_eq!(channel.sender_name, "Alice");
    assert_eq!(channel.ereader_name, "Bob");

    let offered = register.channels_for(&b.id);
    assert_eq!(offered.len(), 1);
    assert_eq!(offered[0].channel_id, channel.channel_id);
    assert!(register.channels_for(&a.id).is_empty());
}

#[test]
fn scenario_3_channel_file_limit() {
    let clock = clock();
    let config = FileRegisterConfig {
        max_files_in_channel: 5,
        ..Default::default()
    };
    let register = files(config, clock.clone());
    let channel = ChannelId::new("channel");

    for i in 0..5 {
        register.add_file(&channel, ten_bytes(&clock, i)).unwrap();
    }
    let err = register.add_file(&channel, ten_bytes(&clock, 5)).unwrap_err();
    assert!(matches!(err, StoreError::ChannelFull { max: 5, .. }));
    assert_eq!(err.class(), ErrorClass::Capacity);

    assert_eq!(register.get_files_for_channel(&channel).len(), 5);
}

#[test]
fn scenario_4_total_byte_cap() {
    let clock = clock();
    let config = FileRegisterConfig {
        max_total_file_size_bytes: 100,
        ..Default::default()
    };
    let register = files(config, clock.clone());

    for i in 0..10 {
        let channel = ChannelId::new(format!("channel_{}", i % 3));
        register.add_file(&channel, ten_bytes(&clock, i)).unwrap();
    }
    assert_eq!(register.total_size_bytes(), 100);

    let one_byte = InMemoryEbookFile::make("tiny.txt", vec![0u8], clock.as_ref());
    let err = register
        .add_file(&ChannelId::new("channel_0"), one_byte)
        .unwrap_err();
    assert!(matches!(err, StoreError::TotalSizeExceeded { .. }));
    assert_eq!(register.total_size_bytes(), 100);
}

#[test]
fn scenario_5_presence_timeout() {
    let clock = clock();
    let online = ClientsOnline::new(PresenceConfig { timeout_secs: 5 }, clock.clone());
    let client = ClientId::new("client_0");

    online.refresh_last_seen(&client, &ChannelId::new("channel_0"));
    clock.advance_secs(6);

    assert!(online.all().is_empty());
    assert!(online.is_empty());
    assert!(online.all_for_channel(&ChannelId::new("channel_0")).is_empty());
}

#[test]
fn scenario_6_zero_file_lifetime() {
    let clock = clock();
    let config = FileRegisterConfig {
        file_expiration_secs: 0,
        ..Default::default()
    };
    let register = files(config, clock.clone());
    let channel = ChannelId::new("channel");

    for i in 0..5 {
        register.add_file(&channel, ten_bytes(&clock, i)).unwrap();
    }
    // a zero lifetime still covers the instant of upload
    assert_eq!(register.file_count(), 5);

    clock.advance_millis(1);
    assert_eq!(register.prune_expired_files(), 5);
    assert!(register.get_files_for_channel(&channel).is_empty());
    assert_eq!(register.channel_count(), 0);
}

#[test]
fn expiration_boundary_for_clients() {
    let clock = clock();
    let config = PairingConfig {
        client_expiration_secs: 60,
        ..Default::default()
    };
    let register = PairingRegister::with_sources(config, clock.clone(), Arc::new(RandomCodes));
    let client = register.new_client(None).unwrap();

    clock.advance_secs(60);
    assert!(register.get_client_by_id(&client.id).is_ok());
    assert!(register.get_client_by_pairing_code(&client.pairing_code).is_ok());

    clock.advance_millis(1);
    let err = register.get_client_by_id(&client.id).unwrap_err();
    assert_eq!(err.class(), ErrorClass::NotFound);
    assert!(register
        .get_client_by_pairing_code(&client.pairing_code)
        .is_err());
}
