//! # BookLink Core
//!
//! Primitives shared by the BookLink registries: identifiers, time sources,
//! random code generation, and the client and channel records.
//!
//! This crate holds no state of its own. Registries in the sibling crates
//! own the maps and locks; they read time and draw codes through the traits
//! defined here so tests can substitute deterministic implementations.
//!
//! ## Key Types
//!
//! - [`ClientId`], [`PairingCode`], [`ChannelId`], [`FileId`] - identifier newtypes
//! - [`Clock`] - time source ([`SystemClock`], [`MockClock`])
//! - [`CodeSource`] - random code source ([`RandomCodes`])
//! - [`Client`], [`Channel`] - pairing records
//! - [`ErrorClass`] - failure taxonomy used by every registry error

pub mod channel;
pub mod client;
pub mod clock;
pub mod codes;
pub mod error;
pub mod format;
pub mod types;

pub use channel::Channel;
pub use client::Client;
pub use clock::{is_expired, Clock, MockClock, SystemClock, MILLIS_PER_SEC};
pub use codes::{draw_unique, CodeSource, RandomCodes, LONG_CODE_BYTES, PAIRING_CODE_LEN};
pub use error::ErrorClass;
pub use format::format_size;
pub use types::{ChannelId, ClientId, FileId, PairingCode};
