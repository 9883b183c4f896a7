//! # BookLink
//!
//! Send a file from one device to an e-reader without accounts.
//!
//! ## Overview
//!
//! 1. The e-reader registers as a client and displays a short pairing code.
//! 2. The sending device registers too and enters that code, which opens a
//!    channel between the two.
//! 3. The sender uploads files into the channel; the e-reader polls its
//!    channels, lists the files and downloads them.
//!
//! Everything lives in memory and expires on its own: clients after a day,
//! files after a couple of minutes, presence after a few seconds. Access is
//! checked with signed tokens instead of sessions.
//!
//! ## Usage
//!
//! ```rust
//! use booklink::{ApplicationService, ServiceConfig};
//!
//! # fn main() -> booklink::Result<()> {
//! let service = ApplicationService::new(ServiceConfig::new("client-secret", "channel-secret"))?;
//!
//! let ereader = service.new_client(Some("Kobo"))?;
//! let phone = service.new_client(Some("Phone"))?;
//!
//! let channel = service.new_channel_using_code(
//!     &phone.id,
//!     &phone.token,
//!     ereader.pairing_code.as_str(),
//! )?;
//! service.store_file_for_channel(&channel.id, &phone.id, &channel.token, "book.epub", b"...".to_vec())?;
//!
//! let offered = service.channels_for_client(&ereader.id, &ereader.token)?;
//! let files = service.get_files_for_channel(&offered[0].id, &ereader.id, &offered[0].token)?;
//! assert_eq!(files[0].name, "book.epub");
//! # Ok(())
//! # }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `booklink::core` - identifiers, clocks, code generation
//! - `booklink::auth` - signed claim tokens
//! - `booklink::pairing` - client registration and channels
//! - `booklink::store` - per-channel file storage
//! - `booklink::presence` - online tracking

pub mod config;
pub mod error;
pub mod service;

// Re-export component crates
pub use booklink_auth as auth;
pub use booklink_core as core;
pub use booklink_pairing as pairing;
pub use booklink_presence as presence;
pub use booklink_store as store;

// Re-export main types for convenience
pub use config::ServiceConfig;
pub use error::{BookLinkError, Result};
pub use service::{ApplicationService, ChannelResponse, ClientResponse, FileDescription};

// Re-export commonly used core types
pub use booklink_core::{ChannelId, ClientId, ErrorClass, FileId, PairingCode};
pub use booklink_store::{EbookMetadata, InMemoryEbookFile};
