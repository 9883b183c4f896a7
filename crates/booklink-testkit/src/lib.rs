//! # BookLink Testkit
//!
//! Testing utilities for BookLink.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Code sources**: deterministic [`CodeSource`](booklink_core::CodeSource)
//!   implementations for reproducible ids and forced collisions
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: a service on a mock clock, with pairing and upload helpers
//!
//! ## Test Fixtures
//!
//! ```rust
//! use booklink_testkit::TestFixture;
//!
//! let fixture = TestFixture::new();
//! let pairing = fixture.pair("Phone", "Kobo").unwrap();
//! fixture.upload(&pairing, "book.epub", b"...").unwrap();
//!
//! // files live for two minutes by default
//! fixture.advance_secs(121);
//! let channel = &pairing.ereader_channel;
//! let files = fixture
//!     .service
//!     .get_files_for_channel(&channel.id, &pairing.ereader.id, &channel.token)
//!     .unwrap();
//! assert!(files.is_empty());
//! ```

pub mod codes;
pub mod fixtures;
pub mod generators;

pub use codes::{ConstantCodes, SeededCodes, SequentialCodes};
pub use fixtures::{DummyFile, Pairing, TestFixture, FIXTURE_EPOCH_MS};
pub use generators::{file_op, file_ops, FileOp};
