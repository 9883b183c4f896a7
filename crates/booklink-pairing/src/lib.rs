//! # BookLink Pairing
//!
//! Client registration and channel creation.
//!
//! ## Lifecycle
//!
//! A client is created with a short pairing code, stays live for
//! `client_expiration_secs`, and is then evicted together with the list of
//! channels waiting for it. There are no other transitions.
//!
//! ```text
//! new_client ──> live ──(age > expiration)──> removed
//! ```
//!
//! A channel is created when a live client presents another live client's
//! pairing code. It is filed under the code owner's client id and collected
//! with [`PairingRegister::channels_for`].
//!
//! ## Usage
//!
//! ```rust
//! use booklink_pairing::{PairingConfig, PairingRegister};
//!
//! let register = PairingRegister::new(PairingConfig::default());
//! let phone = register.new_client(Some("phone")).unwrap();
//! let kobo = register.new_client(Some("kobo")).unwrap();
//!
//! let channel = register.new_channel(&phone.id, &kobo.pairing_code).unwrap();
//! assert_eq!(register.channels_for(&kobo.id), vec![channel]);
//! ```

pub mod error;
pub mod register;

pub use error::{PairingError, Result};
pub use register::{PairingConfig, PairingRegister};
