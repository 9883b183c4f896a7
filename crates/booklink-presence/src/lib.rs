//! # BookLink Presence
//!
//! Answers "who is online?" for BookLink channels. Clients refresh their
//! presence periodically; a client that has not refreshed within the
//! timeout is considered offline and forgotten on the next access.

pub mod tracker;

pub use tracker::{ClientsOnline, PresenceConfig};
