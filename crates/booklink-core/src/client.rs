//! Clients taking part in the pairing process.

use serde::{Deserialize, Serialize};

use crate::codes::{CodeSource, CLIENT_ID_PREFIX_BYTES};
use crate::types::{ClientId, PairingCode};

/// A device registered for pairing.
///
/// The id is permanent for the client's lifetime. The pairing code is stored
/// alongside so lookups by id can report it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    /// Globally unique id.
    pub id: ClientId,
    /// Code other devices type to reach this client.
    pub pairing_code: PairingCode,
    /// Display name shown to the paired device.
    pub friendly_name: String,
    /// Creation time (Unix ms).
    pub created_at: i64,
}

impl Client {
    /// Build a client with a freshly generated id.
    ///
    /// The id embeds the creation time, so two clients can only collide if
    /// they draw the same random prefix within the same millisecond.
    pub fn make(
        codes: &dyn CodeSource,
        pairing_code: PairingCode,
        friendly_name: Option<&str>,
        created_at: i64,
    ) -> Self {
        let friendly_name = match friendly_name.map(str::trim) {
            Some(name) if !name.is_empty() => name.to_owned(),
            _ => format!("device-{}", pairing_code),
        };
        let id = ClientId::new(format!(
            "{}-{}",
            codes.url_code(CLIENT_ID_PREFIX_BYTES),
            created_at
        ));

        Self {
            id,
            pairing_code,
            friendly_name,
            created_at,
        }
    }
}
