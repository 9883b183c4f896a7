//! HS256 signed claim tokens.
//!
//! Tokens are plain JWTs (`HS256`), so any JWT library holding the same
//! secret can read them. The registered claims (`exp`, `nbf`, `aud`) are not
//! used; the issue time travels in [`TIMESTAMP_CLAIM`] and the optional
//! `max_age` is checked against it here.
//!
//! There is no server-side session and no revocation list: a token stays
//! valid until it falls outside the optional `max_age`.

use std::collections::BTreeSet;
use std::sync::Arc;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::{Map, Value};

use booklink_core::{is_expired, Clock, SystemClock};

use crate::error::{AuthError, Result};

/// Decoded token payload.
pub type Claims = Map<String, Value>;

/// Claim carrying the issue timestamp (Unix ms).
pub const TIMESTAMP_CLAIM: &str = "timestamp_ms";

/// Required claim of client tokens.
pub const CLIENT_ID_CLAIM: &str = "id";

/// Required claims of channel tokens.
pub const CHANNEL_ID_CLAIM: &str = "channel_id";
pub const CHANNEL_CLIENT_CLAIM: &str = "client_id";

/// Issues and verifies signed claims for one identity kind.
pub struct Authenticator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    required: BTreeSet<String>,
    max_age_secs: Option<u64>,
    clock: Arc<dyn Clock>,
}

impl Authenticator {
    /// Create an authenticator whose tokens must carry every claim in `required`.
    pub fn new<I, S>(secret: impl AsRef<[u8]>, required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let secret = secret.as_ref();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation.validate_aud = false;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            required: required.into_iter().map(Into::into).collect(),
            max_age_secs: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Authenticator for client identity tokens (`{id}`).
    pub fn for_clients(secret: impl AsRef<[u8]>) -> Self {
        Self::new(secret, [CLIENT_ID_CLAIM])
    }

    /// Authenticator for channel membership tokens (`{channel_id, client_id}`).
    pub fn for_channels(secret: impl AsRef<[u8]>) -> Self {
        Self::new(secret, [CHANNEL_ID_CLAIM, CHANNEL_CLIENT_CLAIM])
    }

    /// Reject tokens whose timestamp is more than `secs` old according to `clock`.
    pub fn with_max_age(mut self, secs: u64, clock: Arc<dyn Clock>) -> Self {
        self.max_age_secs = Some(secs);
        self.clock = clock;
        self
    }

    /// Names every token of this authenticator must carry.
    pub fn required_claims(&self) -> &BTreeSet<String> {
        &self.required
    }

    /// Issue a token embedding `timestamp` and all of `claims`.
    pub fn token(&self, timestamp: i64, claims: &[(&str, &str)]) -> Result<String> {
        let missing: Vec<String> = self
            .required
            .iter()
            .filter(|name| !claims.iter().any(|(supplied, _)| *supplied == name.as_str()))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(AuthError::MissingClaims(missing));
        }

        let mut payload = Claims::new();
        payload.insert(TIMESTAMP_CLAIM.to_owned(), Value::from(timestamp));
        for (name, value) in claims {
            if *name == TIMESTAMP_CLAIM {
                return Err(AuthError::ReservedClaim((*name).to_owned()));
            }
            payload.insert((*name).to_owned(), Value::from(*value));
        }

        encode(&Header::default(), &payload, &self.encoding_key)
            .map_err(|e| AuthError::Encoding(e.to_string()))
    }

    /// Verify the signature and return the signed claims.
    pub fn decode(&self, token: &str) -> Result<Claims> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        Ok(data.claims)
    }

    /// Check that `token` is genuine and was issued for exactly `claimed`.
    ///
    /// The claimed names must be the required set, and every claimed value
    /// must equal the signed one.
    pub fn validate(&self, token: &str, claimed: &[(&str, &str)]) -> Result<()> {
        let result = self.check(token, claimed);
        if let Err(err) = &result {
            tracing::debug!(error = %err, "token rejected");
        }
        result
    }

    fn check(&self, token: &str, claimed: &[(&str, &str)]) -> Result<()> {
        let payload = self.decode(token)?;

        if let Some(max_age_secs) = self.max_age_secs {
            let issued_at = payload
                .get(TIMESTAMP_CLAIM)
                .and_then(Value::as_i64)
                .ok_or_else(|| AuthError::InvalidToken("missing timestamp".into()))?;
            if is_expired(issued_at, max_age_secs, self.clock.now_millis()) {
                return Err(AuthError::Expired {
                    issued_at,
                    max_age_secs,
                });
            }
        }

        let claimed_names: BTreeSet<&str> = claimed.iter().map(|(name, _)| *name).collect();
        let required_names: BTreeSet<&str> = self.required.iter().map(String::as_str).collect();
        if claimed_names != required_names || claimed.len() != required_names.len() {
            return Err(AuthError::ClaimMismatch);
        }

        for (name, value) in claimed {
            match payload.get(*name).and_then(Value::as_str) {
                Some(signed) if signed == *value => {}
                _ => return Err(AuthError::ClaimMismatch),
            }
        }

        Ok(())
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("required", &self.required)
            .field("max_age_secs", &self.max_age_secs)
            .finish_non_exhaustive()
    }
}
