//! # BookLink Auth
//!
//! Stateless capability tokens. A token is a signed bundle of claims that
//! can be verified without any server-held session record.
//!
//! Two authenticators are used by the service, each with its own secret and
//! required claim set:
//!
//! - client identity: `{id}`
//! - channel membership: `{channel_id, client_id}`
//!
//! ## Usage
//!
//! ```rust
//! use booklink_auth::Authenticator;
//!
//! let auth = Authenticator::for_clients("secret");
//! let token = auth.token(0, &[("id", "Bob")]).unwrap();
//!
//! assert!(auth.validate(&token, &[("id", "Bob")]).is_ok());
//! assert!(auth.validate(&token, &[("id", "Alice")]).is_err());
//! ```
//!
//! ## Limitations
//!
//! Tokens cannot be revoked. Once issued, a token is accepted until it is
//! older than the authenticator's `max_age` (or forever, if none is set).

pub mod error;
pub mod token;

pub use error::{AuthError, Result};
pub use token::{
    Authenticator, Claims, CHANNEL_CLIENT_CLAIM, CHANNEL_ID_CLAIM, CLIENT_ID_CLAIM,
    TIMESTAMP_CLAIM,
};
