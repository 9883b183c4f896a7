//! Error taxonomy shared by every registry.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse classification of a registry or authentication failure.
///
/// Each crate keeps its own error enum; `ErrorClass` is what an adapter
/// matches on to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorClass {
    /// A hard ceiling was hit. Surface as "try again later".
    Capacity,
    /// Unknown code, id or channel. Retry with corrected input.
    NotFound,
    /// Unique id generation ran out of draws. Internal error.
    Exhausted,
    /// Bad signature or claims that do not match. Terminal denial.
    Authentication,
    /// The caller broke an API contract (e.g. missing required claims).
    Invalid,
}

impl ErrorClass {
    /// Whether the same request may succeed later or with different input.
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorClass::Capacity | ErrorClass::NotFound)
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorClass::Capacity => "capacity",
            ErrorClass::NotFound => "not found",
            ErrorClass::Exhausted => "exhausted",
            ErrorClass::Authentication => "authentication",
            ErrorClass::Invalid => "invalid",
        };
        f.write_str(name)
    }
}
