//! Random code generation.
//!
//! Two kinds of codes are produced: short pairing codes that a human types on
//! an e-reader keyboard, and longer URL-safe codes used for ids.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::{Rng, RngCore};

/// Characters a pairing code is drawn from.
pub const PAIRING_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of a pairing code.
pub const PAIRING_CODE_LEN: usize = 4;

/// Random bytes behind a channel or file id.
pub const LONG_CODE_BYTES: usize = 16;

/// Random bytes in the prefix of a client id.
pub const CLIENT_ID_PREFIX_BYTES: usize = 5;

/// A source of random codes.
///
/// Registries only ever draw codes through this trait; uniqueness is checked
/// by the caller with [`draw_unique`].
pub trait CodeSource: Send + Sync {
    /// A short code of [`PAIRING_CODE_LEN`] characters from [`PAIRING_ALPHABET`].
    fn pairing_code(&self) -> String;

    /// `n_bytes` random bytes encoded as URL-safe base64 without padding.
    fn url_code(&self, n_bytes: usize) -> String;
}

/// Thread-local RNG backed codes.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomCodes;

impl CodeSource for RandomCodes {
    fn pairing_code(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..PAIRING_CODE_LEN)
            .map(|_| PAIRING_ALPHABET[rng.gen_range(0..PAIRING_ALPHABET.len())] as char)
            .collect()
    }

    fn url_code(&self, n_bytes: usize) -> String {
        let mut bytes = vec![0u8; n_bytes];
        rand::thread_rng().fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }
}

/// Draw values until one is not taken, giving up after `max_draws` attempts.
///
/// Returns `None` when every draw collided.
pub fn draw_unique<T>(
    max_draws: usize,
    mut draw: impl FnMut() -> T,
    mut is_taken: impl FnMut(&T) -> bool,
) -> Option<T> {
    for _ in 0..max_draws {
        let candidate = draw();
        if !is_taken(&candidate) {
            return Some(candidate);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_pairing_code_shape() {
        for _ in 0..100 {
            let code = RandomCodes.pairing_code();
            assert_eq!(code.len(), PAIRING_CODE_LEN);
            assert!(code.bytes().all(|b| PAIRING_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn test_url_code_is_url_safe() {
        let code = RandomCodes.url_code(LONG_CODE_BYTES);
        // 16 bytes -> 22 base64 characters without padding
        assert_eq!(code.len(), 22);
        assert!(code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_url_codes_differ() {
        let codes: HashSet<_> = (0..50).map(|_| RandomCodes.url_code(16)).collect();
        assert_eq!(codes.len(), 50);
    }

    #[test]
    fn test_draw_unique_skips_taken() {
        let mut next = 0;
        let taken = [0, 1, 2];
        let value = draw_unique(
            5,
            || {
                next += 1;
                next - 1
            },
            |v| taken.contains(v),
        );
        assert_eq!(value, Some(3));
    }

    #[test]
    fn test_draw_unique_exhausts() {
        let mut draws = 0;
        let value = draw_unique(
            10,
            || {
                draws += 1;
                "same"
            },
            |_| true,
        );
        assert_eq!(value, None);
        assert_eq!(draws, 10);
    }
}
