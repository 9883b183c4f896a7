//! Deterministic code sources.

use std::sync::atomic::{AtomicU64, Ordering};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

use booklink_core::codes::PAIRING_ALPHABET as ALPHABET;
use booklink_core::{CodeSource, PAIRING_CODE_LEN};

/// Random-looking codes that repeat for the same seed.
pub struct SeededCodes {
    rng: Mutex<StdRng>,
}

impl SeededCodes {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl CodeSource for SeededCodes {
    fn pairing_code(&self) -> String {
        let mut rng = self.rng.lock();
        (0..PAIRING_CODE_LEN)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect()
    }

    fn url_code(&self, n_bytes: usize) -> String {
        let mut bytes = vec![0u8; n_bytes];
        self.rng.lock().fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }
}

/// Counts upwards: `0000`, `0001`, ... and `id-0`, `id-1`, ...
///
/// Never collides until the pairing code space wraps.
#[derive(Default)]
pub struct SequentialCodes {
    next: AtomicU64,
}

impl SequentialCodes {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CodeSource for SequentialCodes {
    fn pairing_code(&self) -> String {
        let mut n = self.next.fetch_add(1, Ordering::SeqCst);
        let mut code = [b'0'; PAIRING_CODE_LEN];
        for slot in code.iter_mut().rev() {
            *slot = ALPHABET[(n % ALPHABET.len() as u64) as usize];
            n /= ALPHABET.len() as u64;
        }
        code.iter().map(|&b| b as char).collect()
    }

    fn url_code(&self, _n_bytes: usize) -> String {
        format!("id-{}", self.next.fetch_add(1, Ordering::SeqCst))
    }
}

/// Hands out the same codes every time, forcing collisions.
#[derive(Debug, Clone)]
pub struct ConstantCodes {
    pub pairing_code: String,
    pub url_code: String,
}

impl Default for ConstantCodes {
    fn default() -> Self {
        Self {
            pairing_code: "aaaa".into(),
            url_code: "constant".into(),
        }
    }
}

impl CodeSource for ConstantCodes {
    fn pairing_code(&self) -> String {
        self.pairing_code.clone()
    }

    fn url_code(&self, _n_bytes: usize) -> String {
        self.url_code.clone()
    }
}
