//! Item handle generation
//!
//! Handles are 13 lowercase hex characters. Production code seeds the
//! generator from the operating system; tests call [`HandleGenerator::with_seed`]
//! to get a reproducible sequence.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Number of characters in a handle
pub const HANDLE_LEN: usize = 13;

const HANDLE_CHARS: &[u8; 16] = b"0123456789abcdef";

/// Check that a string is a well-formed handle
pub fn is_valid_handle(value: &str) -> bool {
    value.len() == HANDLE_LEN && value.bytes().all(|b| HANDLE_CHARS.contains(&b))
}

/// Seedable pseudo-random source of handles
#[derive(Debug, Clone)]
pub struct HandleGenerator {
    rng: StdRng,
}

impl Default for HandleGenerator {
    fn default() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }
}

impl HandleGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a generator producing a fixed sequence
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Produce the next candidate handle
    ///
    /// Uniqueness against a tree is the caller's job, see
    /// [`HandleGenerator::unique_handle`].
    pub fn next_handle(&mut self) -> String {
        (0..HANDLE_LEN)
            .map(|_| HANDLE_CHARS[self.rng.random_range(0..HANDLE_CHARS.len())] as char)
            .collect()
    }

    /// Produce a handle for which `taken` returns false
    pub fn unique_handle(&mut self, taken: impl Fn(&str) -> bool) -> String {
        loop {
            let handle = self.next_handle();
            if !taken(&handle) {
                return handle;
            }
            tracing::debug!("Handle collision on {}, rolling again", handle);
        }
    }
}
