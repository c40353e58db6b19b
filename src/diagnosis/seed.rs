//! Content-derived generator seeding.
//!
//! SHA-256 of the uploaded bytes; the first 8 digest bytes, read
//! big-endian, seed a ChaCha8 stream. The filename never contributes.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};

/// Generator used for every reproducible draw in the engine.
pub type ContentRng = ChaCha8Rng;

/// SHA-256 digest of the uploaded content.
pub fn content_digest(content: &[u8]) -> [u8; 32] {
    Sha256::digest(content).into()
}

/// Seed derived from the first 8 digest bytes (big-endian).
pub fn content_seed(content: &[u8]) -> u64 {
    let digest = content_digest(content);
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix)
}

/// Fresh generator for one request, seeded from the content hash.
pub fn content_rng(content: &[u8]) -> ContentRng {
    seeded_rng(content_seed(content))
}

/// Fresh generator for an explicit seed.
pub fn seeded_rng(seed: u64) -> ContentRng {
    ContentRng::seed_from_u64(seed)
}
