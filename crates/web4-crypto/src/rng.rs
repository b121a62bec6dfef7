//! Deterministic per-transaction randomness.
//!
//! Challenge bytes and id entropy come from a ChaCha20 stream seeded from
//! the block hash plus the transaction index. Every validator derives the
//! same bytes; OS randomness never enters consensus code.

use rand::RngCore;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha20Rng;

/// Seeded random stream for one transaction. Draws are counted so ids
/// derived from the stream stay distinct within the transaction.
pub struct TxRng {
    rng: ChaCha20Rng,
    draws: u64,
}

impl TxRng {
    /// Seed from the enclosing block hash and the transaction's index.
    pub fn new(block_hash: &[u8; 32], tx_index: u32) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"web4/tx-rng");
        hasher.update(block_hash);
        hasher.update(&tx_index.to_be_bytes());
        let seed = *hasher.finalize().as_bytes();
        Self {
            rng: ChaCha20Rng::from_seed(seed),
            draws: 0,
        }
    }

    /// Number of draws taken so far (used as an id disambiguator).
    pub fn draws(&self) -> u64 {
        self.draws
    }

    /// Fill `buf` with deterministic bytes and count the draw.
    pub fn fill(&mut self, buf: &mut [u8]) {
        self.rng.fill_bytes(buf);
        self.draws += 1;
    }

    /// Convenience: one 32-byte draw.
    pub fn draw32(&mut self) -> [u8; 32] {
        let mut buf = [0u8; 32];
        self.fill(&mut buf);
        buf
    }

    /// A challenge of `len` bytes.
    pub fn challenge(&mut self, len: usize) -> Vec<u8> {
        let mut buf = vec![0u8; len];
        self.fill(&mut buf);
        buf
    }
}
