//! Proof-of-work target search and validation.
//!
//! The preimage is fixed to `prev_hash || merkle_root || be64(nonce) ||
//! be64(difficulty)` — no timestamp, unlike the source's habit of also
//! folding the block timestamp into the digest. Leaving the timestamp out
//! keeps `validate` a pure function of the fields a block actually commits
//! to on the wire.

use crate::block::Block;
use crate::crypto::sha256_digest;
use num_bigint::{BigInt, Sign};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

pub const DIFFICULTY: u32 = 16;

/// Iterations between cancellation checks during mining.
const CANCEL_CHECK_INTERVAL: u64 = 1 << 14;

fn target() -> BigInt {
    BigInt::from(1) << (256 - DIFFICULTY as usize)
}

fn preimage(prev_hash: &[u8], merkle_root: &[u8], nonce: u64, difficulty: u32) -> Vec<u8> {
    let mut data = Vec::with_capacity(prev_hash.len() + merkle_root.len() + 16);
    data.extend_from_slice(prev_hash);
    data.extend_from_slice(merkle_root);
    data.extend_from_slice(&nonce.to_be_bytes());
    data.extend_from_slice(&(difficulty as u64).to_be_bytes());
    data
}

/// Computes `SHA256(concat(sha256(tx) for tx in transactions))`, the
/// Merkle-style commitment folded into the proof-of-work preimage.
pub fn hash_transactions(transactions: &[crate::transaction::Transaction]) -> Vec<u8> {
    let mut digests = Vec::new();
    for tx in transactions {
        digests.extend_from_slice(tx.id());
    }
    sha256_digest(&digests)
}

/// Searches for a nonce whose preimage hashes below the difficulty target.
/// Checks `cancel` every [`CANCEL_CHECK_INTERVAL`] iterations and returns
/// `None` if it has been set, so a newly-received tip can abort a mining
/// round already in progress.
pub fn mine(block: &Block, cancel: &Arc<AtomicBool>) -> Option<(u64, Vec<u8>)> {
    let t = target();
    let merkle_root = hash_transactions(block.transactions());
    let mut nonce: u64 = 0;
    loop {
        if nonce % CANCEL_CHECK_INTERVAL == 0 && cancel.load(Ordering::Relaxed) {
            debug!(height = block.height(), "mining cancelled");
            return None;
        }
        let data = preimage(block.prev_hash(), &merkle_root, nonce, block.difficulty());
        let hash = sha256_digest(&data);
        let hash_int = BigInt::from_bytes_be(Sign::Plus, &hash);
        if hash_int < t {
            return Some((nonce, hash));
        }
        nonce = nonce.wrapping_add(1);
    }
}

/// Recomputes the preimage hash for a mined block's stored nonce and checks
/// it against the difficulty target.
pub fn validate(block: &Block) -> bool {
    let merkle_root = hash_transactions(block.transactions());
    let data = preimage(block.prev_hash(), &merkle_root, block.nonce(), block.difficulty());
    let hash = sha256_digest(&data);
    if hash != block.hash() {
        return false;
    }
    let hash_int = BigInt::from_bytes_be(Sign::Plus, &hash);
    hash_int < target()
}
