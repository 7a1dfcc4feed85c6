//! SHA-256 and RIPEMD-160 digest helpers used throughout the node.
//!
//! `sha256_digest` backs transaction ids, block hashes and the proof-of-work
//! preimage. `ripemd160_digest` is only ever applied to a SHA-256 digest of a
//! public key, matching the hash160 construction used for address payloads.

use ring::digest::{Context, SHA256};
use ripemd::{Digest, Ripemd160};

/// SHA-256 of `data`.
pub fn sha256_digest(data: &[u8]) -> Vec<u8> {
    let mut context = Context::new(&SHA256);
    context.update(data);
    context.finish().as_ref().to_vec()
}

/// RIPEMD-160 of `data`, used as the second step of hash160(pubkey).
pub fn ripemd160_digest(data: &[u8]) -> Vec<u8> {
    let mut hasher = Ripemd160::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// hash160: RIPEMD160(SHA256(pubkey)), the digest locked into every address.
pub fn hash160(pubkey: &[u8]) -> Vec<u8> {
    ripemd160_digest(&sha256_digest(pubkey))
}
