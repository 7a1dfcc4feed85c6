//! Cryptographic primitives: hashing, key generation, signing, and address encoding.

pub mod address;
pub mod hash;
pub mod keypair;
pub mod signature;

pub use address::{base58_decode, base58_encode};
pub use hash::{hash160, ripemd160_digest, sha256_digest};
pub use keypair::{new_key_pair, public_key_from_pkcs8, sec1_from_xy};
pub use signature::{ecdsa_p256_sha256_sign_digest, ecdsa_p256_sha256_sign_verify};
