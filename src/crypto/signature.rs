//! ECDSA P-256 signing and verification over a raw message digest.
//!
//! Both functions use the FIXED-width ring algorithms so the result (and the
//! expected input to verification) is always a 64-byte r||s signature. Public
//! keys are accepted/produced in the wire's raw `X||Y` (64-byte) form; ring's
//! SEC1 `0x04` prefix is re-added internally before verification.

use crate::crypto::keypair::sec1_from_xy;
use crate::error::{BtcError, Result};
use ring::rand::SystemRandom;
use ring::signature::{ECDSA_P256_SHA256_FIXED, ECDSA_P256_SHA256_FIXED_SIGNING, EcdsaKeyPair};

/// Signs `message` with the PKCS#8-encoded private key, returning a 64-byte r||s signature.
pub fn ecdsa_p256_sha256_sign_digest(pkcs8: &[u8], message: &[u8]) -> Result<Vec<u8>> {
    let rng = SystemRandom::new();
    let key_pair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, pkcs8, &rng)
        .map_err(|e| BtcError::TransactionSignatureError(e.to_string()))?;
    key_pair
        .sign(&rng, message)
        .map(|sig| sig.as_ref().to_vec())
        .map_err(|e| BtcError::TransactionSignatureError(e.to_string()))
}

/// Verifies a 64-byte r||s signature over `message` against a raw 64-byte `X||Y` public key.
pub fn ecdsa_p256_sha256_sign_verify(public_key_xy: &[u8], signature: &[u8], message: &[u8]) -> bool {
    let Ok(sec1) = sec1_from_xy(public_key_xy) else {
        return false;
    };
    let peer_public_key = ring::signature::UnparsedPublicKey::new(&ECDSA_P256_SHA256_FIXED, sec1);
    peer_public_key.verify(message, signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keypair::{new_key_pair, public_key_from_pkcs8};

    #[test]
    fn sign_then_verify_roundtrip() {
        let pkcs8 = new_key_pair().unwrap();
        let pubkey = public_key_from_pkcs8(&pkcs8).unwrap();
        let message = b"a transaction digest";

        let signature = ecdsa_p256_sha256_sign_digest(&pkcs8, message).unwrap();
        assert!(ecdsa_p256_sha256_sign_verify(&pubkey, &signature, message));
    }

    #[test]
    fn verify_rejects_wrong_message() {
        let pkcs8 = new_key_pair().unwrap();
        let pubkey = public_key_from_pkcs8(&pkcs8).unwrap();

        let signature = ecdsa_p256_sha256_sign_digest(&pkcs8, b"original").unwrap();
        assert!(!ecdsa_p256_sha256_sign_verify(&pubkey, &signature, b"tampered"));
    }

    #[test]
    fn verify_rejects_wrong_key() {
        let pkcs8_a = new_key_pair().unwrap();
        let pkcs8_b = new_key_pair().unwrap();
        let pubkey_b = public_key_from_pkcs8(&pkcs8_b).unwrap();

        let signature = ecdsa_p256_sha256_sign_digest(&pkcs8_a, b"message").unwrap();
        assert!(!ecdsa_p256_sha256_sign_verify(&pubkey_b, &signature, b"message"));
    }

    #[test]
    fn verify_rejects_malformed_key_length() {
        assert!(!ecdsa_p256_sha256_sign_verify(&[0u8; 10], &[0u8; 64], b"message"));
    }
}
