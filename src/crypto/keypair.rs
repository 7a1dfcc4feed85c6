//! ECDSA P-256 key pair generation.
//!
//! The node uses a single signature scheme throughout: ECDSA over P-256 via
//! `ring`'s fixed-width signing/verification algorithms, so every signature
//! and public key on the wire is a known, constant size (32+32 byte r||s,
//! 65-byte uncompressed point).

use crate::error::{BtcError, Result};
use ring::rand::SystemRandom;
use ring::signature::{ECDSA_P256_SHA256_FIXED_SIGNING, EcdsaKeyPair, KeyPair};

/// Generates a new ECDSA P-256 key pair, returned as a PKCS#8 document.
pub fn new_key_pair() -> Result<Vec<u8>> {
    let rng = SystemRandom::new();
    let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, &rng)
        .map_err(|e| BtcError::WalletKeyPairError(e.to_string()))?;
    Ok(pkcs8.as_ref().to_vec())
}

/// Recovers the public key from a PKCS#8 document as the raw `X||Y` point
/// coordinates (64 bytes), with the SEC1 `0x04` prefix stripped.
pub fn public_key_from_pkcs8(pkcs8: &[u8]) -> Result<Vec<u8>> {
    let rng = SystemRandom::new();
    let key_pair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, pkcs8, &rng)
        .map_err(|e| BtcError::WalletKeyPairError(e.to_string()))?;
    let sec1 = key_pair.public_key().as_ref();
    if sec1.len() != 65 || sec1[0] != 0x04 {
        return Err(BtcError::InvalidPublicKey(
            "expected uncompressed P-256 point".to_string(),
        ));
    }
    Ok(sec1[1..].to_vec())
}

/// Re-prepends the SEC1 `0x04` tag to a raw 64-byte `X||Y` point so `ring`
/// can parse it as an unparsed EC point.
pub fn sec1_from_xy(xy: &[u8]) -> Result<Vec<u8>> {
    if xy.len() != 64 {
        return Err(BtcError::InvalidPublicKey(format!(
            "expected 64-byte X||Y public key, got {} bytes",
            xy.len()
        )));
    }
    let mut sec1 = Vec::with_capacity(65);
    sec1.push(0x04);
    sec1.extend_from_slice(xy);
    Ok(sec1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_distinct_keys() {
        let a = new_key_pair().unwrap();
        let b = new_key_pair().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn public_key_is_raw_xy_point() {
        let pkcs8 = new_key_pair().unwrap();
        let pubkey = public_key_from_pkcs8(&pkcs8).unwrap();
        assert_eq!(pubkey.len(), 64);
    }

    #[test]
    fn sec1_from_xy_rejects_wrong_length() {
        assert!(sec1_from_xy(&[0u8; 32]).is_err());
    }
}
