//! A single ECDSA P-256 keypair and its address.
//!
//! Address = `Base58(0x00 || hash160(pubkey) || checksum4)`, checksum being
//! the first four bytes of `sha256(sha256(version || hash160(pubkey)))`.

use crate::crypto::{base58_decode, base58_encode, hash160, new_key_pair, public_key_from_pkcs8, sha256_digest};
use crate::error::Result;
use serde::{Deserialize, Serialize};

pub const VERSION: u8 = 0x00;
pub const ADDRESS_CHECK_SUM_LEN: usize = 4;

#[derive(Clone, Serialize, Deserialize)]
pub struct Wallet {
    pkcs8: Vec<u8>,
    public_key: Vec<u8>,
}

impl Wallet {
    pub fn new() -> Result<Wallet> {
        let pkcs8 = new_key_pair()?;
        let public_key = public_key_from_pkcs8(&pkcs8)?;
        Ok(Wallet { pkcs8, public_key })
    }

    pub fn get_address(&self) -> Result<String> {
        convert_address(&hash160(&self.public_key))
    }

    /// Raw 64-byte uncompressed `X || Y` public key point.
    pub fn get_public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// PKCS#8 document wrapping the private key, used to sign transactions.
    pub fn get_pkcs8(&self) -> &[u8] {
        &self.pkcs8
    }
}

fn checksum(payload: &[u8]) -> Vec<u8> {
    let first = sha256_digest(payload);
    let second = sha256_digest(&first);
    second[0..ADDRESS_CHECK_SUM_LEN].to_vec()
}

/// Converts a 20-byte pubkey hash into its Base58Check address.
pub fn convert_address(pubkey_hash: &[u8]) -> Result<String> {
    let mut payload = Vec::with_capacity(1 + pubkey_hash.len() + ADDRESS_CHECK_SUM_LEN);
    payload.push(VERSION);
    payload.extend_from_slice(pubkey_hash);
    let sum = checksum(&payload);
    payload.extend_from_slice(&sum);
    base58_encode(&payload)
}

/// Decodes an address and checks its checksum.
pub fn validate_address(address: &str) -> Result<bool> {
    let payload = base58_decode(address)?;
    if payload.len() <= ADDRESS_CHECK_SUM_LEN {
        return Ok(false);
    }
    let actual_checksum = payload[payload.len() - ADDRESS_CHECK_SUM_LEN..].to_vec();
    let version_and_hash = &payload[..payload.len() - ADDRESS_CHECK_SUM_LEN];
    let expected_checksum = checksum(version_and_hash);
    Ok(actual_checksum == expected_checksum)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_wallet_has_raw_xy_public_key() {
        let wallet = Wallet::new().unwrap();
        assert_eq!(wallet.get_public_key().len(), 64);
    }

    #[test]
    fn address_round_trips_through_validate() {
        let wallet = Wallet::new().unwrap();
        let address = wallet.get_address().unwrap();
        assert!(validate_address(&address).unwrap());
    }

    #[test]
    fn tampered_address_fails_validation() {
        let wallet = Wallet::new().unwrap();
        let mut address = wallet.get_address().unwrap();
        address.replace_range(0..1, if address.starts_with('1') { "2" } else { "1" });
        assert!(!validate_address(&address).unwrap());
    }

    #[test]
    fn convert_address_matches_wallet_address() {
        let wallet = Wallet::new().unwrap();
        let expected = wallet.get_address().unwrap();
        let actual = convert_address(&hash160(wallet.get_public_key())).unwrap();
        assert_eq!(expected, actual);
    }
}
