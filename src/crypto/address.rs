use crate::error::{BtcError, Result};

/// Base58-encodes `data` (an address payload: version + hash160 + checksum).
pub fn base58_encode(data: &[u8]) -> Result<String> {
    Ok(bs58::encode(data).into_string())
}

/// Decodes a Base58 string back into its raw bytes.
pub fn base58_decode(data: &str) -> Result<Vec<u8>> {
    bs58::decode(data)
        .into_vec()
        .map_err(|e| BtcError::AddressDecodingError(e.to_string()))
}
