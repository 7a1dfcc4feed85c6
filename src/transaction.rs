//! Transaction model: inputs, outputs, coinbase construction, and the
//! trimmed-copy sign/verify scheme.
//!
//! Every `pubkey` and `signature` on the wire is fixed-width: a public key is
//! the raw P-256 point `X||Y` (64 bytes), a signature is `r||s` (64 bytes).
//! Fixing the width up front removes the ambiguity the source left open
//! around where one half ends and the other begins.

use crate::crypto::{
    base58_decode, ecdsa_p256_sha256_sign_digest, ecdsa_p256_sha256_sign_verify, hash160,
    sha256_digest,
};
use crate::error::{BtcError, Result};
use crate::wallet::ADDRESS_CHECK_SUM_LEN;
use data_encoding::HEXLOWER;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const SUBSIDY: i64 = 20;

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct TxIn {
    prev_tx_id: Vec<u8>,
    out_index: i64,
    signature: Vec<u8>,
    pubkey: Vec<u8>,
}

impl TxIn {
    pub fn new(prev_tx_id: &[u8], out_index: i64, pubkey: Vec<u8>) -> TxIn {
        TxIn {
            prev_tx_id: prev_tx_id.to_vec(),
            out_index,
            signature: vec![],
            pubkey,
        }
    }

    pub fn prev_tx_id(&self) -> &[u8] {
        &self.prev_tx_id
    }

    pub fn out_index(&self) -> i64 {
        self.out_index
    }

    pub fn pubkey(&self) -> &[u8] {
        &self.pubkey
    }

    /// True when this input's full public key hashes to `pubkey_hash`, i.e.
    /// the holder of the matching private key can spend the locked output.
    pub fn uses_key(&self, pubkey_hash: &[u8]) -> bool {
        hash160(&self.pubkey) == pubkey_hash
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct TxOut {
    value: i64,
    pubkey_hash: Vec<u8>,
}

impl TxOut {
    pub fn new(value: i64, address: &str) -> Result<TxOut> {
        let mut out = TxOut {
            value,
            pubkey_hash: vec![],
        };
        out.lock(address)?;
        Ok(out)
    }

    pub fn from_pubkey_hash(value: i64, pubkey_hash: Vec<u8>) -> TxOut {
        TxOut { value, pubkey_hash }
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn pubkey_hash(&self) -> &[u8] {
        &self.pubkey_hash
    }

    fn lock(&mut self, address: &str) -> Result<()> {
        let payload = base58_decode(address)?;
        if payload.len() <= 1 + ADDRESS_CHECK_SUM_LEN {
            return Err(BtcError::InvalidAddress(address.to_string()));
        }
        self.pubkey_hash = payload[1..payload.len() - ADDRESS_CHECK_SUM_LEN].to_vec();
        Ok(())
    }

    pub fn is_locked_with_key(&self, pubkey_hash: &[u8]) -> bool {
        self.pubkey_hash == pubkey_hash
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Transaction {
    id: Vec<u8>,
    inputs: Vec<TxIn>,
    outputs: Vec<TxOut>,
    lock_time: i64,
}

impl Transaction {
    /// Builds the single coinbase output/input pair and assigns its id.
    /// `sentinel` is arbitrary payload bytes stored in the sentinel input's
    /// signature field, so distinct coinbases (same miner, same height retried
    /// elsewhere) still produce distinct transaction ids.
    pub fn new_coinbase(to: &str, sentinel: Vec<u8>) -> Result<Transaction> {
        let output = TxOut::new(SUBSIDY, to)?;
        let input = TxIn {
            prev_tx_id: vec![],
            out_index: -1,
            signature: sentinel,
            pubkey: vec![],
        };
        let mut tx = Transaction {
            id: vec![],
            inputs: vec![input],
            outputs: vec![output],
            lock_time: crate::current_timestamp(),
        };
        tx.id = tx.hash()?;
        Ok(tx)
    }

    pub fn new(inputs: Vec<TxIn>, outputs: Vec<TxOut>) -> Result<Transaction> {
        let mut tx = Transaction {
            id: vec![],
            inputs,
            outputs,
            lock_time: crate::current_timestamp(),
        };
        tx.id = tx.hash()?;
        Ok(tx)
    }

    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1
            && self.inputs[0].prev_tx_id.is_empty()
            && self.inputs[0].out_index == -1
    }

    pub fn id(&self) -> &[u8] {
        &self.id
    }

    pub fn id_hex(&self) -> String {
        HEXLOWER.encode(&self.id)
    }

    pub fn inputs(&self) -> &[TxIn] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[TxOut] {
        &self.outputs
    }

    pub fn lock_time(&self) -> i64 {
        self.lock_time
    }

    /// Trimmed copy used as the signing/verification preimage: signatures and
    /// pubkeys on every input are cleared, outputs are kept as-is.
    fn trimmed_copy(&self) -> Transaction {
        let inputs = self
            .inputs
            .iter()
            .map(|vin| TxIn::new(vin.prev_tx_id(), vin.out_index(), vec![]))
            .collect();
        Transaction {
            id: self.id.clone(),
            inputs,
            outputs: self.outputs.clone(),
            lock_time: self.lock_time,
        }
    }

    fn hash(&self) -> Result<Vec<u8>> {
        let tx_copy = Transaction {
            id: vec![],
            inputs: self.inputs.clone(),
            outputs: self.outputs.clone(),
            lock_time: self.lock_time,
        };
        Ok(sha256_digest(&tx_copy.serialize()?))
    }

    /// Signs every input against the outputs it spends. `prev_txs` must
    /// contain, for each non-coinbase input, the transaction identified by
    /// `prev_tx_id` (hex-encoded key). Coinbase transactions are left alone.
    pub fn sign(&mut self, pkcs8: &[u8], prev_txs: &HashMap<String, Transaction>) -> Result<()> {
        if self.is_coinbase() {
            return Ok(());
        }
        let mut tx_copy = self.trimmed_copy();
        for idx in 0..self.inputs.len() {
            let prev_tx_id_hex = HEXLOWER.encode(self.inputs[idx].prev_tx_id());
            let prev_tx = prev_txs
                .get(&prev_tx_id_hex)
                .ok_or_else(|| BtcError::PrevTxMissing(prev_tx_id_hex.clone()))?;
            let prev_out = prev_tx
                .outputs
                .get(self.inputs[idx].out_index() as usize)
                .ok_or_else(|| BtcError::InvalidTransactionInput)?;

            tx_copy.inputs[idx].signature = vec![];
            tx_copy.inputs[idx].pubkey = prev_out.pubkey_hash().to_vec();
            tx_copy.id = tx_copy.hash()?;
            tx_copy.inputs[idx].pubkey = vec![];

            let signature = ecdsa_p256_sha256_sign_digest(pkcs8, tx_copy.id())?;
            self.inputs[idx].signature = signature;
        }
        Ok(())
    }

    /// Verifies every input's signature. Coinbase transactions always verify.
    pub fn verify(&self, prev_txs: &HashMap<String, Transaction>) -> Result<bool> {
        if self.is_coinbase() {
            return Ok(true);
        }
        let mut tx_copy = self.trimmed_copy();
        for (idx, vin) in self.inputs.iter().enumerate() {
            let prev_tx_id_hex = HEXLOWER.encode(vin.prev_tx_id());
            let prev_tx = prev_txs
                .get(&prev_tx_id_hex)
                .ok_or_else(|| BtcError::PrevTxMissing(prev_tx_id_hex.clone()))?;
            let prev_out = prev_tx
                .outputs
                .get(vin.out_index() as usize)
                .ok_or(BtcError::InvalidTransactionInput)?;

            tx_copy.inputs[idx].signature = vec![];
            tx_copy.inputs[idx].pubkey = prev_out.pubkey_hash().to_vec();
            tx_copy.id = tx_copy.hash()?;
            tx_copy.inputs[idx].pubkey = vec![];

            let valid =
                ecdsa_p256_sha256_sign_verify(vin.pubkey(), &vin.signature, tx_copy.id());
            if !valid {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| BtcError::TransactionSerializationError(e.to_string()))
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Transaction> {
        bincode::serde::decode_from_slice(bytes, bincode::config::standard())
            .map(|(tx, _)| tx)
            .map_err(|e| BtcError::TransactionDeserializationError(e.to_string()))
    }

    /// Builds and signs a transfer of `amount` from `from`'s wallet to `to`,
    /// spending whatever UTXOs locked to `from` cover it and returning any
    /// excess as a change output back to `from`.
    pub async fn new_utxo_transaction(
        from: &str,
        to: &str,
        amount: i64,
        utxo_set: &crate::chain::utxo_set::UTXOSet,
    ) -> Result<Transaction> {
        let wallets = crate::wallet::Wallets::new()?;
        let wallet = wallets
            .get_wallet(from)
            .ok_or_else(|| BtcError::WalletKeyError(from.to_string()))?;
        let pubkey_hash = hash160(wallet.get_public_key());

        let (accumulated, spendable) = utxo_set.find_spendable_outputs(&pubkey_hash, amount).await?;
        if accumulated < amount {
            return Err(BtcError::NotEnoughFunds);
        }

        let mut inputs = Vec::new();
        let mut prev_txs = HashMap::new();
        for (txid_hex, indices) in &spendable {
            let txid = HEXLOWER
                .decode(txid_hex.as_bytes())
                .map_err(|e| BtcError::TransactionIdHexDecodingError(e.to_string()))?;
            let prev_tx = utxo_set
                .get_blockchain()
                .find_transaction(&txid)
                .await?
                .ok_or_else(|| BtcError::PrevTxMissing(txid_hex.clone()))?;
            for &idx in indices {
                inputs.push(TxIn::new(&txid, idx as i64, wallet.get_public_key().to_vec()));
            }
            prev_txs.insert(txid_hex.clone(), prev_tx);
        }

        let mut outputs = vec![TxOut::new(amount, to)?];
        if accumulated > amount {
            outputs.push(TxOut::new(accumulated - amount, from)?);
        }

        let mut tx = Transaction::new(inputs, outputs)?;
        tx.sign(wallet.get_pkcs8(), &prev_txs)?;
        Ok(tx)
    }
}

/// A human-readable rendering of a transaction used by `find_all_transactions`
/// and the `printchain`/`/api/v1/transactions` surfaces — addresses instead of
/// raw pubkey hashes, hex instead of raw bytes.
#[derive(Clone, Serialize, Deserialize)]
pub struct TxSummary {
    pub id_hex: String,
    pub inputs: Vec<TxInputSummary>,
    pub outputs: Vec<TxOutputSummary>,
    pub lock_time: i64,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct TxInputSummary {
    pub prev_tx_id_hex: String,
    pub out_index: i64,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct TxOutputSummary {
    pub value: i64,
    pub address: String,
}

impl TxSummary {
    pub fn from_transaction(tx: &Transaction) -> Result<TxSummary> {
        let inputs = tx
            .inputs()
            .iter()
            .map(|vin| TxInputSummary {
                prev_tx_id_hex: HEXLOWER.encode(vin.prev_tx_id()),
                out_index: vin.out_index(),
            })
            .collect();
        let outputs = tx
            .outputs()
            .iter()
            .map(|out| {
                Ok(TxOutputSummary {
                    value: out.value(),
                    address: crate::wallet::convert_address(out.pubkey_hash())?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(TxSummary {
            id_hex: tx.id_hex(),
            inputs,
            outputs,
            lock_time: tx.lock_time(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::Wallet;

    fn test_address() -> String {
        Wallet::new().unwrap().get_address().unwrap()
    }

    #[test]
    fn coinbase_is_recognized() {
        let addr = test_address();
        let tx = Transaction::new_coinbase(&addr, vec![1, 2, 3]).unwrap();
        assert!(tx.is_coinbase());
        assert_eq!(tx.outputs()[0].value(), SUBSIDY);
        assert_eq!(tx.inputs().len(), 1);
        assert_eq!(tx.inputs()[0].out_index(), -1);
    }

    #[test]
    fn distinct_sentinels_produce_distinct_ids() {
        let addr = test_address();
        let tx1 = Transaction::new_coinbase(&addr, vec![1]).unwrap();
        let tx2 = Transaction::new_coinbase(&addr, vec![2]).unwrap();
        assert_ne!(tx1.id(), tx2.id());
    }

    #[test]
    fn serialize_roundtrip_preserves_id() {
        let addr = test_address();
        let tx = Transaction::new_coinbase(&addr, vec![9, 9]).unwrap();
        let bytes = tx.serialize().unwrap();
        let back = Transaction::deserialize(&bytes).unwrap();
        assert_eq!(tx.id(), back.id());
    }

    #[test]
    fn coinbase_verifies_without_prev_txs() {
        let addr = test_address();
        let tx = Transaction::new_coinbase(&addr, vec![1]).unwrap();
        assert!(tx.verify(&HashMap::new()).unwrap());
    }

    #[test]
    fn sign_then_verify_roundtrip() {
        let from_wallet = Wallet::new().unwrap();
        let from_addr = from_wallet.get_address().unwrap();
        let to_addr = test_address();

        let prev_tx = Transaction::new_coinbase(&from_addr, vec![1]).unwrap();
        let mut prev_txs = HashMap::new();
        prev_txs.insert(prev_tx.id_hex(), prev_tx.clone());

        let input = TxIn::new(prev_tx.id(), 0, from_wallet.get_public_key().to_vec());
        let output = TxOut::new(SUBSIDY, &to_addr).unwrap();
        let mut tx = Transaction::new(vec![input], vec![output]).unwrap();

        tx.sign(from_wallet.get_pkcs8(), &prev_txs).unwrap();
        assert!(tx.verify(&prev_txs).unwrap());
    }

    #[test]
    fn tampered_signature_fails_verification() {
        let from_wallet = Wallet::new().unwrap();
        let from_addr = from_wallet.get_address().unwrap();
        let to_addr = test_address();

        let prev_tx = Transaction::new_coinbase(&from_addr, vec![1]).unwrap();
        let mut prev_txs = HashMap::new();
        prev_txs.insert(prev_tx.id_hex(), prev_tx.clone());

        let input = TxIn::new(prev_tx.id(), 0, from_wallet.get_public_key().to_vec());
        let output = TxOut::new(SUBSIDY, &to_addr).unwrap();
        let mut tx = Transaction::new(vec![input], vec![output]).unwrap();
        tx.sign(from_wallet.get_pkcs8(), &prev_txs).unwrap();

        tx.inputs[0].signature[0] ^= 0xff;
        assert!(!tx.verify(&prev_txs).unwrap());
    }

    #[test]
    fn verify_fails_when_prev_tx_missing() {
        let from_wallet = Wallet::new().unwrap();
        let to_addr = test_address();
        let input = TxIn::new(&[1; 32], 0, from_wallet.get_public_key().to_vec());
        let output = TxOut::new(SUBSIDY, &to_addr).unwrap();
        let tx = Transaction::new(vec![input], vec![output]).unwrap();

        assert!(tx.verify(&HashMap::new()).is_err());
    }
}
