//! Unspent-output index, rebuilt from the chain store and kept incrementally
//! in sync as blocks are applied. Keys are `"utxo-" || tx_id`.

use crate::chain::chainstate::BlockchainService;
use crate::block::Block;
use crate::error::{BtcError, Result};
use crate::transaction::{Transaction, TxOut};
use crate::wallet::validate_address;
use data_encoding::HEXLOWER;
use std::collections::HashMap;
use tracing::debug;

const UTXO_TREE: &str = "chainstate";
const UTXO_KEY_PREFIX: &str = "utxo-";

fn utxo_key(txid: &[u8]) -> Vec<u8> {
    let mut key = UTXO_KEY_PREFIX.as_bytes().to_vec();
    key.extend_from_slice(txid);
    key
}

pub struct UTXOSet {
    blockchain: BlockchainService,
}

impl UTXOSet {
    pub fn new(blockchain: BlockchainService) -> UTXOSet {
        UTXOSet { blockchain }
    }

    pub fn get_blockchain(&self) -> &BlockchainService {
        &self.blockchain
    }

    /// Accumulates UTXOs locked to `pubkey_hash` up to `amount`, returning the
    /// accumulated total and the output indices consumed per transaction id.
    pub async fn find_spendable_outputs(
        &self,
        pubkey_hash: &[u8],
        amount: i64,
    ) -> Result<(i64, HashMap<String, Vec<usize>>)> {
        let mut indices: HashMap<String, Vec<usize>> = HashMap::new();
        let mut accumulated = 0;
        let tree = self
            .blockchain
            .get_db()
            .open_tree(UTXO_TREE)
            .map_err(|e| BtcError::UTXODBconnection(e.to_string()))?;

        for item in tree.iter() {
            let (k, v) = item.map_err(|e| BtcError::GettingUTXOError(e.to_string()))?;
            if !k.starts_with(UTXO_KEY_PREFIX.as_bytes()) || accumulated >= amount {
                continue;
            }
            let txid_hex = HEXLOWER.encode(&k[UTXO_KEY_PREFIX.len()..]);
            let outs: Vec<TxOut> = bincode::serde::decode_from_slice(v.as_ref(), bincode::config::standard())
                .map_err(|e| BtcError::TransactionDeserializationError(e.to_string()))?
                .0;
            for (idx, out) in outs.iter().enumerate() {
                if accumulated >= amount {
                    break;
                }
                if out.is_locked_with_key(pubkey_hash) {
                    accumulated += out.value();
                    indices.entry(txid_hex.clone()).or_default().push(idx);
                }
            }
        }
        Ok((accumulated, indices))
    }

    pub async fn find_utxo(&self, pubkey_hash: &[u8]) -> Result<Vec<TxOut>> {
        let tree = self
            .blockchain
            .get_db()
            .open_tree(UTXO_TREE)
            .map_err(|e| BtcError::UTXODBconnection(e.to_string()))?;
        let mut utxos = vec![];
        for item in tree.iter() {
            let (k, v) = item.map_err(|e| BtcError::GettingUTXOError(e.to_string()))?;
            if !k.starts_with(UTXO_KEY_PREFIX.as_bytes()) {
                continue;
            }
            let outs: Vec<TxOut> = bincode::serde::decode_from_slice(v.as_ref(), bincode::config::standard())
                .map_err(|e| BtcError::TransactionDeserializationError(e.to_string()))?
                .0;
            utxos.extend(outs.into_iter().filter(|o| o.is_locked_with_key(pubkey_hash)));
        }
        Ok(utxos)
    }

    pub async fn count_transactions(&self) -> Result<usize> {
        let tree = self
            .blockchain
            .get_db()
            .open_tree(UTXO_TREE)
            .map_err(|e| BtcError::UTXODBconnection(e.to_string()))?;
        Ok(tree.iter().filter(|item| item.as_ref().map(|(k, _)| k.starts_with(UTXO_KEY_PREFIX.as_bytes())).unwrap_or(false)).count())
    }

    /// Clears the UTXO tree and rebuilds it from a full chain walk.
    pub async fn reindex(&self) -> Result<()> {
        debug!("reindexing UTXO set");
        let tree = self
            .blockchain
            .get_db()
            .open_tree(UTXO_TREE)
            .map_err(|e| BtcError::UTXODBconnection(e.to_string()))?;
        tree.clear().map_err(|e| BtcError::UTXODBconnection(e.to_string()))?;

        let utxo_map = self.blockchain.find_utxo().await?;
        for (txid_hex, outs) in &utxo_map {
            let txid = HEXLOWER
                .decode(txid_hex.as_bytes())
                .map_err(|e| BtcError::TransactionIdHexDecodingError(e.to_string()))?;
            let bytes = bincode::serde::encode_to_vec(outs, bincode::config::standard())
                .map_err(|e| BtcError::TransactionSerializationError(e.to_string()))?;
            tree.insert(utxo_key(&txid), bytes)
                .map_err(|e| BtcError::SavingUTXOError(e.to_string()))?;
        }
        Ok(())
    }

    /// Applies the effect of a newly-accepted block: consumes spent inputs,
    /// inserts new outputs.
    pub async fn update(&self, block: &Block) -> Result<()> {
        let tree = self
            .blockchain
            .get_db()
            .open_tree(UTXO_TREE)
            .map_err(|e| BtcError::UTXODBconnection(e.to_string()))?;

        for tx in block.transactions() {
            if !tx.is_coinbase() {
                for input in tx.inputs() {
                    let key = utxo_key(input.prev_tx_id());
                    let Some(existing) = tree
                        .get(&key)
                        .map_err(|e| BtcError::GettingUTXOError(e.to_string()))?
                    else {
                        continue;
                    };
                    let existing_outs: Vec<TxOut> =
                        bincode::serde::decode_from_slice(existing.as_ref(), bincode::config::standard())
                            .map_err(|e| BtcError::TransactionDeserializationError(e.to_string()))?
                            .0;
                    let remaining: Vec<TxOut> = existing_outs
                        .into_iter()
                        .enumerate()
                        .filter(|(idx, _)| *idx as i64 != input.out_index())
                        .map(|(_, out)| out)
                        .collect();
                    if remaining.is_empty() {
                        tree.remove(&key).map_err(|e| BtcError::RemovingUTXOError(e.to_string()))?;
                    } else {
                        let bytes = bincode::serde::encode_to_vec(&remaining, bincode::config::standard())
                            .map_err(|e| BtcError::TransactionSerializationError(e.to_string()))?;
                        tree.insert(&key, bytes).map_err(|e| BtcError::SavingUTXOError(e.to_string()))?;
                    }
                }
            }
            let bytes = bincode::serde::encode_to_vec(tx.outputs(), bincode::config::standard())
                .map_err(|e| BtcError::TransactionSerializationError(e.to_string()))?;
            tree.insert(utxo_key(tx.id()), bytes)
                .map_err(|e| BtcError::SavingUTXOError(e.to_string()))?;
        }
        Ok(())
    }

    pub async fn get_balance(&self, address: &str) -> Result<i64> {
        if !validate_address(address)? {
            return Err(BtcError::InvalidAddress(address.to_string()));
        }
        let pubkey_hash = pubkey_hash_from_address(address)?;
        let utxos = self.find_utxo(&pubkey_hash).await?;
        Ok(utxos.iter().map(|o| o.value()).sum())
    }
}

fn pubkey_hash_from_address(address: &str) -> Result<Vec<u8>> {
    let payload = crate::crypto::base58_decode(address)?;
    if payload.len() <= crate::wallet::ADDRESS_CHECK_SUM_LEN + 1 {
        return Err(BtcError::InvalidAddress(address.to_string()));
    }
    Ok(payload[1..payload.len() - crate::wallet::ADDRESS_CHECK_SUM_LEN].to_vec())
}
