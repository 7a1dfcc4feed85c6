//! Block structure and construction via proof-of-work.

use crate::error::{BtcError, Result};
use crate::proof_of_work;
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

#[derive(Clone, Serialize, Deserialize)]
pub struct Block {
    timestamp: i64,
    height: usize,
    difficulty: u32,
    prev_hash: Vec<u8>,
    transactions: Vec<Transaction>,
    nonce: u64,
    hash: Vec<u8>,
}

impl Block {
    /// Assembles a block at `height` on top of `prev_hash` and mines it.
    /// Returns `None` if `cancel` fires before a valid nonce is found.
    pub fn mine(
        prev_hash: Vec<u8>,
        height: usize,
        transactions: Vec<Transaction>,
        cancel: &Arc<AtomicBool>,
    ) -> Option<Block> {
        let mut block = Block {
            timestamp: crate::current_timestamp(),
            height,
            difficulty: proof_of_work::DIFFICULTY,
            prev_hash,
            transactions,
            nonce: 0,
            hash: vec![],
        };
        let (nonce, hash) = proof_of_work::mine(&block, cancel)?;
        block.nonce = nonce;
        block.hash = hash;
        Some(block)
    }

    /// The empty-prev-hash, height-0 block every chain is rooted at.
    pub fn genesis(coinbase: Transaction, cancel: &Arc<AtomicBool>) -> Option<Block> {
        Block::mine(vec![], 0, vec![coinbase], cancel)
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn prev_hash(&self) -> &[u8] {
        &self.prev_hash
    }

    pub fn hash(&self) -> &[u8] {
        &self.hash
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_genesis(&self) -> bool {
        self.height == 0 && self.prev_hash.is_empty()
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| BtcError::BlockSerializationError(e.to_string()))
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Block> {
        bincode::serde::decode_from_slice(bytes, bincode::config::standard())
            .map(|(block, _)| block)
            .map_err(|e| BtcError::BlockDeserializationError(e.to_string()))
    }

    #[cfg(test)]
    pub(crate) fn set_nonce_for_test(&mut self, nonce: u64) {
        self.nonce = nonce;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::Wallet;
    use std::sync::atomic::AtomicBool;

    fn test_address() -> String {
        Wallet::new().unwrap().get_address().unwrap()
    }

    #[test]
    fn genesis_block_has_height_zero_and_empty_prev_hash() {
        let coinbase = Transaction::new_coinbase(&test_address(), vec![1]).unwrap();
        let cancel = Arc::new(AtomicBool::new(false));
        let block = Block::genesis(coinbase, &cancel).unwrap();
        assert_eq!(block.height(), 0);
        assert!(block.prev_hash().is_empty());
        assert!(block.is_genesis());
    }

    #[test]
    fn serialize_roundtrip_preserves_hash() {
        let coinbase = Transaction::new_coinbase(&test_address(), vec![1]).unwrap();
        let cancel = Arc::new(AtomicBool::new(false));
        let block = Block::genesis(coinbase, &cancel).unwrap();
        let bytes = block.serialize().unwrap();
        let back = Block::deserialize(&bytes).unwrap();
        assert_eq!(block.hash(), back.hash());
        assert_eq!(block.height(), back.height());
    }

    #[test]
    fn mined_block_hash_is_below_target() {
        let coinbase = Transaction::new_coinbase(&test_address(), vec![1]).unwrap();
        let cancel = Arc::new(AtomicBool::new(false));
        let block = Block::genesis(coinbase, &cancel).unwrap();
        assert!(crate::proof_of_work::validate(&block));
    }
}
