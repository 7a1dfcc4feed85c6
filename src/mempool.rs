//! In-memory mempool: pending transactions keyed by hex transaction id, plus
//! the block-in-transit queue used while syncing blocks from a peer.

use crate::error::{BtcError, Result};
use crate::transaction::Transaction;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Default)]
pub struct Mempool {
    inner: RwLock<HashMap<String, Transaction>>,
}

impl Mempool {
    pub fn new() -> Mempool {
        Mempool::default()
    }

    pub fn contains(&self, txid_hex: &str) -> Result<bool> {
        let inner = self
            .inner
            .read()
            .map_err(|e| BtcError::MemoryPoolInnerPoisonedLockError(e.to_string()))?;
        Ok(inner.contains_key(txid_hex))
    }

    /// Inserts `tx` unless a transaction with the same id is already pending.
    pub fn add(&self, tx: Transaction) -> Result<bool> {
        let txid_hex = tx.id_hex();
        let mut inner = self
            .inner
            .write()
            .map_err(|e| BtcError::MemoryPoolInnerPoisonedLockError(e.to_string()))?;
        if inner.contains_key(&txid_hex) {
            return Ok(false);
        }
        inner.insert(txid_hex, tx);
        Ok(true)
    }

    pub fn get(&self, txid_hex: &str) -> Result<Option<Transaction>> {
        let inner = self
            .inner
            .read()
            .map_err(|e| BtcError::MemoryPoolInnerPoisonedLockError(e.to_string()))?;
        Ok(inner.get(txid_hex).cloned())
    }

    pub fn remove(&self, txid_hex: &str) -> Result<Option<Transaction>> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| BtcError::MemoryPoolInnerPoisonedLockError(e.to_string()))?;
        Ok(inner.remove(txid_hex))
    }

    /// Drops every transaction whose id appears in a just-accepted block.
    pub fn evict_block(&self, block: &crate::block::Block) -> Result<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| BtcError::MemoryPoolInnerPoisonedLockError(e.to_string()))?;
        for tx in block.transactions() {
            inner.remove(&tx.id_hex());
        }
        Ok(())
    }

    pub fn get_all(&self) -> Result<Vec<Transaction>> {
        let inner = self
            .inner
            .read()
            .map_err(|e| BtcError::MemoryPoolInnerPoisonedLockError(e.to_string()))?;
        Ok(inner.values().cloned().collect())
    }

    pub fn len(&self) -> Result<usize> {
        let inner = self
            .inner
            .read()
            .map_err(|e| BtcError::MemoryPoolInnerPoisonedLockError(e.to_string()))?;
        Ok(inner.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

/// Tracks block hashes requested from a peer but not yet received, so
/// `getdata` requests can be paced one block at a time.
#[derive(Default)]
pub struct BlockInTransit {
    inner: RwLock<Vec<Vec<u8>>>,
}

impl BlockInTransit {
    pub fn new() -> BlockInTransit {
        BlockInTransit::default()
    }

    pub fn add_blocks(&self, hashes: &[Vec<u8>]) -> Result<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| BtcError::MemoryPoolInnerPoisonedLockError(e.to_string()))?;
        inner.extend(hashes.iter().cloned());
        Ok(())
    }

    pub fn first(&self) -> Result<Option<Vec<u8>>> {
        let inner = self
            .inner
            .read()
            .map_err(|e| BtcError::MemoryPoolInnerPoisonedLockError(e.to_string()))?;
        Ok(inner.first().cloned())
    }

    pub fn remove(&self, hash: &[u8]) -> Result<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| BtcError::MemoryPoolInnerPoisonedLockError(e.to_string()))?;
        if let Some(idx) = inner.iter().position(|h| h == hash) {
            inner.remove(idx);
        }
        Ok(())
    }

    pub fn len(&self) -> Result<usize> {
        let inner = self
            .inner
            .read()
            .map_err(|e| BtcError::MemoryPoolInnerPoisonedLockError(e.to_string()))?;
        Ok(inner.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::Wallet;

    fn sample_tx() -> Transaction {
        let addr = Wallet::new().unwrap().get_address().unwrap();
        Transaction::new_coinbase(&addr, vec![1]).unwrap()
    }

    #[test]
    fn add_rejects_duplicate_by_id() {
        let pool = Mempool::new();
        let tx = sample_tx();
        assert!(pool.add(tx.clone()).unwrap());
        assert!(!pool.add(tx).unwrap());
        assert_eq!(pool.len().unwrap(), 1);
    }

    #[test]
    fn remove_drops_from_pool() {
        let pool = Mempool::new();
        let tx = sample_tx();
        pool.add(tx.clone()).unwrap();
        assert!(pool.remove(&tx.id_hex()).unwrap().is_some());
        assert!(pool.is_empty().unwrap());
    }

    #[test]
    fn block_in_transit_tracks_and_drains() {
        let transit = BlockInTransit::new();
        transit.add_blocks(&[vec![1], vec![2]]).unwrap();
        assert_eq!(transit.len().unwrap(), 2);
        assert_eq!(transit.first().unwrap(), Some(vec![1]));
        transit.remove(&[1]).unwrap();
        assert_eq!(transit.len().unwrap(), 1);
    }
}
