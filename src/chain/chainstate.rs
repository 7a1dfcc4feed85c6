//! Persistent chain store: `block_hash -> serialized Block` plus the `"lh"`
//! tip pointer, backed by a sled tree under `./tmp/blocks_<NODE_ID>/`.

use crate::block::Block;
use crate::error::{BtcError, Result};
use crate::proof_of_work;
use crate::transaction::{Transaction, TxSummary};
use crate::wallet::convert_address;
use data_encoding::HEXLOWER;
use sled::{Db, Tree};
use std::collections::HashMap;
use std::env::current_dir;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tokio::sync::RwLock as TokioRwLock;
use tracing::info;

const TIP_KEY: &str = "lh";
const DEFAULT_BLOCKS_TREE: &str = "blocks";
const DEFAULT_TREE_DIR: &str = "data";

#[derive(Clone)]
pub struct BlockchainService {
    db: Db,
    tree_name: String,
    tip_hash: Arc<TokioRwLock<Vec<u8>>>,
}

impl BlockchainService {
    /// Opens (or creates) the chain store at `./tmp/blocks_<NODE_ID>/`, mining
    /// the genesis block the first time around.
    pub async fn initialize(genesis_address: &str) -> Result<Self> {
        let path = Self::resolve_dir()?;
        let tree_name = std::env::var("BLOCKS_TREE").unwrap_or_else(|_| DEFAULT_BLOCKS_TREE.to_string());
        let db = sled::open(path).map_err(|e| BtcError::BlockchainDBconnection(e.to_string()))?;
        let tree = db
            .open_tree(tree_name.clone())
            .map_err(|e| BtcError::OpenBlockchainTreeError(e.to_string()))?;

        let tip_hash = if let Some(existing) = tree
            .get(TIP_KEY)
            .map_err(|e| BtcError::GetBlockchainError(e.to_string()))?
        {
            existing.to_vec()
        } else {
            let coinbase = Transaction::new_coinbase(genesis_address, b"genesis".to_vec())?;
            let cancel = Arc::new(AtomicBool::new(false));
            let genesis = Block::genesis(coinbase, &cancel)
                .ok_or(BtcError::InvalidBlock)?;
            Self::write_block(&tree, &genesis)?;
            genesis.hash().to_vec()
        };

        Ok(BlockchainService {
            db,
            tree_name,
            tip_hash: Arc::new(TokioRwLock::new(tip_hash)),
        })
    }

    /// `TREE_DIR`, when set, overrides the store location outright (used by
    /// tests to get isolated per-test databases). Otherwise the directory is
    /// derived from [`GLOBAL_CONFIG`]'s `NODE_ID`-namespaced
    /// [`crate::config::Config::blocks_dir`].
    fn resolve_dir() -> Result<std::path::PathBuf> {
        let dir = match std::env::var("TREE_DIR") {
            Ok(dir) => dir,
            Err(_) => crate::config::GLOBAL_CONFIG
                .blocks_dir()
                .unwrap_or_else(|_| DEFAULT_TREE_DIR.to_string()),
        };
        current_dir()
            .map(|p| p.join(dir))
            .map_err(|e| BtcError::BlockchainDBconnection(e.to_string()))
    }

    fn write_block(tree: &Tree, block: &Block) -> Result<()> {
        let bytes = block.serialize()?;
        tree.insert(block.hash(), bytes)
            .map_err(|e| BtcError::SavingBlockchainError(e.to_string()))?;
        tree.insert(TIP_KEY, block.hash())
            .map_err(|e| BtcError::SavingBlockchainError(e.to_string()))?;
        Ok(())
    }

    fn tree(&self) -> Result<Tree> {
        self.db
            .open_tree(self.tree_name.clone())
            .map_err(|e| BtcError::OpenBlockchainTreeError(e.to_string()))
    }

    pub fn get_db(&self) -> &Db {
        &self.db
    }

    pub async fn get_tip_hash(&self) -> Vec<u8> {
        self.tip_hash.read().await.clone()
    }

    async fn set_tip_hash(&self, hash: Vec<u8>) {
        *self.tip_hash.write().await = hash;
    }

    /// Appends `block` to the store, keeping the tip at the highest-height
    /// block seen so far. Rejects blocks whose proof of work doesn't meet
    /// the difficulty target.
    pub async fn add_block(&self, block: &Block) -> Result<()> {
        if !proof_of_work::validate(block) {
            return Err(BtcError::InvalidBlock);
        }
        let tree = self.tree()?;
        if tree
            .get(block.hash())
            .map_err(|e| BtcError::GetBlockchainError(e.to_string()))?
            .is_some()
        {
            return Ok(());
        }
        tree.insert(block.hash(), block.serialize()?)
            .map_err(|e| BtcError::SavingBlockchainError(e.to_string()))?;

        let current_height = self.get_best_height().await?;
        if block.height() > current_height || self.get_block(&self.get_tip_hash().await).await?.is_none() {
            tree.insert(TIP_KEY, block.hash())
                .map_err(|e| BtcError::SavingBlockchainError(e.to_string()))?;
            self.set_tip_hash(block.hash().to_vec()).await;
            info!(height = block.height(), "chain tip advanced");
        }
        Ok(())
    }

    pub async fn get_best_height(&self) -> Result<usize> {
        let tip = self.get_tip_hash().await;
        match self.get_block(&tip).await? {
            Some(block) => Ok(block.height()),
            None => Ok(0),
        }
    }

    pub async fn get_block(&self, hash: &[u8]) -> Result<Option<Block>> {
        let tree = self.tree()?;
        let bytes = tree
            .get(hash)
            .map_err(|e| BtcError::GetBlockchainError(e.to_string()))?;
        bytes.map(|b| Block::deserialize(&b)).transpose()
    }

    pub async fn get_block_hashes(&self) -> Result<Vec<Vec<u8>>> {
        let mut hashes = vec![];
        let mut iter = self.iterator().await?;
        while let Some(block) = iter.next()? {
            hashes.push(block.hash().to_vec());
        }
        Ok(hashes)
    }

    pub async fn iterator(&self) -> Result<ChainIterator> {
        Ok(ChainIterator::new(self.get_tip_hash().await, self.db.clone(), self.tree_name.clone()))
    }

    /// Resolves, for every non-coinbase input of `tx`, the transaction it
    /// spends from, keyed by hex txid as [`Transaction::verify`] expects.
    pub async fn build_prev_txs(&self, tx: &Transaction) -> Result<HashMap<String, Transaction>> {
        let mut prev_txs = HashMap::new();
        if tx.is_coinbase() {
            return Ok(prev_txs);
        }
        for input in tx.inputs() {
            let txid_hex = HEXLOWER.encode(input.prev_tx_id());
            let prev_tx = self
                .find_transaction(input.prev_tx_id())
                .await?
                .ok_or_else(|| BtcError::PrevTxMissing(txid_hex.clone()))?;
            prev_txs.insert(txid_hex, prev_tx);
        }
        Ok(prev_txs)
    }

    /// Mines a block containing `transactions` on top of the current tip and
    /// appends it to the store. Returns `Ok(None)` if `cancel` fires first.
    /// Every transaction's signature is verified before the block is written.
    pub async fn mine_block(&self, transactions: &[Transaction], cancel: &Arc<AtomicBool>) -> Result<Option<Block>> {
        for tx in transactions {
            let prev_txs = self.build_prev_txs(tx).await?;
            if !tx.verify(&prev_txs)? {
                return Err(BtcError::InvalidTransaction);
            }
        }
        let tip_hash = self.get_tip_hash().await;
        let height = self.get_best_height().await? + 1;
        let block = Block::mine(tip_hash, height, transactions.to_vec(), cancel);
        if let Some(block) = &block {
            self.add_block(block).await?;
        }
        Ok(block)
    }

    pub async fn find_transaction(&self, txid: &[u8]) -> Result<Option<Transaction>> {
        let mut iter = self.iterator().await?;
        while let Some(block) = iter.next()? {
            for tx in block.transactions() {
                if tx.id() == txid {
                    return Ok(Some(tx.clone()));
                }
            }
        }
        Ok(None)
    }

    pub async fn find_all_transactions(&self) -> Result<HashMap<String, TxSummary>> {
        let mut out = HashMap::new();
        let mut iter = self.iterator().await?;
        while let Some(block) = iter.next()? {
            for tx in block.transactions() {
                out.insert(tx.id_hex(), TxSummary::from_transaction(tx)?);
            }
        }
        Ok(out)
    }

    /// Walks the whole chain and rebuilds the UTXO set from scratch, per
    /// `crate::chain::utxo_set::UTXOSet::reindex`.
    pub async fn find_utxo(&self) -> Result<HashMap<String, Vec<crate::transaction::TxOut>>> {
        let mut utxo: HashMap<String, Vec<crate::transaction::TxOut>> = HashMap::new();
        let mut spent: HashMap<String, Vec<usize>> = HashMap::new();

        let mut iter = self.iterator().await?;
        while let Some(block) = iter.next()? {
            for tx in block.transactions() {
                let txid_hex = tx.id_hex();
                utxo.entry(txid_hex).or_default().extend(tx.outputs().iter().cloned());
            }
        }

        let mut iter = self.iterator().await?;
        while let Some(block) = iter.next()? {
            for tx in block.transactions() {
                if tx.is_coinbase() {
                    continue;
                }
                for input in tx.inputs() {
                    let prev_hex = HEXLOWER.encode(input.prev_tx_id());
                    spent.entry(prev_hex).or_default().push(input.out_index() as usize);
                }
            }
        }

        for (txid_hex, mut indices) in spent {
            if let Some(outputs) = utxo.get_mut(&txid_hex) {
                indices.sort_unstable_by(|a, b| b.cmp(a));
                for idx in indices {
                    if idx < outputs.len() {
                        outputs.remove(idx);
                    }
                }
                if outputs.is_empty() {
                    utxo.remove(&txid_hex);
                }
            }
        }

        Ok(utxo)
    }

    /// Resolves an address for display, used by [`find_all_transactions`](Self::find_all_transactions) callers.
    pub fn address_for(pubkey_hash: &[u8]) -> Result<String> {
        convert_address(pubkey_hash)
    }
}

pub struct ChainIterator {
    db: Db,
    tree_name: String,
    current_hash: Vec<u8>,
}

impl ChainIterator {
    fn new(tip_hash: Vec<u8>, db: Db, tree_name: String) -> ChainIterator {
        ChainIterator { current_hash: tip_hash, tree_name, db }
    }

    pub fn next(&mut self) -> Result<Option<Block>> {
        if self.current_hash.is_empty() {
            return Ok(None);
        }
        let tree = self
            .db
            .open_tree(self.tree_name.clone())
            .map_err(|e| BtcError::OpenBlockchainTreeError(e.to_string()))?;
        let Some(bytes) = tree
            .get(&self.current_hash)
            .map_err(|e| BtcError::GetBlockchainError(e.to_string()))?
        else {
            return Ok(None);
        };
        let block = Block::deserialize(&bytes)?;
        self.current_hash = block.prev_hash().to_vec();
        Ok(Some(block))
    }
}
