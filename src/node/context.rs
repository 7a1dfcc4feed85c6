//! Central coordination point for node operations (Bitcoin Core: node context /
//! `NodeContext` pattern). Web handlers and the CLI both go through here rather
//! than touching the chain, mempool, or peer set directly.

use crate::GLOBAL_CONFIG;
use crate::chain::{BlockchainService, UTXOSet};
use crate::error::Result;
use crate::node::miner;
use crate::node::miner::{prepare_mining_utxo, process_mine_block, should_trigger_mining};
use crate::node::peers::Node;
use crate::node::server::{CENTERAL_NODE, GLOBAL_MEMORY_POOL, GLOBAL_NODES, OpType};
use crate::node::txmempool::{add_to_memory_pool, remove_from_memory_pool, transaction_exists_in_pool};
use crate::net::net_processing::send_inv;
use crate::transaction::TxSummary;
use crate::wallet::{Wallet, Wallets};
use crate::{Block, Transaction};
use data_encoding::HEXLOWER;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tracing::{error, info};

#[derive(Clone, Debug)]
pub struct NodeContext {
    blockchain: BlockchainService,
}

impl NodeContext {
    pub fn new(blockchain: BlockchainService) -> Self {
        Self { blockchain }
    }

    pub fn blockchain(&self) -> &BlockchainService {
        &self.blockchain
    }

    //-------------------------------------------------------------------
    // Chain state
    //-------------------------------------------------------------------

    pub async fn add_block(&self, block: &Block) -> Result<()> {
        self.blockchain.add_block(block).await
    }

    pub async fn get_blockchain_height(&self) -> Result<usize> {
        self.blockchain.get_best_height().await
    }

    pub async fn get_block_hashes(&self) -> Result<Vec<Vec<u8>>> {
        self.blockchain.get_block_hashes().await
    }

    pub async fn get_block(&self, block_hash: &[u8]) -> Result<Option<Block>> {
        self.blockchain.get_block(block_hash).await
    }

    /// Looks up a block by its hex-encoded hash.
    pub async fn get_block_by_hash(&self, hash: &str) -> Result<Option<Block>> {
        let hash = HEXLOWER
            .decode(hash.as_bytes())
            .map_err(|e| crate::error::BtcError::TransactionIdHexDecodingError(e.to_string()))?;
        self.blockchain.get_block(&hash).await
    }

    /// Newest `count` blocks, walking back from the tip.
    pub async fn get_latest_blocks(&self, count: usize) -> Result<Vec<Block>> {
        let mut iter = self.blockchain.iterator().await?;
        let mut blocks = Vec::with_capacity(count);
        while blocks.len() < count {
            match iter.next()? {
                Some(block) => blocks.push(block),
                None => break,
            }
        }
        Ok(blocks)
    }

    pub async fn mine_block(&self, transactions: &[Transaction], cancel: &Arc<AtomicBool>) -> Result<Option<Block>> {
        self.blockchain.mine_block(transactions, cancel).await
    }

    pub async fn mine_empty_block(&self, cancel: &Arc<AtomicBool>) {
        miner::mine_empty_block(&self.blockchain, cancel).await
    }

    pub async fn find_all_transactions(&self) -> Result<HashMap<String, TxSummary>> {
        self.blockchain.find_all_transactions().await
    }

    //-------------------------------------------------------------------
    // Mempool / transaction submission
    //-------------------------------------------------------------------

    /// Builds, signs, and submits a transfer from `from` to `to`.
    pub async fn btc_transaction(&self, from: &str, to: &str, amount: i64) -> Result<String> {
        let utxo_set = UTXOSet::new(self.blockchain.clone());
        let tx = Transaction::new_utxo_transaction(from, to, amount, &utxo_set).await?;
        let addr_from = GLOBAL_CONFIG.get_node_addr();
        self.submit_transaction(&addr_from, tx).await
    }

    /// Accepts an already-built transaction into the pool, same path a peer's
    /// relayed transaction takes.
    pub async fn submit_transaction(&self, addr_from: &SocketAddr, tx: Transaction) -> Result<String> {
        let txid_hex = tx.id_hex();
        if transaction_exists_in_pool(&txid_hex) {
            info!(txid = txid_hex, "transaction already in memory pool");
            return Err(crate::error::BtcError::TransactionAlreadyExistsInMemoryPool(txid_hex));
        }

        add_to_memory_pool(tx.clone());

        let context = self.clone();
        let addr_copy = *addr_from;
        tokio::spawn(async move {
            context.relay_and_maybe_mine(&addr_copy, tx).await;
        });

        Ok(txid_hex)
    }

    pub fn get_transaction(&self, txid: &str) -> Result<Option<Transaction>> {
        GLOBAL_MEMORY_POOL.get(txid)
    }

    pub fn get_mempool_transactions(&self) -> Result<Vec<Transaction>> {
        GLOBAL_MEMORY_POOL.get_all()
    }

    pub fn get_mempool_size(&self) -> Result<usize> {
        GLOBAL_MEMORY_POOL.len()
    }

    pub fn remove_from_memory_pool(&self, txid_hex: &str) {
        remove_from_memory_pool(txid_hex);
    }

    //-------------------------------------------------------------------
    // Wallets
    //-------------------------------------------------------------------

    pub async fn get_balance(&self, address: &str) -> Result<i64> {
        let utxo_set = UTXOSet::new(self.blockchain.clone());
        utxo_set.get_balance(address).await
    }

    pub fn create_wallet(&self) -> Result<String> {
        let mut wallets = Wallets::new()?;
        wallets.create_wallet()
    }

    pub fn get_wallet(&self, address: &str) -> Result<Option<Wallet>> {
        let wallets = Wallets::new()?;
        Ok(wallets.get_wallet(address).cloned())
    }

    pub fn list_wallet_addresses(&self) -> Result<Vec<String>> {
        let wallets = Wallets::new()?;
        Ok(wallets.get_addresses())
    }

    //-------------------------------------------------------------------
    // Peers
    //-------------------------------------------------------------------

    pub fn get_peers(&self) -> Result<Vec<SocketAddr>> {
        Ok(GLOBAL_NODES.get_nodes()?.into_iter().map(|n| n.get_addr()).collect())
    }

    pub fn get_peer_count(&self) -> Result<usize> {
        GLOBAL_NODES.len()
    }

    //-------------------------------------------------------------------
    // Validation
    //-------------------------------------------------------------------

    /// Structural checks only; signature verification happens in `Transaction::verify`.
    pub fn validate_transaction(&self, tx: &Transaction) -> bool {
        if tx.is_coinbase() {
            return true;
        }
        !tx.inputs().is_empty() && !tx.outputs().is_empty()
    }

    pub fn validate_block(&self, block: &Block) -> bool {
        let txs = block.transactions();
        if txs.is_empty() || !txs[0].is_coinbase() {
            return false;
        }
        !txs[1..].iter().any(Transaction::is_coinbase)
    }

    //-------------------------------------------------------------------
    // Internal
    //-------------------------------------------------------------------

    async fn relay_and_maybe_mine(&self, addr_from: &SocketAddr, tx: Transaction) {
        let my_node_addr = GLOBAL_CONFIG.get_node_addr();

        if my_node_addr == *CENTERAL_NODE {
            let nodes = self.peers_excluding(addr_from);
            let txid = tx.id().to_vec();
            for node in nodes {
                let node_addr = node.get_addr();
                let txid = txid.clone();
                tokio::spawn(async move {
                    send_inv(&node_addr, OpType::Tx, &[txid]).await;
                });
            }
        }

        if should_trigger_mining() {
            match prepare_mining_utxo() {
                Ok(txs) => {
                    let cancel = Arc::new(AtomicBool::new(false));
                    process_mine_block(txs, &self.blockchain, &cancel).await;
                }
                Err(e) => error!("failed to prepare mining transactions: {}", e),
            }
        }
    }

    fn peers_excluding(&self, addr_from: &SocketAddr) -> Vec<Node> {
        let my_addr = GLOBAL_CONFIG.get_node_addr();
        GLOBAL_NODES
            .get_nodes()
            .expect("global nodes get error")
            .into_iter()
            .filter(|n| n.get_addr() != *addr_from && n.get_addr() != my_addr)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_db_path() -> String {
        let ts = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
        format!("test_node_context_{ts}")
    }

    async fn setup() -> (BlockchainService, String) {
        let db_path = unique_db_path();
        unsafe {
            std::env::set_var("TREE_DIR", &db_path);
            std::env::set_var("BLOCKS_TREE", &db_path);
        }
        let wallet = Wallet::new().unwrap();
        let blockchain = BlockchainService::initialize(&wallet.get_address().unwrap())
            .await
            .expect("initialize blockchain");
        (blockchain, db_path)
    }

    fn cleanup(db_path: &str) {
        let _ = std::fs::remove_dir_all(db_path);
    }

    #[tokio::test]
    async fn reports_genesis_height() {
        let (blockchain, db_path) = setup().await;
        let node = NodeContext::new(blockchain);
        assert_eq!(node.get_blockchain_height().await.unwrap(), 0);
        cleanup(&db_path);
    }

    #[tokio::test]
    async fn create_wallet_returns_valid_address() {
        let (blockchain, db_path) = setup().await;
        let node = NodeContext::new(blockchain);
        let addr = node.create_wallet().unwrap();
        assert!(crate::wallet::validate_address(&addr).unwrap());
        cleanup(&db_path);
    }
}
