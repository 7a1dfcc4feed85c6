//! Mining operations (Bitcoin Core: miner.cpp)
//!
//! This module handles block creation and mining, similar to Bitcoin Core's
//! miner.cpp (BlockAssembler, CreateNewBlock).

use crate::chain::chainstate::BlockchainService;
use crate::config::GLOBAL_CONFIG;
use crate::net::net_processing::send_inv;
use crate::node::server::{GLOBAL_MEMORY_POOL, GLOBAL_NODES, OpType, TRANSACTION_THRESHOLD};
use crate::node::txmempool::remove_from_memory_pool;
use crate::transaction::Transaction;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tracing::{error, info};

fn create_mining_coinbase_transaction() -> crate::error::Result<Transaction> {
    let mining_address = GLOBAL_CONFIG
        .get_mining_addr()
        .expect("mining address not set");
    Transaction::new_coinbase(&mining_address, b"mined".to_vec())
}

pub fn should_trigger_mining() -> bool {
    let pool_size = GLOBAL_MEMORY_POOL.len().expect("memory pool length error");
    pool_size >= TRANSACTION_THRESHOLD && GLOBAL_CONFIG.is_miner()
}

/// Pulls the whole memory pool plus a fresh coinbase into a block template.
/// The coinbase is always `transactions[0]`.
pub fn prepare_mining_utxo() -> crate::error::Result<Vec<Transaction>> {
    let txs = GLOBAL_MEMORY_POOL.get_all().expect("memory pool get all error");
    info!(count = txs.len(), "preparing to mine");
    let coinbase_tx = create_mining_coinbase_transaction()?;
    let mut final_txs = vec![coinbase_tx];
    final_txs.extend(txs);
    Ok(final_txs)
}

/// Mines `txs` on top of the chain tip and broadcasts the result, evicting
/// the mined transactions from the pool. A no-op if `cancel` fires first.
pub async fn process_mine_block(txs: Vec<Transaction>, blockchain: &BlockchainService, cancel: &Arc<AtomicBool>) {
    let my_node_addr = GLOBAL_CONFIG.get_node_addr();

    let new_block = match blockchain.mine_block(&txs, cancel).await.expect("mine block error") {
        Some(block) => block,
        None => {
            info!("mining cancelled");
            return;
        }
    };

    info!(
        hash = %data_encoding::HEXLOWER.encode(new_block.hash()),
        node = %my_node_addr,
        "mined new block"
    );

    for tx in &txs {
        remove_from_memory_pool(&tx.id_hex());
    }

    let nodes = GLOBAL_NODES.get_nodes().expect("global nodes get error");
    for node in nodes.iter().filter(|n| n.get_addr() != my_node_addr) {
        let node_addr = node.get_addr();
        let block_hash = new_block.hash().to_vec();
        tokio::spawn(async move {
            send_inv(&node_addr, OpType::Block, &[block_hash]).await;
        });
    }
}

/// Bitcoin mining without any pending user transactions is possible because
/// the block reward, not transaction fees, is what pays a miner for finding
/// a block. Mining an empty block still advances the chain and its
/// cumulative proof of work.
pub async fn mine_empty_block(blockchain: &BlockchainService, cancel: &Arc<AtomicBool>) {
    if !GLOBAL_CONFIG.is_miner() {
        return;
    }
    match prepare_mining_utxo() {
        Ok(txs) => process_mine_block(txs, blockchain, cancel).await,
        Err(e) => error!("failed to prepare mining transactions: {}", e),
    }
}
