//! Memory pool admission and transaction relay (Bitcoin Core: txmempool.cpp).

use crate::chain::chainstate::BlockchainService;
use crate::config::GLOBAL_CONFIG;
use crate::error::BtcError;
use crate::node::miner::process_mine_block;
use crate::node::peers::Node;
use crate::node::server::{
    CENTERAL_NODE, GLOBAL_MEMORY_POOL, GLOBAL_NODES, MessageType, OpType, TRANSACTION_THRESHOLD,
};
use crate::transaction::Transaction;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tracing::{debug, info, warn};

/// Adds a transaction to the pool. Returns `false` if it was already present.
pub fn add_to_memory_pool(tx: Transaction) -> bool {
    debug!(txid = tx.id_hex(), "adding transaction to memory pool");
    GLOBAL_MEMORY_POOL.add(tx).expect("memory pool add error")
}

pub fn remove_from_memory_pool(txid_hex: &str) {
    GLOBAL_MEMORY_POOL
        .remove(txid_hex)
        .expect("memory pool remove error");
}

pub fn transaction_exists_in_pool(txid_hex: &str) -> bool {
    GLOBAL_MEMORY_POOL.contains(txid_hex).unwrap_or(false)
}

fn get_nodes_excluding_sender(addr_from: &SocketAddr) -> Vec<Node> {
    GLOBAL_NODES
        .get_nodes()
        .expect("global nodes get error")
        .into_iter()
        .filter(|node| {
            let node_addr = node.get_addr();
            let my_addr = GLOBAL_CONFIG.get_node_addr();
            node_addr != *addr_from && node_addr != my_addr
        })
        .collect()
}

async fn broadcast_transaction_to_nodes(nodes: &[Node], txid: Vec<u8>) {
    for node in nodes {
        let node_addr = node.get_addr();
        let txid = txid.clone();
        tokio::spawn(async move {
            crate::net::net_processing::send_inv(&node_addr, OpType::Tx, &[txid]).await;
        });
    }
}

/// Accepts a transaction relayed by `addr_from`: admits it to the pool,
/// rebroadcasts it from the central node, and mines a block once the pool
/// has accumulated enough pending transactions.
pub async fn process_transaction(addr_from: &SocketAddr, tx: Transaction, blockchain: &BlockchainService) {
    let txid_hex = tx.id_hex();
    if transaction_exists_in_pool(&txid_hex) {
        info!(txid = txid_hex, "transaction already in memory pool");
        crate::net::net_processing::send_message(
            addr_from,
            MessageType::Error,
            format!("transaction {txid_hex} already exists"),
        )
        .await;
        return;
    }

    let prev_txs = match blockchain.build_prev_txs(&tx).await {
        Ok(prev_txs) => prev_txs,
        Err(e) => {
            warn!(txid = txid_hex, error = %e, "transaction rejected: could not resolve inputs");
            crate::net::net_processing::send_message(
                addr_from,
                MessageType::Error,
                format!("transaction {txid_hex} rejected: {e}"),
            )
            .await;
            return;
        }
    };
    match tx.verify(&prev_txs) {
        Ok(true) => {}
        Ok(false) | Err(_) => {
            warn!(txid = txid_hex, "transaction rejected: signature verification failed");
            crate::net::net_processing::send_message(
                addr_from,
                MessageType::Error,
                format!("transaction {txid_hex} rejected: {}", BtcError::InvalidTransaction),
            )
            .await;
            return;
        }
    }

    let txid = tx.id().to_vec();
    add_to_memory_pool(tx);

    let my_node_addr = GLOBAL_CONFIG.get_node_addr();
    if my_node_addr.eq(&*CENTERAL_NODE) {
        let nodes = get_nodes_excluding_sender(addr_from);
        broadcast_transaction_to_nodes(&nodes, txid).await;
    }

    let pool_size = GLOBAL_MEMORY_POOL.len().expect("memory pool length error");
    if pool_size >= TRANSACTION_THRESHOLD && GLOBAL_CONFIG.is_miner() {
        let txs = GLOBAL_MEMORY_POOL.get_all().expect("memory pool get all error");
        let cancel = Arc::new(AtomicBool::new(false));
        process_mine_block(txs, blockchain, &cancel).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_rejects_duplicate() {
        let wallet = crate::wallet::Wallet::new().unwrap();
        let tx = crate::transaction::Transaction::new_coinbase(&wallet.get_address().unwrap(), vec![1]).unwrap();
        assert!(add_to_memory_pool(tx.clone()));
        assert!(transaction_exists_in_pool(&tx.id_hex()));
        remove_from_memory_pool(&tx.id_hex());
        assert!(!transaction_exists_in_pool(&tx.id_hex()));
    }
}
