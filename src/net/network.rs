//! Incoming peer stream dispatch (Bitcoin Core: net_processing.cpp's
//! `ProcessMessage`).

use crate::block::Block;
use crate::chain::chainstate::BlockchainService;
use crate::chain::utxo_set::UTXOSet;
use crate::config::GLOBAL_CONFIG;
use crate::error::BtcError;
use crate::net::net_processing::{
    send_block, send_get_blocks, send_get_data, send_inv, send_message, send_tx, send_version,
};
use crate::node::miner::mine_empty_block;
use crate::node::server::{
    AdminNodeQueryType, GLOBAL_BLOCKS_IN_TRANSIT, GLOBAL_MEMORY_POOL, GLOBAL_NODES, MessageType,
    OpType, Package,
};
use crate::node::txmempool::{process_transaction, remove_from_memory_pool};
use crate::transaction::Transaction;
use crate::wallet::validate_address;
use data_encoding::HEXLOWER;
use serde_json::Deserializer;
use std::error::Error;
use std::io::BufReader;
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tracing::{debug, error, info, instrument, warn};

#[instrument(skip(blockchain, stream))]
pub async fn process_stream(blockchain: BlockchainService, stream: TcpStream) -> Result<(), Box<dyn Error>> {
    let peer_addr = stream.peer_addr()?;
    let reader = BufReader::new(&stream);
    let pkg_reader = Deserializer::from_reader(reader).into_iter::<Package>();

    for pkg in pkg_reader {
        let pkg = pkg?;
        info!("received from {}: {:?}", peer_addr, pkg);

        match pkg {
            Package::Block { addr_from, block } => {
                let block = Block::deserialize(block.as_slice())?;
                blockchain.add_block(&block).await?;
                let added_hash = block.hash().to_vec();

                for tx in block.transactions() {
                    remove_from_memory_pool(&tx.id_hex());
                }

                GLOBAL_BLOCKS_IN_TRANSIT.remove(&added_hash)?;
                if !GLOBAL_BLOCKS_IN_TRANSIT.is_empty()? {
                    if let Some(next_hash) = GLOBAL_BLOCKS_IN_TRANSIT.first()? {
                        send_get_data(&addr_from, OpType::Block, &next_hash).await;
                    }
                } else {
                    let utxo_set = UTXOSet::new(blockchain.clone());
                    utxo_set.reindex().await?;
                    info!("blocks in transit drained, reindexed UTXO set");
                }
            }
            Package::GetBlocks { addr_from } => {
                let blocks = blockchain.get_block_hashes().await?;
                send_inv(&addr_from, OpType::Block, &blocks).await;
            }
            Package::GetData { addr_from, op_type, id } => match op_type {
                OpType::Block => {
                    if let Some(block) = blockchain.get_block(id.as_slice()).await? {
                        send_block(&addr_from, &block).await;
                    }
                }
                OpType::Tx => {
                    let txid_hex = HEXLOWER.encode(id.as_slice());
                    if let Some(tx) = GLOBAL_MEMORY_POOL.get(&txid_hex)? {
                        send_tx(&addr_from, &tx).await;
                    } else {
                        debug!(txid = txid_hex, "requested transaction no longer in pool");
                    }
                }
            },
            Package::Inv { addr_from, op_type, items } => match op_type {
                OpType::Block => {
                    GLOBAL_BLOCKS_IN_TRANSIT.add_blocks(items.as_slice())?;
                    if let Some(block_hash) = items.first() {
                        send_get_data(&addr_from, OpType::Block, block_hash).await;
                    }
                }
                OpType::Tx => {
                    if let Some(txid) = items.first() {
                        let txid_hex = HEXLOWER.encode(txid);
                        if !GLOBAL_MEMORY_POOL.contains(&txid_hex)? {
                            send_get_data(&addr_from, OpType::Tx, txid).await;
                        }
                    }
                }
            },
            Package::Tx { addr_from, transaction } => {
                let tx = Transaction::deserialize(transaction.as_slice())?;
                process_transaction(&addr_from, tx, &blockchain).await;
            }
            Package::SendBitCoin { addr_from, wlt_frm_addr, wlt_to_addr, amount } => {
                if !validate_address(&wlt_frm_addr)? {
                    send_message(&addr_from, MessageType::Error, format!("invalid from address: {wlt_frm_addr}")).await;
                } else if !validate_address(&wlt_to_addr)? {
                    send_message(&addr_from, MessageType::Error, format!("invalid to address: {wlt_to_addr}")).await;
                } else {
                    let utxo_set = UTXOSet::new(blockchain.clone());
                    match Transaction::new_utxo_transaction(&wlt_frm_addr, &wlt_to_addr, amount, &utxo_set).await {
                        Ok(transaction) => process_transaction(&addr_from, transaction, &blockchain).await,
                        Err(BtcError::NotEnoughFunds) => {
                            let balance = utxo_set.get_balance(&wlt_frm_addr).await.unwrap_or(0);
                            send_message(
                                &addr_from,
                                MessageType::Error,
                                format!("insufficient funds: cannot send {amount}, balance is {balance}"),
                            )
                            .await;
                        }
                        Err(e) => {
                            send_message(&addr_from, MessageType::Error, format!("transaction creation failed: {e}")).await;
                        }
                    }
                }
            }
            Package::Version { addr_from, version: _, best_height } => {
                let local_best_height = blockchain.get_best_height().await?;
                if local_best_height < best_height {
                    send_get_blocks(&addr_from).await;
                }
                if local_best_height > best_height {
                    send_version(&addr_from, local_best_height).await;
                }
                if !GLOBAL_NODES.node_is_known(&addr_from)? {
                    GLOBAL_NODES.add_node(addr_from)?;
                }
            }
            Package::KnownNodes { addr_from, nodes } => {
                crate::net::net_processing::process_known_nodes(blockchain.clone(), &addr_from, nodes).await;
            }
            Package::Message { addr_from, message_type, message } => match message_type {
                MessageType::Error => error!("{} sent error: {}", addr_from, message),
                MessageType::Warning => warn!("{} sent warning: {}", addr_from, message),
                MessageType::Info => debug!("{} sent info: {}", addr_from, message),
                MessageType::Success => debug!("{} sent success: {}", addr_from, message),
                MessageType::Ack => debug!("{} sent ack: {}", addr_from, message),
            },
            Package::AdminNodeQuery { addr_from: _, query_type } => match query_type {
                AdminNodeQueryType::GetBalance { wlt_address } => {
                    if !validate_address(&wlt_address)? {
                        return Err(Box::new(BtcError::InvalidAddress(wlt_address)));
                    }
                    let utxo_set = UTXOSet::new(blockchain.clone());
                    let balance = utxo_set.get_balance(&wlt_address).await?;
                    debug!(address = wlt_address, balance, "balance query");
                }
                AdminNodeQueryType::GetAllTransactions => {
                    let transactions = blockchain.find_all_transactions().await?;
                    info!(count = transactions.len(), "transactions in chain");
                }
                AdminNodeQueryType::GetBlockHeight => {
                    let height = blockchain.get_best_height().await?;
                    debug!(height, "block height query");
                }
                AdminNodeQueryType::MineEmptyBlock => {
                    let cancel = Arc::new(AtomicBool::new(false));
                    mine_empty_block(&blockchain, &cancel).await;
                }
                AdminNodeQueryType::ReindexUtxo => {
                    let utxo_set = UTXOSet::new(blockchain.clone());
                    utxo_set.reindex().await?;
                    let count = utxo_set.count_transactions().await?;
                    info!(count, "reindexed UTXO set");
                }
            },
        }
    }
    let _ = stream.shutdown(Shutdown::Both);
    Ok(())
}
