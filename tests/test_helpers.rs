use blockchain::{BlockchainService, Transaction, UTXOSet, Wallets};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tempfile::TempDir;

/// Generate a unique genesis address for testing
pub fn generate_test_genesis_address() -> String {
    blockchain::Wallet::new()
        .and_then(|wallet| wallet.get_address())
        .expect("Failed to create test wallet address")
}

/// Create a temporary directory for testing
pub fn create_temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

/// Set environment variables for blockchain database
pub fn set_blockchain_env_vars(db_path: &PathBuf) {
    unsafe {
        std::env::set_var("TREE_DIR", db_path.to_str().unwrap());
        std::env::set_var("BLOCKS_TREE", db_path.to_str().unwrap());
    }
}

/// Create a blockchain with given genesis address
pub async fn create_blockchain_with_address(genesis_address: &str, db_path: &PathBuf) -> BlockchainService {
    set_blockchain_env_vars(db_path);
    BlockchainService::initialize(genesis_address)
        .await
        .expect("Failed to create test blockchain")
}

/// Create a temporary blockchain for testing
pub async fn create_temp_blockchain() -> (BlockchainService, TempDir) {
    let temp_dir = create_temp_dir();
    let db_path = temp_dir.path().join("test_blockchain");
    let genesis_address = generate_test_genesis_address();
    let blockchain = create_blockchain_with_address(&genesis_address, &db_path).await;
    (blockchain, temp_dir)
}

/// Create a coinbase transaction for given address
pub fn create_coinbase_transaction(address: &str) -> Transaction {
    Transaction::new_coinbase(address, b"test".to_vec()).expect("Failed to create coinbase transaction")
}

/// Mine a block with given transactions
pub async fn mine_block(blockchain: &BlockchainService, transactions: &[Transaction]) -> blockchain::Block {
    let cancel = Arc::new(AtomicBool::new(false));
    blockchain
        .mine_block(transactions, &cancel)
        .await
        .expect("Failed to mine block")
        .expect("Mining was cancelled")
}

/// Add a block to the blockchain
pub async fn add_block(blockchain: &BlockchainService, block: &blockchain::Block) {
    blockchain.add_block(block).await.expect("Failed to add block");
}

/// Create and mine a single block with a coinbase transaction
pub async fn create_single_block(blockchain: &BlockchainService, address: &str) -> blockchain::Block {
    let coinbase_tx = create_coinbase_transaction(address);
    let transactions = vec![coinbase_tx];
    mine_block(blockchain, &transactions).await
}

/// Helper function to create a blockchain with some initial blocks
pub async fn create_blockchain_with_blocks(num_blocks: usize) -> (BlockchainService, TempDir) {
    let (blockchain, temp_dir) = create_temp_blockchain().await;
    let genesis_address = generate_test_genesis_address();

    for _ in 0..num_blocks {
        let block = create_single_block(&blockchain, &genesis_address).await;
        add_block(&blockchain, &block).await;
    }

    (blockchain, temp_dir)
}

/// Helper function to create test wallets
pub fn create_test_wallets() -> Wallets {
    Wallets::new().expect("Failed to create test wallets")
}

/// Collect blocks from the iterator into a vector sorted by height
pub async fn collect_and_sort_blocks(blockchain: &BlockchainService) -> Option<Vec<blockchain::Block>> {
    let mut iterator = blockchain.iterator().await.ok()?;
    let mut blocks = Vec::new();
    while let Some(block) = iterator.next().ok()? {
        blocks.push(block);
    }
    blocks.sort_by_key(|block| block.height());
    Some(blocks)
}

/// Verify a single block's integrity
pub fn verify_block_integrity(block: &blockchain::Block, expected_height: usize, prev_block_hash: Option<&[u8]>) -> bool {
    block.height() == expected_height && prev_block_hash.map_or(true, |hash| block.prev_hash() == hash)
}

/// Verify blockchain integrity by checking the height and hash chain of every block
pub async fn verify_blockchain_integrity(blockchain: &BlockchainService) -> bool {
    match collect_and_sort_blocks(blockchain).await {
        Some(blocks) => blocks.iter().enumerate().all(|(i, block)| {
            let prev_hash = if i > 0 { Some(blocks[i - 1].hash()) } else { None };
            verify_block_integrity(block, i, prev_hash)
        }),
        None => false,
    }
}

/// Create a single test address
pub fn create_single_test_address(wallets: &mut Wallets) -> String {
    wallets.create_wallet().expect("Failed to create wallet")
}

/// Create multiple test addresses
pub fn create_test_addresses(count: usize) -> Vec<String> {
    let mut wallets = create_test_wallets();
    (0..count).map(|_| create_single_test_address(&mut wallets)).collect()
}

/// Validate that all addresses are non-empty
pub fn validate_addresses(addresses: &[String]) -> bool {
    addresses.iter().all(|addr| !addr.is_empty())
}

/// Create a UTXO set and reindex it
pub async fn create_and_reindex_utxo_set(blockchain: BlockchainService) -> UTXOSet {
    let utxo_set = UTXOSet::new(blockchain);
    utxo_set.reindex().await.expect("Failed to reindex UTXO set");
    utxo_set
}

/// Compose blockchain creation with validation
pub async fn create_validated_blockchain() -> (BlockchainService, TempDir) {
    let (blockchain, temp_dir) = create_temp_blockchain().await;
    assert_eq!(blockchain.get_best_height().await.expect("Failed to get height"), 0);
    (blockchain, temp_dir)
}

/// Compose blockchain creation with blocks and validation
pub async fn create_validated_blockchain_with_blocks(num_blocks: usize) -> (BlockchainService, TempDir) {
    let (blockchain, temp_dir) = create_blockchain_with_blocks(num_blocks).await;
    assert_eq!(
        blockchain.get_best_height().await.expect("Failed to get height"),
        num_blocks
    );
    (blockchain, temp_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_temp_blockchain() {
        let (_blockchain, temp_dir) = create_validated_blockchain().await;
        assert!(temp_dir.path().exists());
    }

    #[tokio::test]
    async fn test_create_blockchain_with_blocks() {
        let (blockchain, _temp_dir) = create_validated_blockchain_with_blocks(3).await;
        assert_eq!(blockchain.get_best_height().await.expect("Failed to get height"), 3);
    }

    #[test]
    fn test_create_test_wallets() {
        let mut wallets = create_test_wallets();
        let address = create_single_test_address(&mut wallets);
        assert!(!address.is_empty());
    }

    #[tokio::test]
    async fn test_verify_blockchain_integrity() {
        let (blockchain, _temp_dir) = create_validated_blockchain_with_blocks(2).await;
        assert!(verify_blockchain_integrity(&blockchain).await);
    }

    #[test]
    fn test_create_test_addresses() {
        let addresses = create_test_addresses(3);
        assert_eq!(addresses.len(), 3);
        assert!(validate_addresses(&addresses));
    }

    #[tokio::test]
    async fn test_functional_block_creation() {
        let (blockchain, _temp_dir) = create_temp_blockchain().await;
        let genesis_address = generate_test_genesis_address();

        let block = create_single_block(&blockchain, &genesis_address).await;
        add_block(&blockchain, &block).await;

        assert_eq!(blockchain.get_best_height().await.expect("Failed to get height"), 1);
    }
}
