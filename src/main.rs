use blockchain::chain::UTXOSet;
use blockchain::net::net_processing::send_tx;
use blockchain::node::server::{CENTERAL_NODE, ConnectNode};
use blockchain::node::{NodeContext, Server};
use blockchain::transaction::Transaction;
use blockchain::wallet::{Wallet, Wallets, validate_address};
use blockchain::web::server::create_web_server;
use blockchain::{BlockchainService, BtcError, GLOBAL_CONFIG, Result};
use clap::{Parser, Subcommand};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use tracing::{error, info};
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    fmt,
    prelude::*,
};

#[derive(Debug, Parser)]
#[command(name = "blockchain")]
struct Opt {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(name = "createwallet", about = "Create a new wallet")]
    Createwallet,
    #[command(name = "listaddresses", about = "Print all local wallet addresses")]
    ListAddresses,
    #[command(name = "createblockchain", about = "Create a blockchain and send the genesis reward to an address")]
    CreateBlockchain {
        #[arg(long = "address")]
        address: String,
    },
    #[command(name = "getbalance", about = "Get the wallet balance of an address")]
    GetBalance {
        #[arg(long = "address")]
        address: String,
    },
    #[command(name = "send", about = "Send coin from one address to another")]
    Send {
        #[arg(long = "from")]
        from: String,
        #[arg(long = "to")]
        to: String,
        #[arg(long = "amount")]
        amount: i64,
        #[arg(long = "mine", help = "Mine the new block locally instead of broadcasting")]
        mine: bool,
    },
    #[command(name = "printchain", about = "Print all blocks in the blockchain")]
    Printchain,
    #[command(name = "reindexutxo", about = "Rebuild the UTXO index from the chain")]
    ReindexUtxo,
    #[command(name = "startnode", about = "Start a node")]
    StartNode {
        #[arg(long = "miner", help = "Mining reward address; presence marks this node as a miner")]
        miner: Option<String>,
        #[arg(name = "connect_nodes", required(true), help = "Nodes to connect to ('local' for the bootstrap node)")]
        connect_nodes: Vec<ConnectNode>,
    },
}

fn initialize_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(fmt::layer().with_filter(filter))
        .init();
}

fn create_wallet() -> Result<String> {
    let mut wallets = Wallets::new()?;
    let address = wallets.create_wallet()?;
    info!("your new address: {}", address);
    Ok(address)
}

fn list_addresses() -> Result<()> {
    let wallets = Wallets::new()?;
    for address in wallets.get_addresses() {
        info!("{}", address);
    }
    Ok(())
}

/// Any local wallet address, used as the (otherwise irrelevant) genesis hint
/// when opening a chain that is already known to exist.
fn any_wallet_address() -> Result<String> {
    let wallets = Wallets::new()?;
    wallets
        .get_addresses()
        .into_iter()
        .next()
        .ok_or_else(|| BtcError::WalletKeyError("no local wallets; run createwallet first".to_string()))
}

async fn create_blockchain(address: String) -> Result<()> {
    if !validate_address(&address)? {
        return Err(BtcError::InvalidAddress(address));
    }
    let blockchain = BlockchainService::initialize(&address).await?;
    let utxo_set = UTXOSet::new(blockchain);
    utxo_set.reindex().await?;
    info!("blockchain created");
    Ok(())
}

async fn get_balance(address: String) -> Result<()> {
    if !validate_address(&address)? {
        return Err(BtcError::InvalidAddress(address));
    }
    let blockchain = BlockchainService::initialize(&address).await?;
    let utxo_set = UTXOSet::new(blockchain);
    let balance = utxo_set.get_balance(&address).await?;
    info!("balance of {}: {}", address, balance);
    Ok(())
}

async fn send(from: String, to: String, amount: i64, mine: bool) -> Result<()> {
    if !validate_address(&from)? {
        return Err(BtcError::InvalidAddress(from));
    }
    if !validate_address(&to)? {
        return Err(BtcError::InvalidAddress(to));
    }

    let blockchain = BlockchainService::initialize(&from).await?;
    let utxo_set = UTXOSet::new(blockchain.clone());
    let tx = Transaction::new_utxo_transaction(&from, &to, amount, &utxo_set).await?;

    if mine {
        let coinbase = Transaction::new_coinbase(&from, b"send -mine".to_vec())?;
        let cancel = Arc::new(AtomicBool::new(false));
        let block = blockchain
            .mine_block(&[coinbase, tx], &cancel)
            .await?
            .ok_or(BtcError::InvalidBlock)?;
        blockchain.add_block(&block).await?;
        utxo_set.update(&block).await?;
        info!("mined block {}", data_encoding::HEXLOWER.encode(block.hash()));
    } else {
        send_tx(&CENTERAL_NODE, &tx).await;
        info!("sent transaction {} to bootstrap node", tx.id_hex());
    }
    Ok(())
}

fn print_transaction(tx: &Transaction) {
    info!("- transaction {}", tx.id_hex());
    if !tx.is_coinbase() {
        for input in tx.inputs() {
            info!(
                "  input: prev_tx={} out_index={}",
                data_encoding::HEXLOWER.encode(input.prev_tx_id()),
                input.out_index()
            );
        }
    }
    for output in tx.outputs() {
        info!("  output: value={} pubkey_hash={}", output.value(), data_encoding::HEXLOWER.encode(output.pubkey_hash()));
    }
}

async fn print_blockchain() -> Result<()> {
    let address = any_wallet_address()?;
    let blockchain = BlockchainService::initialize(&address).await?;
    let mut iterator = blockchain.iterator().await?;
    while let Some(block) = iterator.next()? {
        info!("height: {}", block.height());
        info!("prev hash: {}", data_encoding::HEXLOWER.encode(block.prev_hash()));
        info!("hash: {}", data_encoding::HEXLOWER.encode(block.hash()));
        for tx in block.transactions() {
            print_transaction(tx);
        }
    }
    Ok(())
}

async fn reindex_utxo() -> Result<()> {
    let address = any_wallet_address()?;
    let blockchain = BlockchainService::initialize(&address).await?;
    let utxo_set = UTXOSet::new(blockchain);
    utxo_set.reindex().await?;
    let count = utxo_set.count_transactions().await?;
    info!("reindexed utxo set; {} transactions", count);
    Ok(())
}

async fn start_node(miner: Option<String>, connect_nodes: Vec<ConnectNode>) -> Result<()> {
    if let Some(ref addr) = miner {
        if !validate_address(addr)? {
            return Err(BtcError::InvalidAddress(addr.clone()));
        }
        GLOBAL_CONFIG.set_mining_addr(addr);
    }

    let genesis_hint = match miner.clone() {
        Some(addr) => addr,
        None => any_wallet_address().unwrap_or_else(|_| Wallet::new().expect("wallet generation").get_address().expect("address")),
    };
    let blockchain = BlockchainService::initialize(&genesis_hint).await?;
    let node_context = NodeContext::new(blockchain);

    let socket_addr = GLOBAL_CONFIG.get_node_addr();
    info!("starting node at {}", socket_addr);
    info!("connecting to: {:?}", connect_nodes);

    let connect_nodes_set: HashSet<ConnectNode> = connect_nodes.into_iter().collect();

    let network_server = Server::new(node_context.clone());
    let web_server = create_web_server(node_context);

    let network_handle = tokio::spawn(async move {
        if let Err(e) = network_server.run(&socket_addr, connect_nodes_set).await {
            error!("network server error: {}", e);
        }
    });

    let web_handle = tokio::spawn(async move {
        match web_server.start_with_shutdown().await {
            Ok(_) => info!("web server stopped gracefully"),
            Err(e) => error!("web server error: {}", e),
        }
    });

    tokio::select! {
        _ = network_handle => info!("network server stopped"),
        _ = web_handle => info!("web server stopped"),
    }

    Ok(())
}

async fn process_command(command: Command) -> Result<()> {
    match command {
        Command::Createwallet => create_wallet().map(|_| ()),
        Command::ListAddresses => list_addresses(),
        Command::CreateBlockchain { address } => create_blockchain(address).await,
        Command::GetBalance { address } => get_balance(address).await,
        Command::Send { from, to, amount, mine } => send(from, to, amount, mine).await,
        Command::Printchain => print_blockchain().await,
        Command::ReindexUtxo => reindex_utxo().await,
        Command::StartNode { miner, connect_nodes } => start_node(miner, connect_nodes).await,
    }
}

#[tokio::main]
async fn main() {
    initialize_logging();

    let opt = Opt::parse();

    if let Err(e) = process_command(opt.command).await {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
