//! Node-wide statics and the TCP accept loop (Bitcoin Core: net.cpp's `CConnman`).

use crate::error::Result;
use crate::mempool::{BlockInTransit, Mempool};
use crate::net::network::process_stream;
use crate::net::net_processing::send_known_nodes;
use crate::node::context::NodeContext;
use crate::node::peers::Nodes;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::net::{SocketAddr, TcpListener};
use std::str::FromStr;
use tracing::{error, info};

pub const NODE_VERSION: usize = 1;
pub const TCP_WRITE_TIMEOUT: u64 = 1000;
pub const TRANSACTION_THRESHOLD: usize = 2;

pub static CENTERAL_NODE: Lazy<SocketAddr> = Lazy::new(|| {
    env::var("CENTERAL_NODE")
        .unwrap_or_else(|_| "127.0.0.1:2001".to_string())
        .parse()
        .expect("CENTERAL_NODE environment variable is not a valid socket address")
});

pub static GLOBAL_NODES: Lazy<Nodes> = Lazy::new(|| {
    let nodes = Nodes::new();
    nodes.add_node(*CENTERAL_NODE).expect("node add error");
    nodes
});

pub static GLOBAL_MEMORY_POOL: Lazy<Mempool> = Lazy::new(Mempool::new);
pub static GLOBAL_BLOCKS_IN_TRANSIT: Lazy<BlockInTransit> = Lazy::new(BlockInTransit::new);

/// A node passed on the command line to connect to at startup: either the
/// central node itself, or a remote peer address.
#[derive(PartialEq, Eq, Hash, Debug)]
pub enum ConnectNode {
    Local,
    Remote(SocketAddr),
}

impl ConnectNode {
    pub fn is_remote(&self) -> bool {
        matches!(self, ConnectNode::Remote(_))
    }

    pub fn get_addr(&self) -> SocketAddr {
        match self {
            ConnectNode::Remote(addr) => *addr,
            ConnectNode::Local => *CENTERAL_NODE,
        }
    }
}

impl FromStr for ConnectNode {
    type Err = std::net::AddrParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s == "local" {
            Ok(ConnectNode::Local)
        } else {
            Ok(ConnectNode::Remote(s.parse()?))
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub enum OpType {
    Tx,
    Block,
}

#[derive(Debug, Serialize, Deserialize)]
pub enum MessageType {
    Error,
    Success,
    Info,
    Warning,
    Ack,
}

#[derive(Debug, Serialize, Deserialize)]
pub enum AdminNodeQueryType {
    GetBalance { wlt_address: String },
    GetAllTransactions,
    GetBlockHeight,
    MineEmptyBlock,
    ReindexUtxo,
}

#[derive(Debug, Serialize, Deserialize)]
pub enum Package {
    Block {
        addr_from: SocketAddr,
        block: Vec<u8>,
    },
    GetBlocks {
        addr_from: SocketAddr,
    },
    GetData {
        addr_from: SocketAddr,
        op_type: OpType,
        id: Vec<u8>,
    },
    Inv {
        addr_from: SocketAddr,
        op_type: OpType,
        items: Vec<Vec<u8>>,
    },
    Tx {
        addr_from: SocketAddr,
        transaction: Vec<u8>,
    },
    SendBitCoin {
        addr_from: SocketAddr,
        wlt_frm_addr: String,
        wlt_to_addr: String,
        amount: i64,
    },
    KnownNodes {
        addr_from: SocketAddr,
        nodes: Vec<SocketAddr>,
    },
    Version {
        addr_from: SocketAddr,
        version: usize,
        best_height: usize,
    },
    Message {
        addr_from: SocketAddr,
        message_type: MessageType,
        message: String,
    },
    AdminNodeQuery {
        addr_from: SocketAddr,
        query_type: AdminNodeQueryType,
    },
}

pub struct Server {
    context: NodeContext,
}

impl Server {
    pub fn new(context: NodeContext) -> Server {
        Server { context }
    }

    pub async fn run(&self, addrs: &SocketAddr, connect_nodes: HashSet<ConnectNode>) -> Result<()> {
        let listener = TcpListener::bind(addrs).expect("TcpListener bind error");

        if !addrs.eq(&CENTERAL_NODE) {
            let best_height = self.context.get_blockchain_height().await?;
            crate::net::net_processing::send_version(&CENTERAL_NODE, best_height).await;
        } else {
            info!("register with node {:?}", connect_nodes);
            let remote_nodes: HashSet<SocketAddr> = connect_nodes
                .iter()
                .filter(|node| node.is_remote())
                .map(|node| node.get_addr())
                .collect();

            GLOBAL_NODES.add_nodes(remote_nodes.clone())?;

            for remote_node in remote_nodes {
                send_known_nodes(
                    &remote_node,
                    GLOBAL_NODES
                        .get_nodes()?
                        .iter()
                        .map(|node| node.get_addr())
                        .collect(),
                )
                .await;
            }
        }

        for stream in listener.incoming() {
            let blockchain = self.context.blockchain().clone();
            match stream {
                Ok(stream) => {
                    tokio::spawn(async move {
                        if let Err(e) = process_stream(blockchain, stream).await {
                            error!("stream processing error: {}", e);
                        }
                    });
                }
                Err(e) => error!("accept error: {}", e),
            }
        }
        Ok(())
    }
}
