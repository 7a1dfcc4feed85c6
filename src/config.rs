//! Process-wide node configuration: listen address, node id, and whether
//! this process mines blocks.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::RwLock;

pub static GLOBAL_CONFIG: Lazy<Config> = Lazy::new(Config::new);

static DEFAULT_NODE_ADDR: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 2001);

const NODE_ADDRESS_KEY: &str = "NODE_ADDRESS";
const MINING_ADDRESS_KEY: &str = "MINING_ADDRESS";

pub struct Config {
    node_addresses: RwLock<HashMap<String, SocketAddr>>,
    miner_addresses: RwLock<HashMap<String, String>>,
}

impl Config {
    pub fn new() -> Config {
        let mut map = HashMap::new();
        map.insert(String::from(NODE_ADDRESS_KEY), Config::get_server_addr_port());

        let mut miners = HashMap::new();
        if let Ok(addr) = env::var("MINING_ADDRESS") {
            miners.insert(String::from(MINING_ADDRESS_KEY), addr);
        }

        Config {
            node_addresses: RwLock::new(map),
            miner_addresses: RwLock::new(miners),
        }
    }

    /// `NODE_ID` is required by every entry point that touches chain storage:
    /// it namespaces the on-disk sled directory so multiple local nodes don't
    /// collide.
    pub fn node_id(&self) -> crate::error::Result<String> {
        env::var("NODE_ID").map_err(|_| {
            crate::error::BtcError::NodeConfigError("NODE_ID environment variable not set".to_string())
        })
    }

    pub fn get_node_addr(&self) -> SocketAddr {
        let node_addresses = self.node_addresses.read().unwrap();
        *node_addresses.get(NODE_ADDRESS_KEY).unwrap()
    }

    pub fn set_mining_addr(&self, addr: &str) {
        let mut miners = self.miner_addresses.write().unwrap();
        miners.insert(String::from(MINING_ADDRESS_KEY), addr.to_string());
    }

    pub fn get_mining_addr(&self) -> Option<String> {
        let miners = self.miner_addresses.read().unwrap();
        miners.get(MINING_ADDRESS_KEY).cloned()
    }

    pub fn is_miner(&self) -> bool {
        let miners = self.miner_addresses.read().unwrap();
        miners.contains_key(MINING_ADDRESS_KEY)
    }

    pub fn get_server_addr_port() -> SocketAddr {
        env::var("NODE_ADDR")
            .ok()
            .and_then(|node| node.parse().ok())
            .unwrap_or(DEFAULT_NODE_ADDR)
    }

    /// `./tmp/blocks_<NODE_ID>/` chain store directory.
    pub fn blocks_dir(&self) -> crate::error::Result<String> {
        Ok(format!("./tmp/blocks_{}/", self.node_id()?))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
