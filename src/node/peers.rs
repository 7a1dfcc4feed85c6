//! Tracks the set of peer addresses this node knows about.

use crate::error::{BtcError, Result};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::RwLock;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Node {
    addr: SocketAddr,
}

impl Node {
    fn new(addr: SocketAddr) -> Node {
        Node { addr }
    }

    pub fn get_addr(&self) -> SocketAddr {
        self.addr
    }
}

pub struct Nodes {
    inner: RwLock<HashSet<Node>>,
}

impl Nodes {
    pub fn new() -> Nodes {
        Nodes {
            inner: RwLock::new(HashSet::new()),
        }
    }

    pub fn add_node(&self, addr: SocketAddr) -> Result<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| BtcError::NodesInnerPoisonedLockError(e.to_string()))?;
        inner.insert(Node::new(addr));
        Ok(())
    }

    pub fn add_nodes(&self, nodes: HashSet<SocketAddr>) -> Result<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| BtcError::NodesInnerPoisonedLockError(e.to_string()))?;
        for node in nodes {
            inner.insert(Node::new(node));
        }
        Ok(())
    }

    pub fn evict_node(&self, addr: &SocketAddr) -> Result<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| BtcError::NodesInnerPoisonedLockError(e.to_string()))?;
        inner.remove(&Node::new(*addr));
        Ok(())
    }

    pub fn first(&self) -> Result<Option<Node>> {
        let inner = self
            .inner
            .read()
            .map_err(|e| BtcError::NodesInnerPoisonedLockError(e.to_string()))?;
        Ok(inner.iter().next().copied())
    }

    pub fn get_nodes(&self) -> Result<Vec<Node>> {
        let inner = self
            .inner
            .read()
            .map_err(|e| BtcError::NodesInnerPoisonedLockError(e.to_string()))?;
        Ok(inner.iter().copied().collect())
    }

    pub fn len(&self) -> Result<usize> {
        let inner = self
            .inner
            .read()
            .map_err(|e| BtcError::NodesInnerPoisonedLockError(e.to_string()))?;
        Ok(inner.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn node_is_known(&self, addr: &SocketAddr) -> Result<bool> {
        let inner = self
            .inner
            .read()
            .map_err(|e| BtcError::NodesInnerPoisonedLockError(e.to_string()))?;
        Ok(inner.iter().any(|x| x.get_addr().eq(addr)))
    }
}

impl Default for Nodes {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn add_and_evict_round_trips() {
        let nodes = Nodes::new();
        let addr = SocketAddr::from_str("127.0.0.1:3000").unwrap();
        nodes.add_node(addr).unwrap();
        assert!(nodes.node_is_known(&addr).unwrap());
        assert_eq!(nodes.len().unwrap(), 1);
        nodes.evict_node(&addr).unwrap();
        assert!(!nodes.node_is_known(&addr).unwrap());
        assert!(nodes.is_empty().unwrap());
    }

    #[test]
    fn add_nodes_dedups_by_address() {
        let nodes = Nodes::new();
        let addr = SocketAddr::from_str("127.0.0.1:3001").unwrap();
        let mut set = HashSet::new();
        set.insert(addr);
        set.insert(addr);
        nodes.add_nodes(set).unwrap();
        assert_eq!(nodes.len().unwrap(), 1);
    }
}
