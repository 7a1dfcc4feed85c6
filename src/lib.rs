pub mod error;
pub use error::{BtcError, Result};

pub mod crypto;

mod util;
pub use util::current_timestamp;

mod config;
pub use config::{Config, GLOBAL_CONFIG};

pub mod proof_of_work;
pub mod block;
pub mod transaction;
pub mod mempool;
pub mod chain;
pub mod wallet;
pub mod net;
pub mod node;

pub use block::Block;
pub use chain::{BlockchainService, UTXOSet};
pub use transaction::Transaction;
pub use wallet::{Wallet, Wallets, convert_address, validate_address};
pub use node::{ConnectNode, NodeContext, Server};

pub mod web;
// Not re-exported at the crate root: web types are reached through `web::`
// explicitly so it's always clear which layer a given type belongs to.

#[cfg(test)]
mod test_utils {
    use std::sync::Once;
    use tracing::info;

    static INIT: Once = Once::new();

    pub fn setup_test_environment() {
        INIT.call_once(|| {
            unsafe {
                std::env::set_var("RUST_TEST_THREADS", "1");
            }
            cleanup_existing_test_directories();
        });
        cleanup_existing_test_directories();
    }

    pub fn teardown_test_environment() {
        cleanup_existing_test_directories();
    }

    fn cleanup_existing_test_directories() {
        use std::path::Path;

        let current_dir = std::env::current_dir().unwrap_or_else(|_| Path::new(".").to_path_buf());
        if let Ok(entries) = std::fs::read_dir(current_dir) {
            for entry in entries.filter_map(|e| e.ok()) {
                let path = entry.path();
                if let Some(name) = path.file_name() {
                    let name_str = name.to_string_lossy();
                    if name_str.starts_with("test_") {
                        info!("cleaning up test directory: {}", name_str);
                        let _ = std::fs::remove_dir_all(&path);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(unused_imports)]
use test_utils::{setup_test_environment, teardown_test_environment};
