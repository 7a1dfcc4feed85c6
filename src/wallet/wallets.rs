//! On-disk wallet collection, keyed by address.
//!
//! Persisted as a bincode-encoded map at `./tmp/wallets.data`. Saves take an
//! exclusive-create advisory lock at `./tmp/wallets.LOCK` so two processes
//! sharing a data directory can't interleave writes.

use super::wallet::Wallet;
use crate::error::{BtcError, Result};
use std::collections::HashMap;
use std::env;
use std::env::current_dir;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::PathBuf;

pub const DEFAULT_WALLET_FILE: &str = "./tmp/wallets.data";
pub const WALLET_LOCK_FILE: &str = "./tmp/wallets.LOCK";

pub struct Wallets {
    wallets: HashMap<String, Wallet>,
}

impl Wallets {
    pub fn new() -> Result<Wallets> {
        let mut wallets = Wallets {
            wallets: HashMap::new(),
        };
        wallets.load_from_file()?;
        Ok(wallets)
    }

    pub fn create_wallet(&mut self) -> Result<String> {
        let wallet = Wallet::new()?;
        let address = wallet.get_address()?;
        self.wallets.insert(address.clone(), wallet);
        self.save_to_file()?;
        Ok(address)
    }

    pub fn get_addresses(&self) -> Vec<String> {
        self.wallets.keys().cloned().collect()
    }

    pub fn get_wallet(&self, address: &str) -> Option<&Wallet> {
        self.wallets.get(address)
    }

    pub fn load_from_file(&mut self) -> Result<()> {
        let path = self.wallet_file_path()?;
        if !path.exists() {
            return Ok(());
        }
        let mut file = File::open(&path).map_err(|e| BtcError::WalletsFileOpenError(e.to_string()))?;
        let metadata = file
            .metadata()
            .map_err(|e| BtcError::WalletsFileMetadataError(e.to_string()))?;
        let mut buf = vec![0; metadata.len() as usize];
        file.read_exact(&mut buf)
            .map_err(|e| BtcError::WalletsFileReadError(e.to_string()))?;
        let wallets = bincode::serde::decode_from_slice(&buf, bincode::config::standard())
            .map_err(|e| BtcError::WalletsDeserializationError(e.to_string()))?
            .0;
        self.wallets = wallets;
        Ok(())
    }

    fn save_to_file(&self) -> Result<()> {
        let path = self.wallet_file_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| BtcError::SavingWalletsError(e.to_string()))?;
        }
        let _lock = WalletLock::acquire(self.lock_file_path()?)?;
        let wallets_bytes = bincode::serde::encode_to_vec(&self.wallets, bincode::config::standard())
            .map_err(|e| BtcError::WalletsSerializationError(e.to_string()))?;
        let mut file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&path)
            .map_err(|e| BtcError::SavingWalletsError(e.to_string()))?;
        file.write_all(&wallets_bytes)
            .map_err(|e| BtcError::SavingWalletsError(e.to_string()))?;
        file.flush().map_err(|e| BtcError::SavingWalletsError(e.to_string()))
    }

    fn wallet_file_path(&self) -> Result<PathBuf> {
        let configured = env::var("WALLET_FILE").unwrap_or_else(|_| DEFAULT_WALLET_FILE.to_string());
        Ok(current_dir()
            .map_err(|e| BtcError::WalletsFilePathError(e.to_string()))?
            .join(configured))
    }

    fn lock_file_path(&self) -> Result<PathBuf> {
        let wallet_path = self.wallet_file_path()?;
        Ok(match wallet_path.parent() {
            Some(parent) => parent.join("wallets.LOCK"),
            None => PathBuf::from(WALLET_LOCK_FILE),
        })
    }
}

/// Holds the advisory lock file open for its lifetime and removes it on drop.
struct WalletLock {
    path: PathBuf,
}

impl WalletLock {
    fn acquire(path: PathBuf) -> Result<WalletLock> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| BtcError::SavingWalletsError(e.to_string()))?;
        }
        OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&path)
            .map_err(|e| BtcError::SavingWalletsError(format!("wallets file locked: {e}")))?;
        Ok(WalletLock { path })
    }
}

impl Drop for WalletLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_GUARD: Mutex<()> = Mutex::new(());

    fn with_temp_wallet_file<F: FnOnce()>(f: F) {
        let _guard = ENV_GUARD.lock().unwrap();
        let dir = std::env::temp_dir().join(format!("wallets_test_{}", std::process::id()));
        let file = dir.join("wallets.data");
        let lock = dir.join("wallets.LOCK");
        let _ = fs::remove_file(&file);
        let _ = fs::remove_file(&lock);
        unsafe {
            env::set_var("WALLET_FILE", file.to_str().unwrap());
        }
        f();
        let _ = fs::remove_file(&file);
        let _ = fs::remove_file(&lock);
        let _ = fs::remove_dir(&dir);
        unsafe {
            env::remove_var("WALLET_FILE");
        }
    }

    #[test]
    fn create_wallet_persists_across_reload() {
        with_temp_wallet_file(|| {
            let address = {
                let mut wallets = Wallets::new().unwrap();
                wallets.create_wallet().unwrap()
            };
            let reloaded = Wallets::new().unwrap();
            assert!(reloaded.get_wallet(&address).is_some());
        });
    }

    #[test]
    fn unknown_address_returns_none() {
        with_temp_wallet_file(|| {
            let wallets = Wallets::new().unwrap();
            assert!(wallets.get_wallet("nonexistent").is_none());
        });
    }
}
