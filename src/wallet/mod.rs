pub mod wallet;
pub mod wallets;

pub use wallet::{ADDRESS_CHECK_SUM_LEN, Wallet, VERSION, convert_address, validate_address};
pub use wallets::{WALLET_LOCK_FILE, Wallets};
