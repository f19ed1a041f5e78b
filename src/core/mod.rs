//! Core business logic module
//!
//! This module contains the ledger's core components:
//! - `clock` - the time seam used for expiry checks and receipt stamps
//! - `store` - account rows, row-level locking, version-checked persistence
//! - `transfer_log` - append-only transfer receipts
//! - `executor` - the transfer execution protocol
//! - `accounts` - account lifecycle and the status state machine

pub mod accounts;
pub mod clock;
pub mod executor;
pub mod store;
pub mod transfer_log;

pub use accounts::AccountService;
pub use clock::{Clock, FixedClock, SystemClock};
pub use executor::TransferExecutor;
pub use store::{AccountStore, Page, PairGuard, DEFAULT_LOCK_TIMEOUT};
pub use transfer_log::TransferLog;
