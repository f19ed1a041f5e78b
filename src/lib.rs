//! Card Ledger Library
//! # Overview
//!
//! This library provides a ledger core for moving funds between accounts
//! ("cards") with hard consistency guarantees: concurrent transfers can
//! never produce an inconsistent total balance, a double-spend, or a lost
//! update.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Account, TransferRecord, errors)
//! - [`cli`] - CLI arguments parsing for the simulation driver
//! - [`core`] - Business logic components:
//!   - [`core::store`] - Account rows with row-level locks and versioned writes
//!   - [`core::executor`] - The transfer execution protocol
//!   - [`core::accounts`] - Account lifecycle and the status state machine
//!   - [`core::transfer_log`] - Append-only transfer receipts
//!   - [`core::clock`] - Time seam for expiry checks and receipt stamps
//!
//! # Transfer Protocol
//!
//! A transfer validates fail-fast (amount, existence, status, ownership,
//! distinct accounts, funds), locks both account rows in ascending id
//! order, then debits, credits, and appends one receipt as a single
//! all-or-nothing unit. Lock acquisition is bounded by a timeout; a timeout
//! or a stale-version write is reported as a retryable
//! concurrent-modification failure, and no failure ever leaves partial
//! state behind.
//!
//! # Account States
//!
//! Accounts move through four states:
//! - `ACTIVE`: may send and receive transfers (the only such state)
//! - `BLOCKED`: administratively frozen; reversible
//! - `EXPIRED`: past its expiry date, applied lazily on read
//! - `DELETED`: terminal; hidden from all lookups

// Module declarations
pub mod cli;
pub mod core;
pub mod types;

pub use core::{
    AccountService, AccountStore, Clock, FixedClock, Page, SystemClock, TransferExecutor,
    TransferLog, DEFAULT_LOCK_TIMEOUT,
};
pub use types::{
    Account, AccountId, AccountStatus, ErrorKind, LedgerError, OwnerId, TransferId, TransferRecord,
};
