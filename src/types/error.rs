//! Error types for the card ledger
//!
//! This module defines all failures the ledger core can report. Every
//! variant carries enough context to diagnose the failure, and every
//! variant maps onto a stable [`ErrorKind`] so that callers can tell
//! retry-safe failures apart from permanent ones without matching on
//! concrete variants.
//!
//! # Error Categories
//!
//! - **Not-found**: unknown or deleted account, unknown transfer record
//! - **Invalid-operation**: non-positive amount, self-transfer, bad opening
//!   request
//! - **Precondition-failed**: participant not active, forbidden status
//!   transition
//! - **Authorization-failed**: requester does not own the source account
//! - **Insufficient-funds**: source balance below the requested amount
//! - **Concurrent-modification**: stale version or lock timeout; transient
//!   and safe to retry from scratch
//! - **Internal**: storage faults and arithmetic overflow

use rust_decimal::Decimal;
use thiserror::Error;

use super::account::{AccountId, AccountStatus};
use super::transfer::TransferId;

/// Main error type for the card ledger
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// Account id does not resolve, or resolves to a deleted account
    #[error("Account {id} not found")]
    AccountNotFound {
        /// The account id that did not resolve
        id: AccountId,
    },

    /// Transfer record id does not resolve
    #[error("Transfer {id} not found")]
    TransferNotFound {
        /// The transfer id that did not resolve
        id: TransferId,
    },

    /// Transfer amount was zero or negative
    #[error("Transfer amount must be greater than zero, got {amount}")]
    NonPositiveAmount {
        /// The rejected amount
        amount: Decimal,
    },

    /// Source and destination name the same account
    #[error("Cannot transfer to the same account {id}")]
    SameAccount {
        /// The account named on both sides
        id: AccountId,
    },

    /// A transfer participant is not in the `ACTIVE` state
    #[error("Both accounts must be active: account {id} is {status}")]
    AccountNotActive {
        /// The offending account
        id: AccountId,
        /// Its current status
        status: AccountStatus,
    },

    /// The requesting identity does not own the source account
    #[error("Transfers may only be made from the requester's own account, and {id} is not theirs")]
    NotAccountOwner {
        /// The source account the requester does not own
        id: AccountId,
    },

    /// Source balance is below the requested amount
    #[error("Insufficient funds on account {id}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        /// The source account
        id: AccountId,
        /// Balance at the time of the check
        balance: Decimal,
        /// Requested transfer amount
        requested: Decimal,
    },

    /// The status state machine forbids the requested transition
    #[error("Account {id} cannot change status from {from} to {to}")]
    InvalidStatusTransition {
        /// The account whose status was to change
        id: AccountId,
        /// Status before the request
        from: AccountStatus,
        /// Requested target status
        to: AccountStatus,
    },

    /// Account number submitted at opening does not end in four digits
    #[error("Account number must end in at least four digits")]
    InvalidAccountNumber,

    /// Opening balance submitted at opening was negative
    #[error("Opening balance must not be negative, got {amount}")]
    NegativeOpeningBalance {
        /// The rejected opening balance
        amount: Decimal,
    },

    /// A write targeted a version that is no longer current
    ///
    /// Transient: the caller may re-read and retry the whole operation.
    #[error("Stale write to account {id}: expected version {expected}, found {found}")]
    VersionConflict {
        /// The account the write targeted
        id: AccountId,
        /// Version the writer had read
        expected: u64,
        /// Version actually stored
        found: u64,
    },

    /// Exclusive row lock could not be acquired within the timeout
    ///
    /// Transient: no state was touched, the whole operation may be retried.
    #[error("Timed out waiting for the lock on account {id}")]
    LockTimeout {
        /// The contended account
        id: AccountId,
    },

    /// Balance arithmetic would overflow
    #[error("Balance overflow on account {id}")]
    BalanceOverflow {
        /// The account whose balance update overflowed
        id: AccountId,
    },

    /// Unexpected failure in the persistence layer
    #[error("Storage failure: {message}")]
    Storage {
        /// Description of the storage fault
        message: String,
    },
}

/// Stable classification of [`LedgerError`] variants
///
/// The kind, not the concrete variant, is the contract with callers: each
/// kind keeps a distinct, stable meaning so client code can decide whether
/// to retry, surface, or reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Id does not resolve (includes deleted accounts)
    NotFound,
    /// The request itself is malformed
    InvalidOperation,
    /// The accounts involved are not in a state that permits the operation
    PreconditionFailed,
    /// The requester is not allowed to perform the operation
    AuthorizationFailed,
    /// The source balance cannot cover the amount
    InsufficientFunds,
    /// Transient conflict with a concurrent writer; retry from scratch
    ConcurrentModification,
    /// Unexpected internal failure
    Internal,
}

impl LedgerError {
    /// The stable kind this error belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::AccountNotFound { .. } | LedgerError::TransferNotFound { .. } => {
                ErrorKind::NotFound
            }
            LedgerError::NonPositiveAmount { .. }
            | LedgerError::SameAccount { .. }
            | LedgerError::InvalidAccountNumber
            | LedgerError::NegativeOpeningBalance { .. } => ErrorKind::InvalidOperation,
            LedgerError::AccountNotActive { .. }
            | LedgerError::InvalidStatusTransition { .. } => ErrorKind::PreconditionFailed,
            LedgerError::NotAccountOwner { .. } => ErrorKind::AuthorizationFailed,
            LedgerError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            LedgerError::VersionConflict { .. } | LedgerError::LockTimeout { .. } => {
                ErrorKind::ConcurrentModification
            }
            LedgerError::BalanceOverflow { .. } | LedgerError::Storage { .. } => {
                ErrorKind::Internal
            }
        }
    }

    /// Whether the caller may safely retry the whole operation
    ///
    /// True exactly for concurrent-modification failures: nothing was
    /// committed, and the conflict is expected to clear.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::ConcurrentModification
    }
}

// Helper functions for creating common errors

impl LedgerError {
    /// Create an AccountNotFound error
    pub fn account_not_found(id: AccountId) -> Self {
        LedgerError::AccountNotFound { id }
    }

    /// Create a TransferNotFound error
    pub fn transfer_not_found(id: TransferId) -> Self {
        LedgerError::TransferNotFound { id }
    }

    /// Create a NonPositiveAmount error
    pub fn non_positive_amount(amount: Decimal) -> Self {
        LedgerError::NonPositiveAmount { amount }
    }

    /// Create a SameAccount error
    pub fn same_account(id: AccountId) -> Self {
        LedgerError::SameAccount { id }
    }

    /// Create an AccountNotActive error
    pub fn account_not_active(id: AccountId, status: AccountStatus) -> Self {
        LedgerError::AccountNotActive { id, status }
    }

    /// Create a NotAccountOwner error
    pub fn not_account_owner(id: AccountId) -> Self {
        LedgerError::NotAccountOwner { id }
    }

    /// Create an InsufficientFunds error
    pub fn insufficient_funds(id: AccountId, balance: Decimal, requested: Decimal) -> Self {
        LedgerError::InsufficientFunds {
            id,
            balance,
            requested,
        }
    }

    /// Create an InvalidStatusTransition error
    pub fn invalid_status_transition(
        id: AccountId,
        from: AccountStatus,
        to: AccountStatus,
    ) -> Self {
        LedgerError::InvalidStatusTransition { id, from, to }
    }

    /// Create a VersionConflict error
    pub fn version_conflict(id: AccountId, expected: u64, found: u64) -> Self {
        LedgerError::VersionConflict {
            id,
            expected,
            found,
        }
    }

    /// Create a LockTimeout error
    pub fn lock_timeout(id: AccountId) -> Self {
        LedgerError::LockTimeout { id }
    }

    /// Create a BalanceOverflow error
    pub fn balance_overflow(id: AccountId) -> Self {
        LedgerError::BalanceOverflow { id }
    }

    /// Create a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        LedgerError::Storage {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn id_from(n: u128) -> AccountId {
        format!("00000000-0000-0000-0000-{:012x}", n).parse().unwrap()
    }

    #[rstest]
    #[case::non_positive(
        LedgerError::non_positive_amount(dec!(-1.00)),
        "Transfer amount must be greater than zero, got -1.00"
    )]
    #[case::not_active(
        LedgerError::account_not_active(id_from(1), AccountStatus::Blocked),
        "Both accounts must be active: account 00000000-0000-0000-0000-000000000001 is BLOCKED"
    )]
    #[case::insufficient(
        LedgerError::insufficient_funds(id_from(2), dec!(10.00), dec!(25.00)),
        "Insufficient funds on account 00000000-0000-0000-0000-000000000002: balance 10.00, requested 25.00"
    )]
    #[case::version_conflict(
        LedgerError::version_conflict(id_from(3), 4, 5),
        "Stale write to account 00000000-0000-0000-0000-000000000003: expected version 4, found 5"
    )]
    #[case::lock_timeout(
        LedgerError::lock_timeout(id_from(4)),
        "Timed out waiting for the lock on account 00000000-0000-0000-0000-000000000004"
    )]
    #[case::not_found(
        LedgerError::account_not_found(id_from(5)),
        "Account 00000000-0000-0000-0000-000000000005 not found"
    )]
    fn test_error_display(#[case] error: LedgerError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    #[case::not_found(LedgerError::account_not_found(id_from(1)), ErrorKind::NotFound)]
    #[case::amount(LedgerError::non_positive_amount(dec!(0)), ErrorKind::InvalidOperation)]
    #[case::same(LedgerError::same_account(id_from(1)), ErrorKind::InvalidOperation)]
    #[case::not_active(
        LedgerError::account_not_active(id_from(1), AccountStatus::Expired),
        ErrorKind::PreconditionFailed
    )]
    #[case::owner(LedgerError::not_account_owner(id_from(1)), ErrorKind::AuthorizationFailed)]
    #[case::funds(
        LedgerError::insufficient_funds(id_from(1), dec!(1), dec!(2)),
        ErrorKind::InsufficientFunds
    )]
    #[case::stale(LedgerError::version_conflict(id_from(1), 1, 2), ErrorKind::ConcurrentModification)]
    #[case::contended(LedgerError::lock_timeout(id_from(1)), ErrorKind::ConcurrentModification)]
    #[case::storage(LedgerError::storage("disk"), ErrorKind::Internal)]
    fn test_error_kinds(#[case] error: LedgerError, #[case] kind: ErrorKind) {
        assert_eq!(error.kind(), kind);
    }

    #[test]
    fn test_only_concurrent_modification_is_retryable() {
        assert!(LedgerError::lock_timeout(id_from(1)).is_retryable());
        assert!(LedgerError::version_conflict(id_from(1), 0, 1).is_retryable());

        assert!(!LedgerError::account_not_found(id_from(1)).is_retryable());
        assert!(!LedgerError::insufficient_funds(id_from(1), dec!(0), dec!(1)).is_retryable());
        assert!(!LedgerError::not_account_owner(id_from(1)).is_retryable());
    }
}
