//! Account-related types for the card ledger
//!
//! This module defines the Account record, the account status state machine
//! states, and the identifier newtypes used throughout the system.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique account identifier
///
/// Accounts are keyed by UUID so that identifiers are opaque and stable for
/// the account's lifetime. `AccountId` is `Ord`: the store relies on the
/// ordering to acquire row locks deterministically.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AccountId(Uuid);

impl AccountId {
    /// Generate a new random account identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID value
    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AccountId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// Identifier of the user who owns an account
///
/// The core does not model users; it only compares the requesting identity
/// against the owner reference stored on the source account.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct OwnerId(Uuid);

impl OwnerId {
    /// Generate a new random owner identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID value
    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl Default for OwnerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of an account
///
/// `Active` is the only state in which an account may participate in a
/// transfer, on either side. `Deleted` is terminal: deleted accounts are
/// excluded from normal lookups and no further transitions are possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountStatus {
    /// Account is active and can send or receive transfers
    Active,

    /// Account is blocked; reversible by an administrative unblock
    Blocked,

    /// Account's expiry date has passed; applied lazily on read
    Expired,

    /// Account has been deleted; terminal, hidden from lookups
    Deleted,
}

impl AccountStatus {
    /// Status name as stored and displayed, e.g. `ACTIVE`
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "ACTIVE",
            AccountStatus::Blocked => "BLOCKED",
            AccountStatus::Expired => "EXPIRED",
            AccountStatus::Deleted => "DELETED",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One card/balance holder
///
/// Balance is a fixed-point decimal and is never negative. The version
/// counter strictly increases on every persisted mutation; a write against a
/// stale version is rejected by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier, stable for the account's lifetime
    pub id: AccountId,

    /// The single owner of this account
    pub owner: OwnerId,

    /// Current balance (fixed-point decimal, scale >= 2)
    pub balance: Decimal,

    /// Current status in the account state machine
    pub status: AccountStatus,

    /// Last four digits of the account number, kept for display
    ///
    /// Derived from the full number when the account is opened; the full
    /// number itself is not retained.
    pub last4: String,

    /// Expiry date; accounts past this date expire lazily on read
    pub expiry: NaiveDate,

    /// Optimistic-concurrency version, bumped on every persisted write
    pub version: u64,
}

impl Account {
    /// Create a new `Active` account record with version 0
    ///
    /// Input validation (non-negative balance, number shape) happens in the
    /// account service before this constructor is reached.
    pub fn open(
        id: AccountId,
        owner: OwnerId,
        last4: String,
        expiry: NaiveDate,
        balance: Decimal,
    ) -> Self {
        Account {
            id,
            owner,
            balance,
            status: AccountStatus::Active,
            last4,
            expiry,
            version: 0,
        }
    }

    /// Whether this account may participate in a transfer
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    /// Whether the expiry date lies strictly before `today`
    pub fn is_expired_as_of(&self, today: NaiveDate) -> bool {
        self.expiry < today
    }

    /// Masked display form of the account number, e.g. `**** **** **** 1234`
    pub fn masked_number(&self) -> String {
        format!("**** **** **** {}", self.last4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn sample_account() -> Account {
        Account::open(
            AccountId::new(),
            OwnerId::new(),
            "1234".to_string(),
            NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            dec!(100.00),
        )
    }

    #[test]
    fn test_open_defaults() {
        let account = sample_account();

        assert_eq!(account.status, AccountStatus::Active);
        assert_eq!(account.version, 0);
        assert_eq!(account.balance, dec!(100.00));
        assert!(account.is_active());
    }

    #[test]
    fn test_masked_number() {
        let account = sample_account();
        assert_eq!(account.masked_number(), "**** **** **** 1234");
    }

    #[rstest]
    #[case::day_before(NaiveDate::from_ymd_opt(2029, 12, 31).unwrap(), false)]
    #[case::on_expiry_day(NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(), false)]
    #[case::day_after(NaiveDate::from_ymd_opt(2030, 1, 2).unwrap(), true)]
    fn test_is_expired_as_of(#[case] today: NaiveDate, #[case] expired: bool) {
        let account = sample_account();
        assert_eq!(account.is_expired_as_of(today), expired);
    }

    #[rstest]
    #[case::active(AccountStatus::Active, "ACTIVE")]
    #[case::blocked(AccountStatus::Blocked, "BLOCKED")]
    #[case::expired(AccountStatus::Expired, "EXPIRED")]
    #[case::deleted(AccountStatus::Deleted, "DELETED")]
    fn test_status_display(#[case] status: AccountStatus, #[case] expected: &str) {
        assert_eq!(status.to_string(), expected);
    }

    #[test]
    fn test_account_id_roundtrip() {
        let id = AccountId::new();
        let parsed: AccountId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_only_active_participates() {
        let mut account = sample_account();
        for status in [
            AccountStatus::Blocked,
            AccountStatus::Expired,
            AccountStatus::Deleted,
        ] {
            account.status = status;
            assert!(!account.is_active());
        }
    }
}
