//! Transfer receipt types for the card ledger
//!
//! A transfer record is the immutable receipt of a completed balance
//! movement. Records are created exactly once, atomically with the two
//! balance writes they describe, and are never mutated afterwards.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::account::AccountId;

/// Unique transfer identifier
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TransferId(Uuid);

impl TransferId {
    /// Generate a new random transfer identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID value
    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl Default for TransferId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TransferId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// Immutable receipt of a completed transfer
///
/// Invariants: `amount` is strictly positive and `from_account` differs from
/// `to_account`; both are enforced by the executor before the record is
/// created. The sum of all record amounts touching an account reconciles
/// with that account's balance deltas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRecord {
    /// Unique identifier of this transfer
    pub id: TransferId,

    /// Account the amount was debited from
    pub from_account: AccountId,

    /// Account the amount was credited to
    pub to_account: AccountId,

    /// Transferred amount (always positive)
    pub amount: Decimal,

    /// Server-side creation timestamp, set once and never updated
    pub created_at: DateTime<Utc>,
}

impl TransferRecord {
    /// Create a receipt with a fresh id and the given creation time
    pub fn new(
        from_account: AccountId,
        to_account: AccountId,
        amount: Decimal,
        created_at: DateTime<Utc>,
    ) -> Self {
        TransferRecord {
            id: TransferId::new(),
            from_account,
            to_account,
            amount,
            created_at,
        }
    }

    /// Whether this record credits or debits the given account
    pub fn touches(&self, account: AccountId) -> bool {
        self.from_account == account || self.to_account == account
    }

    /// Signed balance effect of this record on the given account
    ///
    /// Negative for the source, positive for the destination, zero for
    /// accounts the record does not touch.
    pub fn delta_for(&self, account: AccountId) -> Decimal {
        if self.from_account == account {
            -self.amount
        } else if self.to_account == account {
            self.amount
        } else {
            Decimal::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn sample_record(from: AccountId, to: AccountId) -> TransferRecord {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        TransferRecord::new(from, to, dec!(25.00), at)
    }

    #[test]
    fn test_touches_both_sides() {
        let from = AccountId::new();
        let to = AccountId::new();
        let other = AccountId::new();
        let record = sample_record(from, to);

        assert!(record.touches(from));
        assert!(record.touches(to));
        assert!(!record.touches(other));
    }

    #[test]
    fn test_delta_signs() {
        let from = AccountId::new();
        let to = AccountId::new();
        let record = sample_record(from, to);

        assert_eq!(record.delta_for(from), dec!(-25.00));
        assert_eq!(record.delta_for(to), dec!(25.00));
        assert_eq!(record.delta_for(AccountId::new()), Decimal::ZERO);
    }

    #[test]
    fn test_fresh_ids_are_unique() {
        let from = AccountId::new();
        let to = AccountId::new();
        let a = sample_record(from, to);
        let b = sample_record(from, to);
        assert_ne!(a.id, b.id);
    }
}
