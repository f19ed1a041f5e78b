//! Transfer execution protocol
//!
//! This module provides the `TransferExecutor`, which carries one transfer
//! request end-to-end: validation, lock acquisition, balance mutation, and
//! receipt creation, as a single all-or-nothing unit.
//!
//! The validation sequence is fail-fast and its order is part of the
//! observable contract: existence before status, status before ownership,
//! ownership before the amount-specific checks. Every failure is reported
//! before any mutation; a failed invocation leaves both balances and the
//! transfer log untouched.
//!
//! Both row locks are taken before any balance is read, in ascending id
//! order (see [`AccountStore::lock_pair`]), so the funds check and the
//! mutation that follows are race-free: two concurrent transfers cannot
//! both pass the check against the same pre-decrement balance.

use crate::core::clock::Clock;
use crate::core::store::AccountStore;
use crate::core::transfer_log::TransferLog;
use crate::types::{AccountId, AccountStatus, LedgerError, OwnerId, TransferRecord};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info};

/// Executes transfer requests against the account store
///
/// The executor is cheap to clone and safe to share across tasks: every
/// invocation runs to completion or failure as an isolated unit against the
/// shared store.
#[derive(Clone)]
pub struct TransferExecutor {
    /// Durable account rows and their locks
    store: Arc<AccountStore>,

    /// Append-only receipt log
    log: Arc<TransferLog>,

    /// Source of receipt timestamps
    clock: Arc<dyn Clock>,
}

impl TransferExecutor {
    /// Create an executor over the given store, log, and clock
    pub fn new(store: Arc<AccountStore>, log: Arc<TransferLog>, clock: Arc<dyn Clock>) -> Self {
        TransferExecutor { store, log, clock }
    }

    /// Move `amount` from `source` to `dest` on behalf of `requester`
    ///
    /// Validation sequence, first violation wins:
    /// 1. `amount` must be strictly positive
    /// 2. both accounts must exist and not be deleted
    /// 3. both accounts must be active
    /// 4. `requester` must own the source account
    /// 5. `source` must differ from `dest`
    /// 6. the source balance must cover `amount`
    ///
    /// On success both balances are updated and persisted (each write bumps
    /// that account's version) and one receipt is appended to the log,
    /// all under both row locks; the persisted receipt is returned.
    ///
    /// # Errors
    ///
    /// One [`LedgerError`] per validation step as listed above, plus
    /// [`LedgerError::LockTimeout`] when a row lock cannot be acquired in
    /// time. Only concurrent-modification failures are retryable; no
    /// failure leaves partial state behind.
    pub async fn execute(
        &self,
        source: AccountId,
        dest: AccountId,
        amount: Decimal,
        requester: OwnerId,
    ) -> Result<TransferRecord, LedgerError> {
        debug!(%source, %dest, %amount, "executing transfer");

        if amount <= Decimal::ZERO {
            return Err(LedgerError::non_positive_amount(amount));
        }

        // Existence is pre-checked source-first so the reported id does not
        // depend on lock order; rows are never removed, so the check stays
        // valid until the locks are held.
        if !self.store.contains(source) {
            return Err(LedgerError::account_not_found(source));
        }
        if !self.store.contains(dest) {
            return Err(LedgerError::account_not_found(dest));
        }

        // Sole blocking point: both rows, ascending id order.
        let mut pair = self.store.lock_pair(source, dest).await?;

        // Deleted accounts are invisible: report them like missing rows.
        if pair.source().status == AccountStatus::Deleted {
            return Err(LedgerError::account_not_found(source));
        }
        if pair.dest().status == AccountStatus::Deleted {
            return Err(LedgerError::account_not_found(dest));
        }

        if !pair.source().is_active() {
            return Err(LedgerError::account_not_active(source, pair.source().status));
        }
        if !pair.dest().is_active() {
            return Err(LedgerError::account_not_active(dest, pair.dest().status));
        }

        if pair.source().owner != requester {
            return Err(LedgerError::not_account_owner(source));
        }

        if source == dest {
            return Err(LedgerError::same_account(source));
        }

        if pair.source().balance < amount {
            return Err(LedgerError::insufficient_funds(
                source,
                pair.source().balance,
                amount,
            ));
        }

        // All checks passed; debit and credit on copies, then commit both
        // sides and the receipt while still holding both locks.
        let mut debited = pair.source().clone();
        debited.balance = debited
            .balance
            .checked_sub(amount)
            .ok_or_else(|| LedgerError::balance_overflow(source))?;

        let mut credited = pair.dest().clone();
        credited.balance = credited
            .balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::balance_overflow(dest))?;

        pair.commit(debited, credited)?;

        let record = TransferRecord::new(source, dest, amount, self.clock.now());
        let record = self.log.append(record)?;

        info!(
            transfer = %record.id,
            from = %source,
            to = %dest,
            %amount,
            "transfer committed"
        );
        Ok(record)
    }
}
