//! Account lifecycle service
//!
//! This module provides the `AccountService`, which owns everything about
//! an account except moving money: opening, the status state machine
//! (block/activate/delete), the lazy expiry read, and the listing queries.
//!
//! Deleted accounts are invisible here: every lookup reports them as
//! not-found, and no transition leads out of `Deleted`.

use crate::core::clock::Clock;
use crate::core::store::{AccountStore, Page};
use crate::types::{Account, AccountId, AccountStatus, LedgerError, OwnerId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info};

/// Manages account lifecycle and status transitions
#[derive(Clone)]
pub struct AccountService {
    /// Durable account rows
    store: Arc<AccountStore>,

    /// Source of "today" for expiry checks
    clock: Arc<dyn Clock>,
}

impl AccountService {
    /// Create a service over the given store and clock
    pub fn new(store: Arc<AccountStore>, clock: Arc<dyn Clock>) -> Self {
        AccountService { store, clock }
    }

    /// Open a new account
    ///
    /// Derives the last-four display fragment from the digits of `number`
    /// (the full number is not retained), assigns a fresh id, and persists
    /// the account as `ACTIVE` at version 0.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidAccountNumber`] if `number` carries fewer
    ///   than four digits
    /// - [`LedgerError::NegativeOpeningBalance`] if `opening_balance < 0`
    pub fn open(
        &self,
        owner: OwnerId,
        number: &str,
        expiry: NaiveDate,
        opening_balance: Decimal,
    ) -> Result<Account, LedgerError> {
        let digits: String = number.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.len() < 4 {
            return Err(LedgerError::InvalidAccountNumber);
        }
        if opening_balance < Decimal::ZERO {
            return Err(LedgerError::NegativeOpeningBalance {
                amount: opening_balance,
            });
        }

        let last4 = digits[digits.len() - 4..].to_string();
        let account = Account::open(AccountId::new(), owner, last4, expiry, opening_balance);
        let account = self.store.create(account)?;

        info!(account = %account.id, owner = %owner, "account opened");
        Ok(account)
    }

    /// Fetch an account, hiding deleted rows behind not-found
    pub async fn get(&self, id: AccountId) -> Result<Account, LedgerError> {
        let account = self.store.fetch(id).await?;
        if account.status == AccountStatus::Deleted {
            return Err(LedgerError::account_not_found(id));
        }
        Ok(account)
    }

    /// Fetch an account for display, applying any due expiry transition
    ///
    /// This is a side-effecting read: if the account's expiry date lies
    /// strictly before today and it is not already `EXPIRED`, it is
    /// transitioned and persisted before being returned. The persisted
    /// write is version-checked; a conflicting concurrent writer surfaces
    /// as a retryable concurrent-modification failure.
    pub async fn get_current(&self, id: AccountId) -> Result<Account, LedgerError> {
        let account = self.get(id).await?;
        if account.status != AccountStatus::Expired
            && account.is_expired_as_of(self.clock.today())
        {
            debug!(account = %id, expiry = %account.expiry, "expiring account on read");
            let mut expired = account;
            expired.status = AccountStatus::Expired;
            return self.store.save(expired).await;
        }
        Ok(account)
    }

    /// Block an account
    ///
    /// `ACTIVE → BLOCKED`; calling on an already blocked account is a
    /// no-op. Expired accounts cannot be blocked.
    pub async fn block(&self, id: AccountId) -> Result<Account, LedgerError> {
        let account = self.get(id).await?;
        match account.status {
            AccountStatus::Blocked => Ok(account),
            AccountStatus::Active => {
                let saved = self.set_status(account, AccountStatus::Blocked).await?;
                info!(account = %id, "account blocked");
                Ok(saved)
            }
            from => Err(LedgerError::invalid_status_transition(
                id,
                from,
                AccountStatus::Blocked,
            )),
        }
    }

    /// Unblock an account
    ///
    /// `BLOCKED → ACTIVE`; calling on an already active account is a
    /// no-op. Expired accounts cannot be reactivated.
    pub async fn activate(&self, id: AccountId) -> Result<Account, LedgerError> {
        let account = self.get(id).await?;
        match account.status {
            AccountStatus::Active => Ok(account),
            AccountStatus::Blocked => {
                let saved = self.set_status(account, AccountStatus::Active).await?;
                info!(account = %id, "account activated");
                Ok(saved)
            }
            from => Err(LedgerError::invalid_status_transition(
                id,
                from,
                AccountStatus::Active,
            )),
        }
    }

    /// Delete an account
    ///
    /// Terminal from every visible state. The row is kept (audit history
    /// still reconciles) but disappears from lookups and listings.
    pub async fn delete(&self, id: AccountId) -> Result<(), LedgerError> {
        let account = self.get(id).await?;
        self.set_status(account, AccountStatus::Deleted).await?;
        info!(account = %id, "account deleted");
        Ok(())
    }

    /// List an owner's accounts, excluding deleted ones
    pub async fn list_by_owner(
        &self,
        owner: OwnerId,
        page: usize,
        size: usize,
    ) -> Page<Account> {
        self.store.list_by_owner(owner, page, size).await
    }

    /// List accounts in a given status
    pub async fn list_by_status(
        &self,
        status: AccountStatus,
        page: usize,
        size: usize,
    ) -> Page<Account> {
        self.store.list_by_status(status, page, size).await
    }

    async fn set_status(
        &self,
        account: Account,
        status: AccountStatus,
    ) -> Result<Account, LedgerError> {
        let mut updated = account;
        updated.status = status;
        self.store.save(updated).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::FixedClock;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn service_at(today: (i32, u32, u32)) -> AccountService {
        let clock = FixedClock::at(
            Utc.with_ymd_and_hms(today.0, today.1, today.2, 12, 0, 0)
                .unwrap(),
        );
        AccountService::new(Arc::new(AccountStore::new()), Arc::new(clock))
    }

    fn service() -> AccountService {
        service_at((2026, 5, 1))
    }

    fn future_expiry() -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 1, 1).unwrap()
    }

    #[test]
    fn test_open_derives_last4_from_digits() {
        let service = service();
        let account = service
            .open(
                OwnerId::new(),
                "4000 0012 3456 7899",
                future_expiry(),
                dec!(100.00),
            )
            .unwrap();

        assert_eq!(account.last4, "7899");
        assert_eq!(account.status, AccountStatus::Active);
        assert_eq!(account.version, 0);
        assert_eq!(account.masked_number(), "**** **** **** 7899");
    }

    #[rstest]
    #[case::empty("")]
    #[case::too_short("123")]
    #[case::no_digits("**** ****")]
    fn test_open_rejects_bad_numbers(#[case] number: &str) {
        let service = service();
        let result = service.open(OwnerId::new(), number, future_expiry(), dec!(0.00));
        assert_eq!(result, Err(LedgerError::InvalidAccountNumber));
    }

    #[test]
    fn test_open_rejects_negative_balance() {
        let service = service();
        let result = service.open(OwnerId::new(), "1234567890", future_expiry(), dec!(-0.01));
        assert!(matches!(
            result,
            Err(LedgerError::NegativeOpeningBalance { .. })
        ));
    }

    #[tokio::test]
    async fn test_get_hides_deleted_accounts() {
        let service = service();
        let account = service
            .open(OwnerId::new(), "12345678", future_expiry(), dec!(0.00))
            .unwrap();

        service.delete(account.id).await.unwrap();

        let result = service.get(account.id).await;
        assert_eq!(result, Err(LedgerError::account_not_found(account.id)));
    }

    #[tokio::test]
    async fn test_block_then_activate_roundtrip() {
        let service = service();
        let account = service
            .open(OwnerId::new(), "12345678", future_expiry(), dec!(0.00))
            .unwrap();

        let blocked = service.block(account.id).await.unwrap();
        assert_eq!(blocked.status, AccountStatus::Blocked);
        assert_eq!(blocked.version, 1);

        let active = service.activate(account.id).await.unwrap();
        assert_eq!(active.status, AccountStatus::Active);
        assert_eq!(active.version, 2);
    }

    #[tokio::test]
    async fn test_block_is_idempotent() {
        let service = service();
        let account = service
            .open(OwnerId::new(), "12345678", future_expiry(), dec!(0.00))
            .unwrap();

        service.block(account.id).await.unwrap();
        let again = service.block(account.id).await.unwrap();

        assert_eq!(again.status, AccountStatus::Blocked);
        // No write happened the second time
        assert_eq!(again.version, 1);
    }

    #[tokio::test]
    async fn test_activate_is_idempotent() {
        let service = service();
        let account = service
            .open(OwnerId::new(), "12345678", future_expiry(), dec!(0.00))
            .unwrap();

        let again = service.activate(account.id).await.unwrap();
        assert_eq!(again.status, AccountStatus::Active);
        assert_eq!(again.version, 0);
    }

    #[rstest]
    #[case::block(AccountStatus::Blocked)]
    #[case::activate(AccountStatus::Active)]
    #[tokio::test]
    async fn test_expired_accounts_cannot_change_status(#[case] target: AccountStatus) {
        // Clock well past the expiry date so the lazy transition fires
        let service = service_at((2031, 1, 1));
        let account = service
            .open(
                OwnerId::new(),
                "12345678",
                NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
                dec!(0.00),
            )
            .unwrap();
        service.get_current(account.id).await.unwrap();

        let result = match target {
            AccountStatus::Blocked => service.block(account.id).await,
            _ => service.activate(account.id).await,
        };
        assert!(matches!(
            result,
            Err(LedgerError::InvalidStatusTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_from_blocked_is_allowed() {
        let service = service();
        let account = service
            .open(OwnerId::new(), "12345678", future_expiry(), dec!(0.00))
            .unwrap();

        service.block(account.id).await.unwrap();
        service.delete(account.id).await.unwrap();

        let result = service.get(account.id).await;
        assert!(matches!(result, Err(LedgerError::AccountNotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_twice_reports_not_found() {
        let service = service();
        let account = service
            .open(OwnerId::new(), "12345678", future_expiry(), dec!(0.00))
            .unwrap();

        service.delete(account.id).await.unwrap();
        let result = service.delete(account.id).await;
        assert_eq!(result, Err(LedgerError::account_not_found(account.id)));
    }

    #[tokio::test]
    async fn test_get_current_expires_past_due_accounts() {
        let service = service_at((2031, 6, 1));
        let account = service
            .open(
                OwnerId::new(),
                "12345678",
                NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
                dec!(25.00),
            )
            .unwrap();

        let current = service.get_current(account.id).await.unwrap();
        assert_eq!(current.status, AccountStatus::Expired);
        assert_eq!(current.version, 1);
        assert_eq!(current.balance, dec!(25.00));

        // The transition was persisted, not just reported
        let stored = service.get(account.id).await.unwrap();
        assert_eq!(stored.status, AccountStatus::Expired);
    }

    #[tokio::test]
    async fn test_get_current_is_stable_once_expired() {
        let service = service_at((2031, 6, 1));
        let account = service
            .open(
                OwnerId::new(),
                "12345678",
                NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
                dec!(0.00),
            )
            .unwrap();

        service.get_current(account.id).await.unwrap();
        let second = service.get_current(account.id).await.unwrap();

        // No second write: the version stays where the transition left it
        assert_eq!(second.version, 1);
    }

    #[tokio::test]
    async fn test_get_current_leaves_unexpired_accounts_alone() {
        let service = service();
        let account = service
            .open(OwnerId::new(), "12345678", future_expiry(), dec!(0.00))
            .unwrap();

        let current = service.get_current(account.id).await.unwrap();
        assert_eq!(current.status, AccountStatus::Active);
        assert_eq!(current.version, 0);
    }

    #[tokio::test]
    async fn test_listings_exclude_deleted() {
        let service = service();
        let owner = OwnerId::new();

        let kept = service
            .open(owner, "11112222", future_expiry(), dec!(0.00))
            .unwrap();
        let dropped = service
            .open(owner, "33334444", future_expiry(), dec!(0.00))
            .unwrap();
        service.delete(dropped.id).await.unwrap();

        let page = service.list_by_owner(owner, 0, 10).await;
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, kept.id);
    }
}
