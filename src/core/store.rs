//! Account store: row-level locking and version-checked persistence
//!
//! This module provides the `AccountStore`, the single owner of durable
//! account rows. It implements the two defenses the transfer protocol
//! relies on:
//!
//! - **Pessimistic row locks**: every row is guarded by its own async
//!   mutex. [`AccountStore::lock`] is the fetch-with-exclusive-lock
//!   operation; acquisition is bounded by a timeout and a timeout is
//!   reported as a transient, retryable failure.
//! - **Optimistic versions**: every persisted write must present the
//!   version it read. A stale version is rejected as a concurrent
//!   modification instead of silently overwriting.
//!
//! Rows are created once and never removed; "deletion" is a status change
//! on the row. This keeps existence checks stable: an id that resolves once
//! resolves forever.
//!
//! # Lock ordering
//!
//! [`AccountStore::lock_pair`] acquires both rows of a transfer in
//! ascending id order regardless of which side is the source. A pair
//! naming the same id takes the single lock once.

use crate::types::{Account, AccountId, AccountStatus, LedgerError, OwnerId};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::timeout;

/// Default bound on exclusive lock acquisition
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// One page of a listing query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    /// Records on this page
    pub items: Vec<T>,
    /// Zero-based page index
    pub page: usize,
    /// Requested page size
    pub size: usize,
    /// Total number of matching records across all pages
    pub total: usize,
}

/// In-memory account store honoring the locking contract
///
/// Each account lives in its own `Arc<Mutex<Account>>` row inside a
/// `DashMap`. The dashmap serializes row creation and lookup; the per-row
/// mutex serializes mutation, and can be held across the whole transfer
/// protocol (dashmap entry guards cannot be held across await points, so
/// they are only ever taken briefly to clone the row handle out).
pub struct AccountStore {
    /// Row map; entries are inserted once and never removed
    accounts: DashMap<AccountId, Arc<Mutex<Account>>>,

    /// Bound on each exclusive lock acquisition
    lock_timeout: Duration,
}

impl AccountStore {
    /// Create an empty store with the default lock timeout
    pub fn new() -> Self {
        Self::with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
    }

    /// Create an empty store with a custom lock timeout
    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        AccountStore {
            accounts: DashMap::new(),
            lock_timeout,
        }
    }

    /// Number of rows in the store, deleted accounts included
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Whether the store holds no rows at all
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Whether a row exists for the given id, regardless of status
    pub fn contains(&self, id: AccountId) -> bool {
        self.accounts.contains_key(&id)
    }

    /// Insert a freshly opened account as a new row
    ///
    /// # Errors
    ///
    /// Returns a storage error if a row with the same id already exists;
    /// the existing row is left untouched.
    pub fn create(&self, account: Account) -> Result<Account, LedgerError> {
        match self.accounts.entry(account.id) {
            Entry::Occupied(_) => Err(LedgerError::storage(format!(
                "duplicate account id {}",
                account.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(Mutex::new(account.clone())));
                Ok(account)
            }
        }
    }

    /// Clone the row handle out of the map without holding a map guard
    fn row(&self, id: AccountId) -> Result<Arc<Mutex<Account>>, LedgerError> {
        self.accounts
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| LedgerError::account_not_found(id))
    }

    /// Fetch an account with its exclusive row lock held
    ///
    /// The returned guard serializes all mutation of the row; it is released
    /// on drop. Acquisition is bounded by the store's lock timeout.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::AccountNotFound`] if no row exists for the id
    /// - [`LedgerError::LockTimeout`] if the lock could not be acquired in
    ///   time; nothing was touched and the caller may retry
    pub async fn lock(&self, id: AccountId) -> Result<OwnedMutexGuard<Account>, LedgerError> {
        let row = self.row(id)?;
        timeout(self.lock_timeout, row.lock_owned())
            .await
            .map_err(|_| LedgerError::lock_timeout(id))
    }

    /// Lock both rows of a transfer
    ///
    /// Rows are acquired in ascending id order regardless of which side is
    /// the source, so two opposite-direction transfers on the same pair can
    /// never circular-wait. A pair naming the same id takes the single lock
    /// once; the returned guard then answers for both sides.
    pub async fn lock_pair(
        &self,
        source: AccountId,
        dest: AccountId,
    ) -> Result<PairGuard, LedgerError> {
        if source == dest {
            return Ok(PairGuard {
                source: self.lock(source).await?,
                dest: None,
            });
        }
        if source < dest {
            let source = self.lock(source).await?;
            let dest = self.lock(dest).await?;
            Ok(PairGuard {
                source,
                dest: Some(dest),
            })
        } else {
            let dest = self.lock(dest).await?;
            let source = self.lock(source).await?;
            Ok(PairGuard {
                source,
                dest: Some(dest),
            })
        }
    }

    /// Fetch a point-in-time copy of an account
    ///
    /// Takes the row lock briefly and clones the record out. The copy does
    /// not track later modifications.
    pub async fn fetch(&self, id: AccountId) -> Result<Account, LedgerError> {
        Ok(self.lock(id).await?.clone())
    }

    /// Persist an account, checking the version it was read at
    ///
    /// The stored version must still equal `account.version`; the persisted
    /// row then carries `account.version + 1`. Returns the persisted record.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::VersionConflict`] if another writer got in between
    ///   the read and this save
    /// - [`LedgerError::AccountNotFound`] / [`LedgerError::LockTimeout`]
    ///   from the row lookup and lock
    pub async fn save(&self, account: Account) -> Result<Account, LedgerError> {
        let mut row = self.lock(account.id).await?;
        Self::commit(&mut row, account)
    }

    /// Version-checked write against an already-locked row
    ///
    /// Shared by [`AccountStore::save`] and the transfer commit path.
    pub fn commit(row: &mut Account, updated: Account) -> Result<Account, LedgerError> {
        if row.version != updated.version {
            return Err(LedgerError::version_conflict(
                updated.id,
                updated.version,
                row.version,
            ));
        }
        let mut persisted = updated;
        persisted.version += 1;
        *row = persisted.clone();
        Ok(persisted)
    }

    /// Point-in-time copies of all rows, deleted accounts included
    pub async fn snapshot(&self) -> Vec<Account> {
        let rows: Vec<Arc<Mutex<Account>>> = self
            .accounts
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut accounts = Vec::with_capacity(rows.len());
        for row in rows {
            accounts.push(row.lock().await.clone());
        }
        accounts
    }

    /// List accounts in a given status, newest expiry first
    pub async fn list_by_status(
        &self,
        status: AccountStatus,
        page: usize,
        size: usize,
    ) -> Page<Account> {
        let matching = self
            .snapshot()
            .await
            .into_iter()
            .filter(|account| account.status == status)
            .collect();
        Self::paginate(matching, page, size)
    }

    /// List an owner's accounts, excluding deleted ones, newest expiry first
    pub async fn list_by_owner(
        &self,
        owner: OwnerId,
        page: usize,
        size: usize,
    ) -> Page<Account> {
        let matching = self
            .snapshot()
            .await
            .into_iter()
            .filter(|account| account.owner == owner && account.status != AccountStatus::Deleted)
            .collect();
        Self::paginate(matching, page, size)
    }

    fn paginate(mut accounts: Vec<Account>, page: usize, size: usize) -> Page<Account> {
        // Expiry descending, id as the deterministic tie-break
        accounts.sort_by(|a, b| b.expiry.cmp(&a.expiry).then_with(|| a.id.cmp(&b.id)));
        let total = accounts.len();
        let items = accounts
            .into_iter()
            .skip(page.saturating_mul(size))
            .take(size)
            .collect();
        Page {
            items,
            page,
            size,
            total,
        }
    }
}

impl Default for AccountStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive locks over both legs of a transfer
///
/// Produced by [`AccountStore::lock_pair`]. For a same-id pair only one
/// guard exists and `dest()` answers with the source row.
pub struct PairGuard {
    source: OwnedMutexGuard<Account>,
    dest: Option<OwnedMutexGuard<Account>>,
}

impl PairGuard {
    /// Current state of the source row
    pub fn source(&self) -> &Account {
        &*self.source
    }

    /// Current state of the destination row
    pub fn dest(&self) -> &Account {
        match &self.dest {
            Some(dest) => &**dest,
            None => &*self.source,
        }
    }

    /// Whether both sides name the same row
    pub fn is_same_account(&self) -> bool {
        self.dest.is_none()
    }

    /// Commit both legs of a transfer atomically
    ///
    /// Both versions are verified before either row is written, so a stale
    /// side leaves the pair completely untouched. Returns the persisted
    /// records.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::SameAccount`] if the pair holds a single row; the
    ///   executor rejects such transfers before reaching the commit
    /// - [`LedgerError::VersionConflict`] if either side was written at a
    ///   version that is no longer current
    pub fn commit(
        &mut self,
        debited: Account,
        credited: Account,
    ) -> Result<(Account, Account), LedgerError> {
        let dest = match self.dest.as_mut() {
            Some(dest) => dest,
            None => return Err(LedgerError::same_account(debited.id)),
        };

        if self.source.version != debited.version {
            return Err(LedgerError::version_conflict(
                debited.id,
                debited.version,
                self.source.version,
            ));
        }
        if dest.version != credited.version {
            return Err(LedgerError::version_conflict(
                credited.id,
                credited.version,
                dest.version,
            ));
        }

        let mut debited = debited;
        debited.version += 1;
        *self.source = debited.clone();

        let mut credited = credited;
        credited.version += 1;
        **dest = credited.clone();

        Ok((debited, credited))
    }
}
