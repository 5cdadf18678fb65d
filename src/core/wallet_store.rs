//! Wallet storage and the per-wallet serialization point
//!
//! This module provides the `WalletStore`, the exclusive owner of wallet
//! mutation. Every balance write goes through a per-wallet mutex, which rules
//! out the read-then-write lost-update race that unserialized mutation would
//! allow.
//!
//! # Locking discipline
//!
//! - Each wallet lives behind its own `Arc<Mutex<Wallet>>` inside a `DashMap`,
//!   so operations on different wallets never contend.
//! - [`WalletStore::with_wallet_pair`] locks two wallets in ascending id
//!   order. Two transfers moving money in opposite directions therefore
//!   acquire the same locks in the same order and cannot deadlock.
//! - Components may append to the transaction log while holding a wallet
//!   lock, never the reverse. That single global order keeps the store and
//!   the log free of lock cycles, and it is what makes a reconciliation
//!   snapshot coherent: a completed transaction becomes visible in the log
//!   in the same critical section that committed its balance effect.

use crate::types::{LedgerError, Principal, Wallet, WalletId, WalletKind};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Owns all wallet records and serializes mutation per wallet
///
/// The store is the only component allowed to change a balance. Everything
/// else goes through [`WalletStore::apply_delta`] or the critical-section
/// helpers, which run the caller's closure while the wallet lock is held.
#[derive(Debug, Default)]
pub struct WalletStore {
    /// Wallets by id; the inner mutex is the per-wallet serialization point
    wallets: DashMap<WalletId, Arc<Mutex<Wallet>>>,

    /// Highest id handed out so far
    next_id: AtomicU64,
}

/// Recover the guard from a poisoned lock
///
/// Balance commits are single assignments, so a writer that panicked between
/// them cannot have left a torn balance behind; the data is still usable.
fn relock<'a>(
    result: Result<MutexGuard<'a, Wallet>, PoisonError<MutexGuard<'a, Wallet>>>,
) -> MutexGuard<'a, Wallet> {
    result.unwrap_or_else(PoisonError::into_inner)
}

impl WalletStore {
    /// Create an empty store
    pub fn new() -> Self {
        WalletStore {
            wallets: DashMap::new(),
            next_id: AtomicU64::new(0),
        }
    }

    /// Provision a new wallet with a zero balance
    ///
    /// Wallets are created exactly once; opening balances arrive as ordinary
    /// deposits so the history stays complete.
    pub fn provision(&self, kind: WalletKind, currency: &str) -> Wallet {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let wallet = Wallet::new(id, kind, currency);
        self.wallets.insert(id, Arc::new(Mutex::new(wallet.clone())));
        log::debug!("provisioned wallet {id} ({kind}, {currency})");
        wallet
    }

    /// Insert a wallet restored from the persistence collaborator
    ///
    /// Keeps the given id (and balance) instead of assigning a fresh one.
    ///
    /// # Errors
    ///
    /// Returns `IoError` if a wallet with this id already exists; restore
    /// only runs against persisted state, so a collision means the input
    /// file is inconsistent.
    pub fn restore(&self, wallet: Wallet) -> Result<Wallet, LedgerError> {
        let id = wallet.id;
        if self.wallets.contains_key(&id) {
            return Err(LedgerError::IoError {
                message: format!("wallet {id} already exists; refusing to restore over it"),
            });
        }
        self.wallets.insert(id, Arc::new(Mutex::new(wallet.clone())));
        self.next_id.fetch_max(id, Ordering::Relaxed);
        Ok(wallet)
    }

    /// Whether a wallet with this id exists
    pub fn contains(&self, id: WalletId) -> bool {
        self.wallets.contains_key(&id)
    }

    /// Get a snapshot of a wallet
    ///
    /// # Errors
    ///
    /// Returns `WalletNotFound` if no wallet has this id.
    pub fn get(&self, id: WalletId) -> Result<Wallet, LedgerError> {
        let handle = self.handle(id)?;
        let wallet = relock(handle.lock());
        Ok(wallet.clone())
    }

    /// Archive (retire) a wallet; admin only
    ///
    /// The wallet keeps its balance and history but rejects further balance
    /// mutation. Wallets are never hard-deleted.
    pub fn archive(&self, principal: &Principal, id: WalletId) -> Result<Wallet, LedgerError> {
        principal.require_admin("archive wallet")?;
        self.with_wallet(id, |wallet| {
            wallet.archived = true;
            log::info!("wallet {id} archived by {}", principal.user);
            Ok(wallet.clone())
        })
    }

    /// Snapshot all wallets, sorted by id for deterministic output
    pub fn all(&self) -> Vec<Wallet> {
        let mut wallets: Vec<Wallet> = self
            .wallets
            .iter()
            .map(|entry| relock(entry.value().lock()).clone())
            .collect();
        wallets.sort_by_key(|wallet| wallet.id);
        wallets
    }

    /// Ids of all wallets, sorted ascending
    pub fn ids(&self) -> Vec<WalletId> {
        let mut ids: Vec<WalletId> = self.wallets.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();
        ids
    }

    /// Number of wallets in the store
    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    /// Whether the store holds no wallets
    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }

    /// Atomically read-modify-write a single wallet's balance
    ///
    /// This is the one legal primitive for changing a balance from outside
    /// the store. The read, the sufficient-funds check, and the write happen
    /// under the wallet's lock, so concurrent deltas against the same wallet
    /// serialize instead of losing updates.
    ///
    /// # Errors
    ///
    /// - `WalletNotFound` if no wallet has this id
    /// - `WalletArchived` if the wallet is retired
    /// - `InsufficientFunds` if `balance + delta` would be negative
    /// - `AmountOverflow` if the credit would overflow
    pub fn apply_delta(&self, id: WalletId, delta: i64) -> Result<Wallet, LedgerError> {
        self.with_wallet(id, |wallet| {
            wallet.ensure_active()?;
            let new_balance = if delta >= 0 {
                wallet.balance_after_credit(delta as u64)?
            } else {
                wallet.balance_after_debit(delta.unsigned_abs())?
            };
            wallet.commit_balance(new_balance);
            Ok(wallet.clone())
        })
    }

    /// Run a closure inside one wallet's critical section
    ///
    /// The closure receives the wallet under its lock; nothing else can read
    /// or write that wallet until the closure returns. Closures must not
    /// block on anything that could itself wait for a wallet lock.
    pub fn with_wallet<R>(
        &self,
        id: WalletId,
        f: impl FnOnce(&mut Wallet) -> Result<R, LedgerError>,
    ) -> Result<R, LedgerError> {
        let handle = self.handle(id)?;
        let mut wallet = relock(handle.lock());
        f(&mut wallet)
    }

    /// Run a closure inside the critical section of two wallets
    ///
    /// Both wallets are locked for the duration, acquired in ascending id
    /// order regardless of argument order; the closure still receives them
    /// in the order given. Existence of both wallets is checked before
    /// either lock is taken, so a missing wallet never blocks the other.
    ///
    /// # Errors
    ///
    /// - `SelfTransfer` if both ids are the same
    /// - `WalletNotFound` if either wallet is missing
    pub fn with_wallet_pair<R>(
        &self,
        first: WalletId,
        second: WalletId,
        f: impl FnOnce(&mut Wallet, &mut Wallet) -> Result<R, LedgerError>,
    ) -> Result<R, LedgerError> {
        if first == second {
            return Err(LedgerError::SelfTransfer { wallet: first });
        }

        let first_handle = self.handle(first)?;
        let second_handle = self.handle(second)?;

        // Fixed global order: lower id first.
        if first < second {
            let mut a = relock(first_handle.lock());
            let mut b = relock(second_handle.lock());
            f(&mut a, &mut b)
        } else {
            let mut b = relock(second_handle.lock());
            let mut a = relock(first_handle.lock());
            f(&mut a, &mut b)
        }
    }

    fn handle(&self, id: WalletId) -> Result<Arc<Mutex<Wallet>>, LedgerError> {
        self.wallets
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| LedgerError::wallet_not_found(id))
    }
}
