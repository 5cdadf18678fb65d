//! Append-only transaction log with a reference index
//!
//! Every money movement and every recorded failed attempt lands here as an
//! immutable row. The only field that ever changes after append is `status`,
//! and only through the compare-and-set in [`TransactionLog::transition`]:
//! pending rows move to exactly one terminal status, terminal rows never
//! move again. Rows are never deleted.
//!
//! The log also owns the idempotency index: each external reference maps to
//! at most one transaction, bound atomically at append time.

use crate::types::{
    LedgerError, Transaction, TransactionDraft, TransactionId, TransactionKind,
    TransactionStatus, WalletId,
};
use chrono::{DateTime, Utc};
use dashmap::{DashMap, Entry};
use std::sync::atomic::{AtomicU64, Ordering};

/// Filter criteria for transaction queries
///
/// All fields are optional; a transaction matches when it satisfies every
/// field that is set. The default filter matches everything.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    /// Match transactions touching this wallet as source or destination
    pub wallet: Option<WalletId>,
    pub kind: Option<TransactionKind>,
    pub status: Option<TransactionStatus>,
    pub initiator: Option<String>,
    /// Inclusive lower bound on `created_at`
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`
    pub until: Option<DateTime<Utc>>,
    /// Case-insensitive substring match against reference or description
    pub search: Option<String>,
}

impl TransactionFilter {
    /// Whether a transaction satisfies every set criterion
    pub fn matches(&self, tx: &Transaction) -> bool {
        if let Some(wallet) = self.wallet {
            if !tx.touches(wallet) {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            if tx.kind != kind {
                return false;
            }
        }
        if let Some(status) = self.status {
            if tx.status != status {
                return false;
            }
        }
        if let Some(ref initiator) = self.initiator {
            if tx.initiator != *initiator {
                return false;
            }
        }
        if let Some(from) = self.from {
            if tx.created_at < from {
                return false;
            }
        }
        if let Some(until) = self.until {
            if tx.created_at > until {
                return false;
            }
        }
        if let Some(ref needle) = self.search {
            let needle = needle.to_lowercase();
            if !tx.reference.to_lowercase().contains(&needle)
                && !tx.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        true
    }
}

/// Field to sort query results by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    CreatedAt,
    Amount,
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

/// Append-only store of transaction records
///
/// # Concurrency
///
/// Rows live in a `DashMap`, so appends against different shards proceed in
/// parallel. Status transitions lock only the row being transitioned.
/// Callers that hold a wallet lock may append or transition here; this log
/// never takes a wallet lock itself, which keeps the global lock order
/// (wallet, then log) acyclic.
#[derive(Debug, Default)]
pub struct TransactionLog {
    transactions: DashMap<TransactionId, Transaction>,

    /// External reference to transaction id; one binding per reference, ever
    by_reference: DashMap<String, TransactionId>,

    next_id: AtomicU64,
}

impl TransactionLog {
    /// Create an empty log
    pub fn new() -> Self {
        TransactionLog {
            transactions: DashMap::new(),
            by_reference: DashMap::new(),
            next_id: AtomicU64::new(0),
        }
    }

    /// Append a new transaction, binding its reference atomically
    ///
    /// Assigns the next id and timestamps the row (unless the draft carries
    /// its own timestamp, as restored history does). The row insert and the
    /// reference binding happen under the reference entry's shard lock, row
    /// first: two racing appends with the same reference cannot both
    /// succeed, and a bound reference always resolves to a stored row.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateReference` if the reference is already bound to a
    /// transaction. Callers decide whether that is an idempotent replay or
    /// a conflict by inspecting the existing row.
    pub fn append(&self, draft: TransactionDraft) -> Result<Transaction, LedgerError> {
        match self.by_reference.entry(draft.reference.clone()) {
            Entry::Occupied(_) => Err(LedgerError::duplicate_reference(&draft.reference)),
            Entry::Vacant(slot) => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
                let tx = Transaction {
                    id,
                    kind: draft.kind,
                    source_wallet: draft.source_wallet,
                    destination_wallet: draft.destination_wallet,
                    amount: draft.amount,
                    status: draft.status,
                    created_at: draft.created_at.unwrap_or_else(Utc::now),
                    description: draft.description,
                    initiator: draft.initiator,
                    reference: draft.reference,
                    failure_reason: draft.failure_reason,
                    import_batch: draft.import_batch,
                };
                // Row first, then binding: anyone who can see the reference
                // must be able to fetch the row it points at.
                self.transactions.insert(id, tx.clone());
                slot.insert(id);
                log::debug!("appended tx {id} ({}) ref={}", tx.kind, tx.reference);
                Ok(tx)
            }
        }
    }

    /// Move a pending transaction to a terminal status, exactly once
    ///
    /// This is a compare-and-set on the row's status under its shard lock:
    /// the row must currently be `Pending`. Concurrent callers racing on the
    /// same row serialize, and exactly one observes the pending state.
    ///
    /// # Errors
    ///
    /// - `TransactionNotFound` if no row has this id
    /// - `AlreadyProcessed` if the row is already terminal, carrying the
    ///   status it settled in
    pub fn transition(
        &self,
        tx_id: TransactionId,
        to: TransactionStatus,
        failure_reason: Option<String>,
    ) -> Result<Transaction, LedgerError> {
        debug_assert!(to.is_terminal());
        match self.transactions.get_mut(&tx_id) {
            Some(mut entry) => {
                let tx = entry.value_mut();
                if tx.status != TransactionStatus::Pending {
                    return Err(LedgerError::already_processed(tx_id, tx.status));
                }
                tx.status = to;
                tx.failure_reason = failure_reason;
                log::debug!("tx {tx_id} transitioned to {to}");
                Ok(tx.clone())
            }
            None => Err(LedgerError::transaction_not_found(tx_id)),
        }
    }

    /// Get a transaction by id
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound` if no row has this id.
    pub fn get(&self, tx_id: TransactionId) -> Result<Transaction, LedgerError> {
        self.transactions
            .get(&tx_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| LedgerError::transaction_not_found(tx_id))
    }

    /// Look up a transaction by its external reference
    pub fn find_by_reference(&self, reference: &str) -> Option<Transaction> {
        let tx_id = *self.by_reference.get(reference)?;
        self.transactions.get(&tx_id).map(|entry| entry.value().clone())
    }

    /// Snapshot every row matching a filter
    pub fn filtered(&self, filter: &TransactionFilter) -> Vec<Transaction> {
        self.transactions
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Snapshot every row touching a wallet
    pub fn for_wallet(&self, wallet: WalletId) -> Vec<Transaction> {
        self.filtered(&TransactionFilter {
            wallet: Some(wallet),
            ..TransactionFilter::default()
        })
    }

    /// Snapshot the whole log
    pub fn all(&self) -> Vec<Transaction> {
        self.transactions
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Remove every row tagged with an import batch
    ///
    /// The sole deletion path in the log, reachable only through the
    /// admin-gated importer cleanup. Unbinds the removed rows' references so
    /// they become usable again. Returns the number of rows removed.
    pub fn purge_batch(&self, batch: &str) -> usize {
        let doomed: Vec<(TransactionId, String)> = self
            .transactions
            .iter()
            .filter(|entry| entry.value().import_batch.as_deref() == Some(batch))
            .map(|entry| (entry.value().id, entry.value().reference.clone()))
            .collect();

        for (tx_id, reference) in &doomed {
            self.transactions.remove(tx_id);
            self.by_reference.remove(reference);
        }
        if !doomed.is_empty() {
            log::warn!("purged {} transaction(s) from import batch {batch}", doomed.len());
        }
        doomed.len()
    }

    /// Number of rows in the log
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Whether the log holds no rows
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}
