//! Transaction types for the wallet ledger
//!
//! Every money movement is one logical transaction record. A transfer is a
//! single record representing its paired debit and credit, never two rows.

use crate::types::wallet::{Amount, WalletId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Transaction identifier, assigned by the log on append
pub type TransactionId = u64;

/// Kinds of money movement the ledger records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Credit funds into a wallet
    Deposit,
    /// Debit funds out of a wallet
    Withdrawal,
    /// Move funds between two wallets as one atomic unit
    Transfer,
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionKind::Deposit => write!(f, "deposit"),
            TransactionKind::Withdrawal => write!(f, "withdrawal"),
            TransactionKind::Transfer => write!(f, "transfer"),
        }
    }
}

/// Lifecycle status of a transaction
///
/// `Pending` transactions have no balance effect until settled by the
/// approval workflow. `Completed` and `Failed` are terminal: the only legal
/// transitions are `Pending -> Completed` and `Pending -> Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Awaiting admin review; no balance effect yet
    Pending,
    /// Settled; its balance effect has been applied exactly once
    Completed,
    /// Rejected or failed; no balance effect
    Failed,
}

impl TransactionStatus {
    /// Whether this status is terminal
    pub fn is_terminal(self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Pending => write!(f, "pending"),
            TransactionStatus::Completed => write!(f, "completed"),
            TransactionStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A recorded money-movement event
///
/// Records are append-only: after creation the only legal mutation is the
/// `pending -> completed/failed` status transition. Deletion happens solely
/// through the audited bulk-import cleanup path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique transaction id, assigned by the log
    pub id: TransactionId,

    /// The kind of movement
    pub kind: TransactionKind,

    /// The wallet being credited (deposit) or debited (withdrawal, transfer)
    pub source_wallet: WalletId,

    /// The credited wallet of a transfer; `None` for other kinds
    pub destination_wallet: Option<WalletId>,

    /// Amount moved, in minor currency units; strictly positive
    pub amount: Amount,

    /// Lifecycle status
    pub status: TransactionStatus,

    /// When the record was appended (or the imported event occurred)
    pub created_at: DateTime<Utc>,

    /// Free-text description shown in audit views
    pub description: String,

    /// User id of the caller that initiated the movement
    pub initiator: String,

    /// Caller-supplied idempotency reference, unique across the log
    pub reference: String,

    /// Why the transaction failed or was rejected, if it did
    pub failure_reason: Option<String>,

    /// Import batch tag for bulk-imported rows
    ///
    /// Only rows carrying a batch tag are reachable by the audited
    /// bulk-import cleanup.
    pub import_batch: Option<String>,
}

impl Transaction {
    /// Whether this transaction credits or debits the given wallet
    pub fn touches(&self, wallet: WalletId) -> bool {
        self.source_wallet == wallet || self.destination_wallet == Some(wallet)
    }

    /// Signed balance effect of this transaction on the given wallet
    ///
    /// Credits are positive (deposits, transfer-ins), debits negative
    /// (withdrawals, transfer-outs). Zero when the wallet is not involved.
    /// Status is deliberately ignored; callers decide which statuses count.
    pub fn delta_for(&self, wallet: WalletId) -> i128 {
        let amount = i128::from(self.amount);
        match self.kind {
            TransactionKind::Deposit if self.source_wallet == wallet => amount,
            TransactionKind::Withdrawal if self.source_wallet == wallet => -amount,
            TransactionKind::Transfer => {
                // A self-transfer is rejected on entry, so at most one arm applies.
                if self.source_wallet == wallet {
                    -amount
                } else if self.destination_wallet == Some(wallet) {
                    amount
                } else {
                    0
                }
            }
            _ => 0,
        }
    }
}

/// Caller-supplied metadata accompanying a processor operation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransactionMeta {
    /// Free-text description for audit views
    pub description: String,

    /// User id of the initiating caller
    pub initiator: String,

    /// Idempotency reference; a retried request reuses the same value
    pub reference: String,

    /// Batch tag, set only by the bulk importer
    pub import_batch: Option<String>,

    /// Event timestamp override, set only for imported historical rows
    pub created_at: Option<DateTime<Utc>>,
}

impl TransactionMeta {
    /// Create metadata for a direct (non-import) operation
    pub fn new(description: &str, initiator: &str, reference: &str) -> Self {
        TransactionMeta {
            description: description.to_string(),
            initiator: initiator.to_string(),
            reference: reference.to_string(),
            import_batch: None,
            created_at: None,
        }
    }
}

/// Everything the log needs to append a new record
///
/// The log assigns the id; `created_at` is honored when set (imported
/// historical events) and defaulted to now otherwise.
#[derive(Debug, Clone)]
pub struct TransactionDraft {
    pub kind: TransactionKind,
    pub source_wallet: WalletId,
    pub destination_wallet: Option<WalletId>,
    pub amount: Amount,
    pub status: TransactionStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub description: String,
    pub initiator: String,
    pub reference: String,
    pub failure_reason: Option<String>,
    pub import_batch: Option<String>,
}

impl TransactionDraft {
    /// Create a draft from processor metadata
    pub fn from_meta(
        kind: TransactionKind,
        source_wallet: WalletId,
        destination_wallet: Option<WalletId>,
        amount: Amount,
        status: TransactionStatus,
        meta: &TransactionMeta,
    ) -> Self {
        TransactionDraft {
            kind,
            source_wallet,
            destination_wallet,
            amount,
            status,
            created_at: meta.created_at,
            description: meta.description.clone(),
            initiator: meta.initiator.clone(),
            reference: meta.reference.clone(),
            failure_reason: None,
            import_batch: meta.import_batch.clone(),
        }
    }

    /// Mark the draft failed with the given reason
    pub fn failed(mut self, reason: &str) -> Self {
        self.status = TransactionStatus::Failed;
        self.failure_reason = Some(reason.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn transfer(source: WalletId, destination: WalletId, amount: Amount) -> Transaction {
        Transaction {
            id: 1,
            kind: TransactionKind::Transfer,
            source_wallet: source,
            destination_wallet: Some(destination),
            amount,
            status: TransactionStatus::Completed,
            created_at: Utc::now(),
            description: String::new(),
            initiator: "u1".to_string(),
            reference: "ref-1".to_string(),
            failure_reason: None,
            import_batch: None,
        }
    }

    #[rstest]
    #[case::deposit_credits_source(TransactionKind::Deposit, 1, None, 1, 500)]
    #[case::withdrawal_debits_source(TransactionKind::Withdrawal, 1, None, 1, -500)]
    fn test_delta_for_single_wallet_kinds(
        #[case] kind: TransactionKind,
        #[case] source: WalletId,
        #[case] destination: Option<WalletId>,
        #[case] wallet: WalletId,
        #[case] expected: i128,
    ) {
        let tx = Transaction {
            kind,
            source_wallet: source,
            destination_wallet: destination,
            ..transfer(source, 99, 500)
        };
        assert_eq!(tx.delta_for(wallet), expected);
    }

    #[test]
    fn test_delta_for_transfer_legs() {
        let tx = transfer(1, 2, 300_000);
        assert_eq!(tx.delta_for(1), -300_000);
        assert_eq!(tx.delta_for(2), 300_000);
        assert_eq!(tx.delta_for(3), 0);
    }

    #[test]
    fn test_touches() {
        let tx = transfer(1, 2, 100);
        assert!(tx.touches(1));
        assert!(tx.touches(2));
        assert!(!tx.touches(3));
    }

    #[rstest]
    #[case(TransactionStatus::Pending, false)]
    #[case(TransactionStatus::Completed, true)]
    #[case(TransactionStatus::Failed, true)]
    fn test_status_terminality(#[case] status: TransactionStatus, #[case] terminal: bool) {
        assert_eq!(status.is_terminal(), terminal);
    }

    #[test]
    fn test_draft_failed_sets_status_and_reason() {
        let meta = TransactionMeta::new("rent payout", "admin-1", "wd-77");
        let draft = TransactionDraft::from_meta(
            TransactionKind::Withdrawal,
            1,
            None,
            500,
            TransactionStatus::Completed,
            &meta,
        )
        .failed("insufficient funds");

        assert_eq!(draft.status, TransactionStatus::Failed);
        assert_eq!(draft.failure_reason.as_deref(), Some("insufficient funds"));
        assert_eq!(draft.reference, "wd-77");
    }
}
