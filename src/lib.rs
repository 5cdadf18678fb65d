//! Custodial Wallet Ledger
//! # Overview
//!
//! This library implements the money-handling core of an investment
//! platform: per-purpose wallet balances, an append-only transaction log,
//! atomic deposits/withdrawals/transfers with idempotency, an admin
//! approval workflow, and reconciliation of stored balances against
//! history.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Wallet, Transaction, errors, etc.)
//! - [`cli`] - CLI argument parsing for the companion binary
//! - [`core`] - Business logic components:
//!   - [`core::wallet_store`] - Wallet state and per-wallet serialization
//!   - [`core::transaction_log`] - Append-only history with a reference index
//!   - [`core::processor`] - Deposit, withdrawal, and transfer execution
//!   - [`core::approval`] - Exactly-once settlement of pending transactions
//!   - [`core::reconciliation`] - Balance-vs-history drift detection
//!   - [`core::query`] - Filter/sort/paginate views for audit screens
//!   - [`core::importer`] - Bulk import with batch tagging and purge
//! - [`io`] - CSV import/export with sync and async readers
//!
//! # Guarantees
//!
//! - Every balance write is serialized per wallet; concurrent operations
//!   never lose updates.
//! - A transfer debits and credits atomically, with both wallet locks held
//!   in ascending id order.
//! - Replaying a request with its idempotency reference applies the balance
//!   effect at most once.
//! - At any quiescent point, a wallet's balance equals the sum of its
//!   completed credits minus completed debits, and reconciliation confirms
//!   it.

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod types;

pub use crate::core::{
    ApprovalWorkflow, BulkImporter, Ledger, QueryOptions, QueryService, ReconciliationEngine,
    SortField, SortOrder, TransactionFilter, TransactionLog, TransactionProcessor, WalletStore,
};
pub use crate::io::{write_transactions_csv, write_wallets_csv};
pub use crate::types::{
    Amount, LedgerError, Principal, ReconciliationReport, ReportStatus, Role, Transaction,
    TransactionId, TransactionKind, TransactionMeta, TransactionStatus, Wallet, WalletId,
    WalletKind,
};
