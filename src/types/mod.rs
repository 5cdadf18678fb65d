//! Types module
//!
//! Contains core data structures used throughout the ledger.
//! This module organizes types into logical submodules:
//! - `wallet`: Wallet record and checked balance arithmetic
//! - `transaction`: Transaction records, drafts, and identifiers
//! - `report`: Reconciliation report types
//! - `principal`: Authenticated caller identity
//! - `error`: Error types for the ledger

pub mod error;
pub mod principal;
pub mod report;
pub mod transaction;
pub mod wallet;

pub use error::LedgerError;
pub use principal::{Principal, Role};
pub use report::{ReconciliationReport, ReportStatus};
pub use transaction::{
    Transaction, TransactionDraft, TransactionId, TransactionKind, TransactionMeta,
    TransactionStatus,
};
pub use wallet::{Amount, Wallet, WalletId, WalletKind};
