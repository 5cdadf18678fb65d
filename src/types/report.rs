//! Reconciliation report types
//!
//! A report is an audit artifact produced on demand. It is never persisted as
//! ground truth and never used to correct a balance.

use crate::types::wallet::{Amount, WalletId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of comparing a stored balance against the transaction history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Stored balance exactly equals the history sum
    Balanced,
    /// Stored balance has drifted from the history sum
    DiscrepancyFound,
}

/// Result of reconciling one wallet
///
/// Amounts are integers in minor units, so the comparison is exact: any
/// nonzero discrepancy is reported, with no tolerance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    /// The reconciled wallet
    pub wallet_id: WalletId,

    /// Balance currently stored on the wallet record
    pub actual_balance: Amount,

    /// Sum of completed credits minus completed debits over the log
    pub expected_balance: i64,

    /// `actual_balance - expected_balance`; zero when balanced
    pub discrepancy: i64,

    /// When the snapshot was taken
    pub as_of: DateTime<Utc>,

    /// Whether the wallet balanced
    pub status: ReportStatus,
}

impl ReconciliationReport {
    pub fn is_balanced(&self) -> bool {
        self.status == ReportStatus::Balanced
    }
}
