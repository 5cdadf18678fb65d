//! Drift detection between stored balances and transaction history
//!
//! The engine recomputes what a wallet's balance should be from its completed
//! history and compares it with the stored balance. It reads under the
//! wallet's lock, so the stored balance and the history it is compared
//! against belong to the same moment; a transaction completing concurrently
//! can never produce a false discrepancy, because completions happen inside
//! that same lock.
//!
//! Reconciliation only reports. Correcting drift takes a separate, audited
//! adjustment through the processor.

use crate::core::{TransactionLog, WalletStore};
use crate::types::{
    LedgerError, ReconciliationReport, ReportStatus, TransactionStatus, WalletId,
};
use chrono::Utc;
use std::sync::Arc;

/// Recomputes expected balances from history and flags drift
#[derive(Debug, Clone)]
pub struct ReconciliationEngine {
    wallets: Arc<WalletStore>,
    log: Arc<TransactionLog>,
}

impl ReconciliationEngine {
    pub fn new(wallets: Arc<WalletStore>, log: Arc<TransactionLog>) -> Self {
        ReconciliationEngine { wallets, log }
    }

    /// Reconcile one wallet against its completed history
    ///
    /// Expected balance is the sum of completed credits minus completed
    /// debits touching the wallet. Amounts are integer minor units, so the
    /// comparison is exact; any nonzero discrepancy is reported.
    ///
    /// # Errors
    ///
    /// - `WalletNotFound` for an unknown wallet
    /// - `AmountOverflow` if the history sum exceeds the reportable range
    pub fn reconcile(&self, wallet_id: WalletId) -> Result<ReconciliationReport, LedgerError> {
        self.wallets.with_wallet(wallet_id, |wallet| {
            let mut expected: i128 = 0;
            for tx in self.log.for_wallet(wallet_id) {
                if tx.status == TransactionStatus::Completed {
                    expected += tx.delta_for(wallet_id);
                }
            }

            let expected_balance = i64::try_from(expected)
                .map_err(|_| LedgerError::amount_overflow("reconcile", wallet_id))?;
            let actual = i64::try_from(wallet.balance)
                .map_err(|_| LedgerError::amount_overflow("reconcile", wallet_id))?;
            let discrepancy = actual - expected_balance;

            let status = if discrepancy == 0 {
                ReportStatus::Balanced
            } else {
                log::warn!(
                    "wallet {wallet_id} drifted: stored {actual}, history sums to {expected_balance}"
                );
                ReportStatus::DiscrepancyFound
            };

            Ok(ReconciliationReport {
                wallet_id,
                actual_balance: wallet.balance,
                expected_balance,
                discrepancy,
                as_of: Utc::now(),
                status,
            })
        })
    }

    /// Reconcile every wallet, in id order
    pub fn reconcile_all(&self) -> Result<Vec<ReconciliationReport>, LedgerError> {
        self.wallets
            .ids()
            .into_iter()
            .map(|id| self.reconcile(id))
            .collect()
    }
}
