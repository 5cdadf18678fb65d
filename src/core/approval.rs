//! Admin settlement of pending transactions
//!
//! Pending transactions carry no balance effect until an admin settles them.
//! `approve` applies the effect and transitions the row to `Completed`;
//! `reject` transitions it to `Failed` with a reason and touches no balance.
//! Either way the row leaves `Pending` exactly once: the status change is a
//! compare-and-set that only one caller can win, performed inside the
//! affected wallet's critical section so the balance application and the
//! status flip are one atomic step.

use crate::core::{TransactionLog, WalletStore};
use crate::types::{
    LedgerError, Principal, Transaction, TransactionId, TransactionKind, TransactionStatus,
};
use std::sync::Arc;

/// Settles pending transactions exactly once
#[derive(Debug, Clone)]
pub struct ApprovalWorkflow {
    wallets: Arc<WalletStore>,
    log: Arc<TransactionLog>,
}

impl ApprovalWorkflow {
    pub fn new(wallets: Arc<WalletStore>, log: Arc<TransactionLog>) -> Self {
        ApprovalWorkflow { wallets, log }
    }

    /// Approve a pending transaction, applying its balance effect exactly once
    ///
    /// Of M concurrent approvals of the same transaction, exactly one applies
    /// the delta and returns the completed row; the rest get
    /// `AlreadyProcessed`.
    ///
    /// A pending withdrawal or transfer that can no longer apply (underfunded
    /// source, overflowing destination credit) transitions to `Failed` with
    /// the reason recorded, and the cause surfaces to the caller.
    ///
    /// # Errors
    ///
    /// - `Unauthorized` for non-admin callers
    /// - `TransactionNotFound` for an unknown id
    /// - `AlreadyProcessed` if the transaction already settled
    pub fn approve(
        &self,
        principal: &Principal,
        tx_id: TransactionId,
    ) -> Result<Transaction, LedgerError> {
        principal.require_admin("approve transaction")?;
        let tx = self.log.get(tx_id)?;
        if tx.status != TransactionStatus::Pending {
            return Err(LedgerError::already_processed(tx_id, tx.status));
        }

        let settled = match tx.kind {
            TransactionKind::Deposit => self.wallets.with_wallet(tx.source_wallet, |w| {
                w.ensure_active()?;
                let new_balance = w.balance_after_credit(tx.amount)?;
                let settled = self
                    .log
                    .transition(tx_id, TransactionStatus::Completed, None)?;
                w.commit_balance(new_balance);
                Ok(settled)
            }),
            TransactionKind::Withdrawal => self.wallets.with_wallet(tx.source_wallet, |w| {
                w.ensure_active()?;
                match w.balance_after_debit(tx.amount) {
                    Ok(new_balance) => {
                        let settled =
                            self.log
                                .transition(tx_id, TransactionStatus::Completed, None)?;
                        w.commit_balance(new_balance);
                        Ok(settled)
                    }
                    Err(err) => {
                        self.log.transition(
                            tx_id,
                            TransactionStatus::Failed,
                            Some(err.to_string()),
                        )?;
                        Err(err)
                    }
                }
            }),
            TransactionKind::Transfer => {
                let destination = tx
                    .destination_wallet
                    .ok_or_else(|| LedgerError::missing_field("destination"))?;
                self.wallets
                    .with_wallet_pair(tx.source_wallet, destination, |src, dst| {
                        src.ensure_active()?;
                        dst.ensure_active()?;
                        if src.currency != dst.currency {
                            let err =
                                LedgerError::currency_mismatch(&src.currency, &dst.currency);
                            self.log.transition(
                                tx_id,
                                TransactionStatus::Failed,
                                Some(err.to_string()),
                            )?;
                            return Err(err);
                        }
                        let prospective = src.balance_after_debit(tx.amount).and_then(|debited| {
                            let credited = dst.balance_after_credit(tx.amount)?;
                            Ok((debited, credited))
                        });
                        match prospective {
                            Ok((debited, credited)) => {
                                let settled = self.log.transition(
                                    tx_id,
                                    TransactionStatus::Completed,
                                    None,
                                )?;
                                src.commit_balance(debited);
                                dst.commit_balance(credited);
                                Ok(settled)
                            }
                            // Underfunded source or an overflowing destination
                            // credit both settle the row as failed.
                            Err(err) => {
                                self.log.transition(
                                    tx_id,
                                    TransactionStatus::Failed,
                                    Some(err.to_string()),
                                )?;
                                Err(err)
                            }
                        }
                    })
            }
        }?;

        log::info!("tx {tx_id} approved by {}", principal.user);
        Ok(settled)
    }

    /// Reject a pending transaction; no balance effect
    ///
    /// # Errors
    ///
    /// Same as [`ApprovalWorkflow::approve`] for authorization, missing ids,
    /// and already-settled transactions.
    pub fn reject(
        &self,
        principal: &Principal,
        tx_id: TransactionId,
        reason: &str,
    ) -> Result<Transaction, LedgerError> {
        principal.require_admin("reject transaction")?;
        let rejected = self.log.transition(
            tx_id,
            TransactionStatus::Failed,
            Some(format!("rejected by {}: {reason}", principal.user)),
        )?;
        log::info!("tx {tx_id} rejected by {}", principal.user);
        Ok(rejected)
    }
}
