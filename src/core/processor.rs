//! Money-movement operations with atomicity and idempotency guarantees
//!
//! The `TransactionProcessor` is the only component that both moves balances
//! and writes history. Every operation follows the same shape:
//!
//! 1. Validate inputs (no side effect on failure).
//! 2. Check the idempotency reference; a replay with identical parameters
//!    returns the recorded transaction without touching any balance.
//! 3. Inside the wallet critical section: compute the prospective balance,
//!    append the transaction row, then commit the balance. The append comes
//!    before the commit, so a duplicate reference detected at append time
//!    never leaves a balance change behind.
//!
//! Attempted money movement that passed validation but failed to apply
//! (insufficient funds, currency mismatch, missing transfer leg) is recorded
//! as a `Failed` row so the audit trail shows the attempt. Pure validation
//! failures leave no trace.

use crate::core::{TransactionLog, WalletStore};
use crate::types::{
    Amount, LedgerError, Principal, Transaction, TransactionDraft, TransactionKind,
    TransactionMeta, TransactionStatus, WalletId,
};
use std::sync::Arc;

/// Executes deposits, withdrawals, and transfers against the ledger
#[derive(Debug, Clone)]
pub struct TransactionProcessor {
    wallets: Arc<WalletStore>,
    log: Arc<TransactionLog>,
}

impl TransactionProcessor {
    pub fn new(wallets: Arc<WalletStore>, log: Arc<TransactionLog>) -> Self {
        TransactionProcessor { wallets, log }
    }

    /// Credit a wallet and record a completed deposit
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if the amount is zero
    /// - `WalletNotFound` / `WalletArchived` for a missing or retired wallet
    /// - `AmountOverflow` if the credit would overflow the balance
    /// - `DuplicateReference` if the reference is bound to a transaction with
    ///   different parameters
    ///
    /// None of these leave any side effect.
    pub fn deposit(
        &self,
        wallet: WalletId,
        amount: Amount,
        meta: TransactionMeta,
    ) -> Result<Transaction, LedgerError> {
        validate_amount(amount)?;
        if let Some(existing) = self.log.find_by_reference(&meta.reference) {
            return resolve_replay(existing, TransactionKind::Deposit, wallet, None, amount);
        }

        let result = self.wallets.with_wallet(wallet, |w| {
            w.ensure_active()?;
            let new_balance = w.balance_after_credit(amount)?;
            let tx = self.log.append(TransactionDraft::from_meta(
                TransactionKind::Deposit,
                wallet,
                None,
                amount,
                TransactionStatus::Completed,
                &meta,
            ))?;
            w.commit_balance(new_balance);
            Ok(tx)
        });

        match result {
            Err(LedgerError::DuplicateReference { .. }) => {
                self.replay_after_race(TransactionKind::Deposit, wallet, None, amount, &meta)
            }
            other => other,
        }
    }

    /// Debit a wallet and record a completed withdrawal
    ///
    /// An attempt that fails the sufficient-funds check leaves the balance
    /// unchanged, records a `Failed` transaction for audit, and surfaces
    /// `InsufficientFunds` to the caller.
    pub fn withdraw(
        &self,
        wallet: WalletId,
        amount: Amount,
        meta: TransactionMeta,
    ) -> Result<Transaction, LedgerError> {
        validate_amount(amount)?;
        if let Some(existing) = self.log.find_by_reference(&meta.reference) {
            return resolve_replay(existing, TransactionKind::Withdrawal, wallet, None, amount);
        }

        let result = self.wallets.with_wallet(wallet, |w| {
            w.ensure_active()?;
            let new_balance = w.balance_after_debit(amount)?;
            let tx = self.log.append(TransactionDraft::from_meta(
                TransactionKind::Withdrawal,
                wallet,
                None,
                amount,
                TransactionStatus::Completed,
                &meta,
            ))?;
            w.commit_balance(new_balance);
            Ok(tx)
        });

        match result {
            Err(err @ LedgerError::InsufficientFunds { .. }) => {
                self.record_failed_attempt(TransactionKind::Withdrawal, wallet, None, amount, &meta, err)
            }
            Err(LedgerError::DuplicateReference { .. }) => {
                self.replay_after_race(TransactionKind::Withdrawal, wallet, None, amount, &meta)
            }
            other => other,
        }
    }

    /// Move funds between two wallets as one atomic unit
    ///
    /// Debit and credit either both apply or neither does; exactly one
    /// transfer row represents the pair. Both wallet locks are held for the
    /// duration, acquired in ascending id order, so opposite-direction
    /// transfers cannot deadlock.
    ///
    /// A missing wallet leg, a currency mismatch, or insufficient source
    /// funds changes no balance, records a `Failed` transfer for audit, and
    /// surfaces the error.
    pub fn transfer(
        &self,
        source: WalletId,
        destination: WalletId,
        amount: Amount,
        meta: TransactionMeta,
    ) -> Result<Transaction, LedgerError> {
        validate_amount(amount)?;
        if let Some(existing) = self.log.find_by_reference(&meta.reference) {
            return resolve_replay(
                existing,
                TransactionKind::Transfer,
                source,
                Some(destination),
                amount,
            );
        }

        let result = self.wallets.with_wallet_pair(source, destination, |src, dst| {
            src.ensure_active()?;
            dst.ensure_active()?;
            if src.currency != dst.currency {
                return Err(LedgerError::currency_mismatch(&src.currency, &dst.currency));
            }
            let debited = src.balance_after_debit(amount)?;
            let credited = dst.balance_after_credit(amount)?;
            let tx = self.log.append(TransactionDraft::from_meta(
                TransactionKind::Transfer,
                source,
                Some(destination),
                amount,
                TransactionStatus::Completed,
                &meta,
            ))?;
            src.commit_balance(debited);
            dst.commit_balance(credited);
            Ok(tx)
        });

        match result {
            Err(
                err @ (LedgerError::InsufficientFunds { .. }
                | LedgerError::CurrencyMismatch { .. }
                | LedgerError::WalletNotFound { .. }),
            ) => self.record_failed_attempt(
                TransactionKind::Transfer,
                source,
                Some(destination),
                amount,
                &meta,
                err,
            ),
            Err(LedgerError::DuplicateReference { .. }) => self.replay_after_race(
                TransactionKind::Transfer,
                source,
                Some(destination),
                amount,
                &meta,
            ),
            other => other,
        }
    }

    /// Record a pending transaction for later approval, with no balance effect
    ///
    /// Validates the amount and the existence of every wallet leg, then
    /// appends a `Pending` row. The balance delta is applied only when the
    /// approval workflow settles it.
    pub fn submit_pending(
        &self,
        kind: TransactionKind,
        wallet: WalletId,
        destination: Option<WalletId>,
        amount: Amount,
        meta: TransactionMeta,
    ) -> Result<Transaction, LedgerError> {
        validate_amount(amount)?;
        let destination = match kind {
            TransactionKind::Transfer => {
                let dest =
                    destination.ok_or_else(|| LedgerError::missing_field("destination"))?;
                if dest == wallet {
                    return Err(LedgerError::SelfTransfer { wallet });
                }
                if !self.wallets.contains(dest) {
                    return Err(LedgerError::wallet_not_found(dest));
                }
                Some(dest)
            }
            _ => None,
        };
        if !self.wallets.contains(wallet) {
            return Err(LedgerError::wallet_not_found(wallet));
        }

        if let Some(existing) = self.log.find_by_reference(&meta.reference) {
            return resolve_replay(existing, kind, wallet, destination, amount);
        }

        let result = self.log.append(TransactionDraft::from_meta(
            kind,
            wallet,
            destination,
            amount,
            TransactionStatus::Pending,
            &meta,
        ));
        match result {
            Err(LedgerError::DuplicateReference { .. }) => {
                self.replay_after_race(kind, wallet, destination, amount, &meta)
            }
            other => other,
        }
    }

    /// Apply an explicitly audited correction to a wallet's balance
    ///
    /// This is the one sanctioned way to fix reconciliation drift: an
    /// ordinary completed deposit (positive delta) or withdrawal (negative
    /// delta) carrying the correction's description and reference. Admin
    /// only.
    pub fn adjust(
        &self,
        principal: &Principal,
        wallet: WalletId,
        delta: i64,
        meta: TransactionMeta,
    ) -> Result<Transaction, LedgerError> {
        principal.require_admin("manual adjustment")?;
        if delta == 0 {
            return Err(LedgerError::invalid_amount(0));
        }
        log::info!(
            "manual adjustment of {delta} on wallet {wallet} by {}: {}",
            principal.user,
            meta.description
        );
        if delta > 0 {
            self.deposit(wallet, delta as u64, meta)
        } else {
            self.withdraw(wallet, delta.unsigned_abs(), meta)
        }
    }

    /// Append a `Failed` audit row for an attempt that could not apply
    ///
    /// If the reference is already bound, a racing request with the same
    /// reference got there first (it may even have completed: its balance
    /// effect can be what starved this one). That row is the result of
    /// record, so the collision resolves as a replay rather than surfacing
    /// the locally computed error.
    fn record_failed_attempt(
        &self,
        kind: TransactionKind,
        source: WalletId,
        destination: Option<WalletId>,
        amount: Amount,
        meta: &TransactionMeta,
        cause: LedgerError,
    ) -> Result<Transaction, LedgerError> {
        log::warn!("recording failed {kind} attempt on wallet {source}: {cause}");
        let draft = TransactionDraft::from_meta(
            kind,
            source,
            destination,
            amount,
            TransactionStatus::Failed,
            meta,
        )
        .failed(&cause.to_string());
        match self.log.append(draft) {
            Ok(_) => Err(cause),
            Err(LedgerError::DuplicateReference { .. }) => {
                log::warn!(
                    "reference {} already recorded by a racing request",
                    meta.reference
                );
                self.replay_after_race(kind, source, destination, amount, meta)
            }
            Err(append_err) => {
                log::warn!("could not record failed attempt: {append_err}");
                Err(cause)
            }
        }
    }

    /// Resolve a reference collision that surfaced inside the critical section
    ///
    /// Two first submissions racing on the same reference serialize on the
    /// wallet lock; the loser lands here and treats the winner's row as the
    /// replay target.
    fn replay_after_race(
        &self,
        kind: TransactionKind,
        source: WalletId,
        destination: Option<WalletId>,
        amount: Amount,
        meta: &TransactionMeta,
    ) -> Result<Transaction, LedgerError> {
        match self.log.find_by_reference(&meta.reference) {
            Some(existing) => resolve_replay(existing, kind, source, destination, amount),
            None => Err(LedgerError::duplicate_reference(&meta.reference)),
        }
    }
}

fn validate_amount(amount: Amount) -> Result<(), LedgerError> {
    if amount == 0 {
        return Err(LedgerError::invalid_amount(0));
    }
    Ok(())
}

/// Decide whether an existing row with this reference is a replay or a conflict
fn resolve_replay(
    existing: Transaction,
    kind: TransactionKind,
    source: WalletId,
    destination: Option<WalletId>,
    amount: Amount,
) -> Result<Transaction, LedgerError> {
    if existing.kind == kind
        && existing.source_wallet == source
        && existing.destination_wallet == destination
        && existing.amount == amount
    {
        log::debug!(
            "idempotent replay of reference {} returned tx {}",
            existing.reference,
            existing.id
        );
        Ok(existing)
    } else {
        Err(LedgerError::duplicate_reference(&existing.reference))
    }
}
