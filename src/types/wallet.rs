//! Wallet types for the custodial ledger
//!
//! This module defines the Wallet record and the checked balance arithmetic
//! every mutation must go through.

use crate::types::error::LedgerError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Wallet identifier
pub type WalletId = u64;

/// Money amount in minor currency units (e.g. kobo)
///
/// Balances and transaction amounts are unsigned integers, which makes the
/// non-negative balance invariant structural rather than checked.
pub type Amount = u64;

/// Purpose a wallet's funds are held for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletKind {
    /// General spendable balance
    Main,
    /// Funds committed to an investment but not yet settled
    Escrow,
    /// Referral and bonus payouts
    Rewards,
}

impl std::fmt::Display for WalletKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WalletKind::Main => write!(f, "main"),
            WalletKind::Escrow => write!(f, "escrow"),
            WalletKind::Rewards => write!(f, "rewards"),
        }
    }
}

/// A custodial wallet holding a single-currency balance
///
/// Wallets are created once by administrative provisioning and never hard
/// deleted; retiring a wallet sets `archived`, which blocks further balance
/// mutation while keeping balance and history readable.
///
/// The stored balance is a materialization of the transaction log: at every
/// quiescent point it equals the sum of completed credits minus completed
/// debits (verified by [`crate::core::ReconciliationEngine`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    /// Unique wallet id
    pub id: WalletId,

    /// What the funds in this wallet are held for
    pub kind: WalletKind,

    /// Current balance in minor currency units
    ///
    /// Mutated only through [`crate::core::WalletStore`]; every write happens
    /// inside that wallet's critical section.
    pub balance: Amount,

    /// ISO-4217 currency code (e.g. "NGN")
    pub currency: String,

    /// Timestamp of the last balance mutation
    pub last_updated: DateTime<Utc>,

    /// Whether the wallet has been retired
    pub archived: bool,
}

impl Wallet {
    /// Create a new wallet with a zero balance
    pub fn new(id: WalletId, kind: WalletKind, currency: &str) -> Self {
        Wallet {
            id,
            kind,
            balance: 0,
            currency: currency.to_string(),
            last_updated: Utc::now(),
            archived: false,
        }
    }

    /// Fail with `WalletArchived` if this wallet has been retired
    pub fn ensure_active(&self) -> Result<(), LedgerError> {
        if self.archived {
            return Err(LedgerError::wallet_archived(self.id));
        }
        Ok(())
    }

    /// Compute the balance after crediting `amount`, without committing it
    ///
    /// # Errors
    ///
    /// Returns `AmountOverflow` if the credit would overflow the balance.
    pub fn balance_after_credit(&self, amount: Amount) -> Result<Amount, LedgerError> {
        self.balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::amount_overflow("credit", self.id))
    }

    /// Compute the balance after debiting `amount`, without committing it
    ///
    /// # Errors
    ///
    /// Returns `InsufficientFunds` if the debit would make the balance
    /// negative.
    pub fn balance_after_debit(&self, amount: Amount) -> Result<Amount, LedgerError> {
        self.balance
            .checked_sub(amount)
            .ok_or_else(|| LedgerError::insufficient_funds(self.id, self.balance, amount))
    }

    /// Commit a previously computed balance and bump `last_updated`
    ///
    /// Callers compute the new balance with [`Self::balance_after_credit`] or
    /// [`Self::balance_after_debit`] first, record the transaction, then
    /// commit. Committing last means a failed record append never leaves a
    /// balance change behind.
    pub fn commit_balance(&mut self, balance: Amount) {
        self.balance = balance;
        self.last_updated = Utc::now();
    }
}
