//! Error types for the wallet ledger
//!
//! This module defines all error types that can occur while operating on the
//! ledger. Errors carry enough context to be diagnosed from a log line alone.
//!
//! # Error Categories
//!
//! - **Lookup Errors**: wallet or transaction not found, archived wallet
//! - **Validation Errors**: non-positive amounts, missing fields, bad import rows
//! - **Balance Errors**: insufficient funds, arithmetic overflow
//! - **Lifecycle Errors**: approve/reject on a settled transaction, reused references
//! - **Access Errors**: privileged operation attempted by a non-admin caller
//! - **I/O Errors**: import/export file and CSV failures

use crate::types::transaction::{TransactionId, TransactionStatus};
use crate::types::wallet::{Amount, WalletId};
use thiserror::Error;

/// Main error type for the wallet ledger
///
/// Every fallible operation in the crate returns this enum. Validation
/// failures are rejected with no side effect; balance failures on withdrawal
/// and transfer additionally leave a `failed` transaction in the log for the
/// audit trail (see [`crate::core::TransactionProcessor`]).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// No wallet exists with the given id
    #[error("Wallet {wallet} not found")]
    WalletNotFound {
        /// The wallet id that was not found
        wallet: WalletId,
    },

    /// The wallet exists but has been archived
    ///
    /// Archived wallets keep their history and balance readable but reject
    /// any further balance mutation.
    #[error("Wallet {wallet} is archived")]
    WalletArchived {
        /// The archived wallet id
        wallet: WalletId,
    },

    /// No transaction exists with the given id
    #[error("Transaction {tx} not found")]
    TransactionNotFound {
        /// The transaction id that was not found
        tx: TransactionId,
    },

    /// Amount failed validation (zero amount, or a zero adjustment delta)
    ///
    /// Transaction amounts are strictly positive integers in minor currency
    /// units. This is rejected before any state is touched.
    #[error("Invalid amount {amount}: amounts must be strictly positive")]
    InvalidAmount {
        /// The offending amount or delta
        amount: i64,
    },

    /// The debit would make the wallet balance negative
    #[error("Insufficient funds in wallet {wallet}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        /// Wallet the debit was applied to
        wallet: WalletId,
        /// Balance at the time of the attempt, in minor units
        balance: Amount,
        /// Requested debit amount, in minor units
        requested: Amount,
    },

    /// Approve or reject was called on a transaction that is no longer pending
    ///
    /// `completed` and `failed` are terminal. Under concurrent approvals of
    /// the same transaction, exactly one caller wins and the rest get this.
    #[error("Transaction {tx} already processed (status: {status})")]
    AlreadyProcessed {
        /// The transaction id
        tx: TransactionId,
        /// Its current terminal status
        status: TransactionStatus,
    },

    /// An idempotency reference was reused with conflicting parameters
    ///
    /// Replaying a request with the same reference and identical parameters
    /// returns the original result; the same reference with different
    /// parameters is rejected with this error.
    #[error("Reference '{reference}' already used by a different transaction")]
    DuplicateReference {
        /// The reused idempotency reference
        reference: String,
    },

    /// A privileged operation was attempted by a non-admin principal
    #[error("User '{user}' is not authorized to {operation}")]
    Unauthorized {
        /// The calling user id
        user: String,
        /// The operation that was refused
        operation: String,
    },

    /// Transfer source and destination are the same wallet
    #[error("Cannot transfer from wallet {wallet} to itself")]
    SelfTransfer {
        /// The wallet id given for both legs
        wallet: WalletId,
    },

    /// Transfer legs use wallets with different currency codes
    ///
    /// Multi-currency conversion is out of scope; only same-currency
    /// transfers are legal.
    #[error(
        "Currency mismatch: source wallet holds {source_currency}, destination holds {destination_currency}"
    )]
    CurrencyMismatch {
        /// Source wallet currency code
        source_currency: String,
        /// Destination wallet currency code
        destination_currency: String,
    },

    /// The balance arithmetic would overflow
    ///
    /// The operation is rejected and the wallet is left unchanged.
    #[error("Arithmetic overflow in {operation} for wallet {wallet}")]
    AmountOverflow {
        /// Operation that would overflow
        operation: String,
        /// Affected wallet id
        wallet: WalletId,
    },

    /// A required field was absent (e.g. destination wallet on a transfer)
    #[error("Missing required field '{field}'")]
    MissingField {
        /// Name of the missing field
        field: String,
    },

    /// A CSV row could not be parsed during import
    ///
    /// Recoverable: the row is skipped and import continues.
    #[error("Parse error{}: {message}", line.map(|l| format!(" at line {l}")).unwrap_or_default())]
    ParseError {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },

    /// I/O error while reading or writing files
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O error
        message: String,
    },
}

impl From<std::io::Error> for LedgerError {
    fn from(error: std::io::Error) -> Self {
        LedgerError::IoError {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for LedgerError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        LedgerError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl LedgerError {
    /// Create a WalletNotFound error
    pub fn wallet_not_found(wallet: WalletId) -> Self {
        LedgerError::WalletNotFound { wallet }
    }

    /// Create a WalletArchived error
    pub fn wallet_archived(wallet: WalletId) -> Self {
        LedgerError::WalletArchived { wallet }
    }

    /// Create a TransactionNotFound error
    pub fn transaction_not_found(tx: TransactionId) -> Self {
        LedgerError::TransactionNotFound { tx }
    }

    /// Create an InvalidAmount error
    pub fn invalid_amount(amount: i64) -> Self {
        LedgerError::InvalidAmount { amount }
    }

    /// Create an InsufficientFunds error
    pub fn insufficient_funds(wallet: WalletId, balance: Amount, requested: Amount) -> Self {
        LedgerError::InsufficientFunds {
            wallet,
            balance,
            requested,
        }
    }

    /// Create an AlreadyProcessed error
    pub fn already_processed(tx: TransactionId, status: TransactionStatus) -> Self {
        LedgerError::AlreadyProcessed { tx, status }
    }

    /// Create a DuplicateReference error
    pub fn duplicate_reference(reference: &str) -> Self {
        LedgerError::DuplicateReference {
            reference: reference.to_string(),
        }
    }

    /// Create an Unauthorized error
    pub fn unauthorized(user: &str, operation: &str) -> Self {
        LedgerError::Unauthorized {
            user: user.to_string(),
            operation: operation.to_string(),
        }
    }

    /// Create an AmountOverflow error
    pub fn amount_overflow(operation: &str, wallet: WalletId) -> Self {
        LedgerError::AmountOverflow {
            operation: operation.to_string(),
            wallet,
        }
    }

    /// Create a CurrencyMismatch error
    pub fn currency_mismatch(source_currency: &str, destination_currency: &str) -> Self {
        LedgerError::CurrencyMismatch {
            source_currency: source_currency.to_string(),
            destination_currency: destination_currency.to_string(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: &str) -> Self {
        LedgerError::MissingField {
            field: field.to_string(),
        }
    }

    /// Create a ParseError
    pub fn parse_error(line: Option<u64>, message: &str) -> Self {
        LedgerError::ParseError {
            line,
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::wallet_not_found(
        LedgerError::WalletNotFound { wallet: 7 },
        "Wallet 7 not found"
    )]
    #[case::wallet_archived(
        LedgerError::WalletArchived { wallet: 3 },
        "Wallet 3 is archived"
    )]
    #[case::transaction_not_found(
        LedgerError::TransactionNotFound { tx: 999 },
        "Transaction 999 not found"
    )]
    #[case::invalid_amount(
        LedgerError::InvalidAmount { amount: 0 },
        "Invalid amount 0: amounts must be strictly positive"
    )]
    #[case::insufficient_funds(
        LedgerError::InsufficientFunds { wallet: 1, balance: 100_000, requested: 150_000 },
        "Insufficient funds in wallet 1: balance 100000, requested 150000"
    )]
    #[case::already_processed(
        LedgerError::AlreadyProcessed { tx: 42, status: TransactionStatus::Completed },
        "Transaction 42 already processed (status: completed)"
    )]
    #[case::duplicate_reference(
        LedgerError::DuplicateReference { reference: "dep-001".to_string() },
        "Reference 'dep-001' already used by a different transaction"
    )]
    #[case::unauthorized(
        LedgerError::Unauthorized { user: "investor-9".to_string(), operation: "approve".to_string() },
        "User 'investor-9' is not authorized to approve"
    )]
    #[case::self_transfer(
        LedgerError::SelfTransfer { wallet: 5 },
        "Cannot transfer from wallet 5 to itself"
    )]
    #[case::currency_mismatch(
        LedgerError::CurrencyMismatch { source_currency: "NGN".to_string(), destination_currency: "USD".to_string() },
        "Currency mismatch: source wallet holds NGN, destination holds USD"
    )]
    #[case::parse_error_with_line(
        LedgerError::ParseError { line: Some(12), message: "bad kind".to_string() },
        "Parse error at line 12: bad kind"
    )]
    #[case::parse_error_without_line(
        LedgerError::ParseError { line: None, message: "bad kind".to_string() },
        "Parse error: bad kind"
    )]
    fn test_error_display(#[case] error: LedgerError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    #[case::insufficient_funds(
        LedgerError::insufficient_funds(1, 100, 200),
        LedgerError::InsufficientFunds { wallet: 1, balance: 100, requested: 200 }
    )]
    #[case::already_processed(
        LedgerError::already_processed(9, TransactionStatus::Failed),
        LedgerError::AlreadyProcessed { tx: 9, status: TransactionStatus::Failed }
    )]
    #[case::unauthorized(
        LedgerError::unauthorized("u1", "reject"),
        LedgerError::Unauthorized { user: "u1".to_string(), operation: "reject".to_string() }
    )]
    #[case::amount_overflow(
        LedgerError::amount_overflow("deposit", 2),
        LedgerError::AmountOverflow { operation: "deposit".to_string(), wallet: 2 }
    )]
    #[case::currency_mismatch(
        LedgerError::currency_mismatch("NGN", "USD"),
        LedgerError::CurrencyMismatch {
            source_currency: "NGN".to_string(),
            destination_currency: "USD".to_string(),
        }
    )]
    fn test_helper_functions(#[case] result: LedgerError, #[case] expected: LedgerError) {
        assert_eq!(result, expected);
    }

    // Currency codes are plain data, not an error chain.
    #[test]
    fn test_currency_mismatch_has_no_error_source() {
        let error = LedgerError::currency_mismatch("NGN", "USD");
        assert!(std::error::Error::source(&error).is_none());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error: LedgerError = io_error.into();
        assert!(matches!(error, LedgerError::IoError { .. }));
        assert_eq!(error.to_string(), "I/O error: denied");
    }
}
