//! CSV format handling for transaction import and export
//!
//! This module centralizes the delimited-text format concerns:
//! - `ImportRecord` for deserializing raw import rows
//! - `ImportDraft`, the validated partial record the importer consumes
//! - Export serialization for transactions and wallet balances
//!
//! All functions are pure (no I/O) for easy testing.

use crate::types::{
    Amount, Transaction, TransactionId, TransactionKind, TransactionStatus, Wallet, WalletId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Raw CSV import row
///
/// Matches the import format with columns:
/// `id,kind,wallet,destination,amount,status,date,description,initiator,reference`.
/// Only `kind`, `wallet`, and `amount` are required; everything else is
/// defaulted downstream. The `id` column is accepted for round-trip
/// compatibility with exports but ignored — ids are always assigned by the
/// log.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ImportRecord {
    #[serde(default)]
    pub id: Option<TransactionId>,
    pub kind: String,
    pub wallet: WalletId,
    #[serde(default)]
    pub destination: Option<WalletId>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub initiator: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
}

/// Validated partial transaction record, ready for import routing
#[derive(Debug, Clone, PartialEq)]
pub struct ImportDraft {
    pub kind: TransactionKind,
    pub wallet: WalletId,
    pub destination: Option<WalletId>,
    pub amount: Amount,
    pub status: TransactionStatus,
    /// `None` means "now", decided at append time
    pub created_at: Option<DateTime<Utc>>,
    pub description: String,
    pub initiator: String,
    /// Generated by the importer when absent
    pub reference: Option<String>,
}

/// Convert a raw import row into a validated draft
///
/// Applies the defaulting rules: status defaults to pending, date to now
/// (represented as `None`), description to empty, initiator to `import`.
/// A transfer row must carry a destination.
///
/// # Errors
///
/// Returns an error message describing the offending field; line context is
/// added by the callers that know it.
pub fn convert_import_record(record: ImportRecord) -> Result<ImportDraft, String> {
    let kind = match record.kind.to_lowercase().as_str() {
        "deposit" => TransactionKind::Deposit,
        "withdrawal" => TransactionKind::Withdrawal,
        "transfer" => TransactionKind::Transfer,
        other => return Err(format!("invalid transaction kind '{other}'")),
    };

    let amount = match record.amount {
        Some(ref raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<Amount>()
            .map_err(|_| format!("invalid amount '{raw}' (expected integer minor units)"))?,
        _ => return Err(format!("{kind} row for wallet {} requires an amount", record.wallet)),
    };
    if amount == 0 {
        return Err(format!("{kind} row for wallet {} has zero amount", record.wallet));
    }

    let status = match record.status.as_deref().map(str::trim) {
        None | Some("") => TransactionStatus::Pending,
        Some(raw) => match raw.to_lowercase().as_str() {
            "pending" => TransactionStatus::Pending,
            "completed" => TransactionStatus::Completed,
            "failed" => TransactionStatus::Failed,
            other => return Err(format!("invalid status '{other}'")),
        },
    };

    let created_at = match record.date.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| format!("invalid date '{raw}': {e}"))?,
        ),
    };

    if kind == TransactionKind::Transfer && record.destination.is_none() {
        return Err(format!(
            "transfer row for wallet {} requires a destination",
            record.wallet
        ));
    }
    let destination = match kind {
        TransactionKind::Transfer => record.destination,
        _ => None,
    };

    Ok(ImportDraft {
        kind,
        wallet: record.wallet,
        destination,
        amount,
        status,
        created_at,
        description: record.description.unwrap_or_default(),
        initiator: record
            .initiator
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "import".to_string()),
        reference: record.reference.filter(|s| !s.is_empty()),
    })
}

/// Export row shape shared by the CSV and structured representations
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ExportRecord {
    pub id: TransactionId,
    pub kind: String,
    pub wallet: WalletId,
    pub destination: Option<WalletId>,
    pub amount: Amount,
    pub status: String,
    pub date: String,
    pub description: String,
    pub initiator: String,
    pub reference: String,
}

impl From<&Transaction> for ExportRecord {
    fn from(tx: &Transaction) -> Self {
        ExportRecord {
            id: tx.id,
            kind: tx.kind.to_string(),
            wallet: tx.source_wallet,
            destination: tx.destination_wallet,
            amount: tx.amount,
            status: tx.status.to_string(),
            date: tx.created_at.to_rfc3339(),
            description: tx.description.clone(),
            initiator: tx.initiator.clone(),
            reference: tx.reference.clone(),
        }
    }
}

/// Write transaction history as CSV
///
/// Rows are sorted by transaction id for deterministic output.
pub fn write_transactions_csv(
    transactions: &[Transaction],
    output: &mut dyn Write,
) -> Result<(), String> {
    let mut writer = csv::Writer::from_writer(output);

    let mut sorted: Vec<&Transaction> = transactions.iter().collect();
    sorted.sort_by_key(|tx| tx.id);

    for tx in sorted {
        writer
            .serialize(ExportRecord::from(tx))
            .map_err(|e| format!("failed to write transaction record: {e}"))?;
    }
    writer
        .flush()
        .map_err(|e| format!("failed to flush output: {e}"))?;
    Ok(())
}

/// Write wallet balances as CSV
///
/// Columns: `id,kind,balance,currency,archived`, sorted by wallet id.
pub fn write_wallets_csv(wallets: &[Wallet], output: &mut dyn Write) -> Result<(), String> {
    let mut writer = csv::Writer::from_writer(output);

    writer
        .write_record(["id", "kind", "balance", "currency", "archived"])
        .map_err(|e| format!("failed to write CSV header: {e}"))?;

    let mut sorted = wallets.to_vec();
    sorted.sort_by_key(|wallet| wallet.id);

    for wallet in sorted {
        writer
            .write_record(&[
                wallet.id.to_string(),
                wallet.kind.to_string(),
                wallet.balance.to_string(),
                wallet.currency.clone(),
                wallet.archived.to_string(),
            ])
            .map_err(|e| format!("failed to write wallet record: {e}"))?;
    }

    writer
        .flush()
        .map_err(|e| format!("failed to flush output: {e}"))?;
    Ok(())
}
