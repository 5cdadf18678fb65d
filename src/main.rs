//! Wallet Ledger CLI
//!
//! Bulk-imports transaction rows from a CSV file into an in-memory ledger,
//! then reports the resulting wallet balances.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- transactions.csv > wallets.csv
//! cargo run -- --strategy sync transactions.csv > wallets.csv
//! cargo run -- --strategy async --batch-size 2000 --max-concurrent 8 transactions.csv > wallets.csv
//! ```
//!
//! Wallets referenced by the file are provisioned up front with zero
//! balances (bootstrap mode), so `completed` rows can apply their balance
//! effects in order. After the import, every wallet is reconciled against
//! its history; discrepancies go to stderr, balances as CSV to stdout.
//!
//! # Exit codes
//!
//! - 0: success (skipped rows are reported but not fatal)
//! - 1: fatal error (file not found, unreadable input, I/O failure)

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::BTreeSet;
use std::path::Path;
use std::process;
use tokio_util::compat::TokioAsyncReadCompatExt;
use wallet_ledger::cli::{CliArgs, StrategyType};
use wallet_ledger::core::{ImportSummary, Ledger};
use wallet_ledger::io::{write_wallets_csv, AsyncReader, SyncReader};
use wallet_ledger::types::{Wallet, WalletKind};

/// Currency assigned to bootstrapped wallets
const DEFAULT_CURRENCY: &str = "NGN";

fn main() {
    env_logger::init();
    let args = CliArgs::parse();

    if let Err(e) = run(&args) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(args: &CliArgs) -> Result<()> {
    let ledger = Ledger::new();
    bootstrap_wallets(&ledger, &args.input_file)?;

    let batch_id = format!("import-{}", Utc::now().format("%Y%m%dT%H%M%SZ"));
    let summary = match args.strategy {
        StrategyType::Sync => import_sync(&ledger, &args.input_file, &batch_id)?,
        StrategyType::Async => import_async(&ledger, args, &batch_id)?,
    };
    log::info!(
        "batch {}: {} imported ({} pending, {} completed, {} failed attempts, {} audit rows), {} skipped",
        summary.batch_id,
        summary.imported(),
        summary.pending,
        summary.completed,
        summary.failed_attempts,
        summary.audit_rows,
        summary.skipped.len()
    );

    for report in ledger.reconciliation.reconcile_all()? {
        if !report.is_balanced() {
            eprintln!(
                "reconciliation: wallet {} stored {} but history sums to {} (discrepancy {})",
                report.wallet_id, report.actual_balance, report.expected_balance, report.discrepancy
            );
        }
    }

    let mut stdout = std::io::stdout();
    write_wallets_csv(&ledger.wallets.all(), &mut stdout).map_err(anyhow::Error::msg)?;
    Ok(())
}

/// Provision every wallet the import file references, with zero balances
///
/// Rows that fail to parse are skipped here too; the import pass reports
/// them properly.
fn bootstrap_wallets(ledger: &Ledger, path: &Path) -> Result<()> {
    let reader = SyncReader::new(path)?;
    let mut ids = BTreeSet::new();
    for draft in reader.flatten() {
        ids.insert(draft.wallet);
        if let Some(destination) = draft.destination {
            ids.insert(destination);
        }
    }

    for id in ids {
        ledger
            .wallets
            .restore(Wallet::new(id, WalletKind::Main, DEFAULT_CURRENCY))?;
    }
    log::debug!("bootstrapped {} wallet(s)", ledger.wallets.len());
    Ok(())
}

fn import_sync(ledger: &Ledger, path: &Path, batch_id: &str) -> Result<ImportSummary> {
    let reader = SyncReader::new(path)?;
    Ok(ledger.importer.import(reader, batch_id))
}

/// Batched async import: the reader streams batches while up to
/// `max_concurrent` of them run through the importer on blocking threads.
fn import_async(ledger: &Ledger, args: &CliArgs, batch_id: &str) -> Result<ImportSummary> {
    let config = args.to_batch_config();
    let runtime = tokio::runtime::Runtime::new().context("failed to build tokio runtime")?;

    runtime.block_on(async {
        let file = tokio::fs::File::open(&args.input_file)
            .await
            .with_context(|| format!("failed to open '{}'", args.input_file.display()))?;
        let mut reader = AsyncReader::new(file.compat());

        let mut in_flight = FuturesUnordered::new();
        let mut total = ImportSummary {
            batch_id: batch_id.to_string(),
            ..ImportSummary::default()
        };

        loop {
            let batch = reader.read_batch(config.batch_size).await;
            if batch.is_empty() {
                break;
            }

            let importer = ledger.importer.clone();
            let id = batch_id.to_string();
            in_flight.push(tokio::task::spawn_blocking(move || {
                importer.import(batch.into_iter().map(Ok), &id)
            }));

            if in_flight.len() >= config.max_concurrent_batches {
                if let Some(done) = in_flight.next().await {
                    merge(&mut total, done.context("import batch task panicked")?);
                }
            }
        }

        while let Some(done) = in_flight.next().await {
            merge(&mut total, done.context("import batch task panicked")?);
        }

        Ok(total)
    })
}

fn merge(total: &mut ImportSummary, chunk: ImportSummary) {
    total.pending += chunk.pending;
    total.completed += chunk.completed;
    total.failed_attempts += chunk.failed_attempts;
    total.audit_rows += chunk.audit_rows;
    total.skipped.extend(chunk.skipped);
}
