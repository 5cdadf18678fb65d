//! Bulk import of partial transaction records
//!
//! Imported rows go through exactly the same status and balance rules as
//! interactive operations:
//!
//! - `pending` rows (the default) are submitted for approval, no balance
//!   effect yet
//! - `completed` rows are replayed through the processor, so the balance
//!   effect is actually applied — a row is never marked completed without
//!   the corresponding balance application
//! - `failed` rows are appended verbatim, audit trail only
//!
//! Every row lands tagged with the run's batch id; `purge` is the one
//! separately-audited path that deletes those rows again. Malformed or
//! rejected rows are collected per line and logged; the import keeps going.

use crate::core::{TransactionLog, TransactionProcessor};
use crate::io::ImportDraft;
use crate::types::{
    LedgerError, Principal, TransactionDraft, TransactionKind, TransactionMeta,
    TransactionStatus,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Outcome of one import run
#[derive(Debug, Clone, Default)]
pub struct ImportSummary {
    /// Batch tag all imported rows carry
    pub batch_id: String,
    /// Pending rows submitted for approval
    pub pending: usize,
    /// Completed rows whose balance effect was applied
    pub completed: usize,
    /// Replayed rows that failed business rules (recorded as failed attempts)
    pub failed_attempts: usize,
    /// Failed rows appended for audit only
    pub audit_rows: usize,
    /// Per-row errors for rows that left no trace in the log
    pub skipped: Vec<LedgerError>,
}

impl ImportSummary {
    /// Rows that landed in the log, in any status
    pub fn imported(&self) -> usize {
        self.pending + self.completed + self.failed_attempts + self.audit_rows
    }
}

/// Routes partial records into the ledger under a batch tag
#[derive(Debug, Clone)]
pub struct BulkImporter {
    processor: TransactionProcessor,
    log: Arc<TransactionLog>,

    /// Generator for references of rows that arrive without one; shared
    /// across clones so concurrent chunks of one run never collide
    seq: Arc<AtomicU64>,
}

impl BulkImporter {
    pub fn new(processor: TransactionProcessor, log: Arc<TransactionLog>) -> Self {
        BulkImporter {
            processor,
            log,
            seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Import a stream of parsed rows under the given batch id
    ///
    /// Row errors (parse failures from the reader, or rows the processor
    /// rejects without recording) are logged and collected in the summary;
    /// processing continues. References are generated as `<batch>-<n>` when
    /// a row does not carry its own.
    pub fn import<I>(&self, rows: I, batch_id: &str) -> ImportSummary
    where
        I: IntoIterator<Item = Result<ImportDraft, LedgerError>>,
    {
        let mut summary = ImportSummary {
            batch_id: batch_id.to_string(),
            ..ImportSummary::default()
        };

        for (row_num, row) in rows.into_iter().enumerate() {
            let draft = match row {
                Ok(draft) => draft,
                Err(err) => {
                    log::warn!("import batch {batch_id}: skipping row: {err}");
                    summary.skipped.push(err);
                    continue;
                }
            };
            if let Err(err) = self.import_row(draft, batch_id, &mut summary) {
                log::warn!("import batch {batch_id}: row {} rejected: {err}", row_num + 1);
                summary.skipped.push(err);
            }
        }

        log::info!(
            "import batch {batch_id}: {} row(s) imported, {} skipped",
            summary.imported(),
            summary.skipped.len()
        );
        summary
    }

    fn import_row(
        &self,
        draft: ImportDraft,
        batch_id: &str,
        summary: &mut ImportSummary,
    ) -> Result<(), LedgerError> {
        let meta = TransactionMeta {
            description: draft.description.clone(),
            initiator: draft.initiator.clone(),
            reference: draft.reference.clone().unwrap_or_else(|| {
                format!("{batch_id}-{}", self.seq.fetch_add(1, Ordering::Relaxed) + 1)
            }),
            import_batch: Some(batch_id.to_string()),
            created_at: draft.created_at,
        };

        match draft.status {
            TransactionStatus::Pending => {
                self.processor.submit_pending(
                    draft.kind,
                    draft.wallet,
                    draft.destination,
                    draft.amount,
                    meta,
                )?;
                summary.pending += 1;
                Ok(())
            }
            TransactionStatus::Completed => {
                let reference = meta.reference.clone();
                let result = match draft.kind {
                    TransactionKind::Deposit => {
                        self.processor.deposit(draft.wallet, draft.amount, meta)
                    }
                    TransactionKind::Withdrawal => {
                        self.processor.withdraw(draft.wallet, draft.amount, meta)
                    }
                    TransactionKind::Transfer => {
                        let destination = draft
                            .destination
                            .ok_or_else(|| LedgerError::missing_field("destination"))?;
                        self.processor
                            .transfer(draft.wallet, destination, draft.amount, meta)
                    }
                };
                match result {
                    Ok(_) => {
                        summary.completed += 1;
                        Ok(())
                    }
                    Err(err) => {
                        // An attempt the processor recorded as a failed row
                        // counts as imported, not skipped.
                        if self.log.find_by_reference(&reference).is_some() {
                            summary.failed_attempts += 1;
                            Ok(())
                        } else {
                            Err(err)
                        }
                    }
                }
            }
            TransactionStatus::Failed => {
                let record = TransactionDraft::from_meta(
                    draft.kind,
                    draft.wallet,
                    draft.destination,
                    draft.amount,
                    TransactionStatus::Failed,
                    &meta,
                )
                .failed("imported as failed");
                self.log.append(record)?;
                summary.audit_rows += 1;
                Ok(())
            }
        }
    }

    /// Delete every row a previous import run created; admin only
    ///
    /// Returns the number of rows removed. Balances are untouched: purging
    /// a batch whose completed rows moved money leaves that movement in
    /// place, to be corrected (if needed) by explicit adjustments.
    pub fn purge(&self, principal: &Principal, batch_id: &str) -> Result<usize, LedgerError> {
        principal.require_admin("purge import batch")?;
        let removed = self.log.purge_batch(batch_id);
        log::info!(
            "import batch {batch_id}: {} row(s) purged by {}",
            removed,
            principal.user
        );
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{TransactionFilter, WalletStore};
    use crate::types::{WalletId, WalletKind};

    struct Fixture {
        wallets: Arc<WalletStore>,
        log: Arc<TransactionLog>,
        importer: BulkImporter,
        w1: WalletId,
        w2: WalletId,
    }

    fn fixture() -> Fixture {
        let wallets = Arc::new(WalletStore::new());
        let log = Arc::new(TransactionLog::new());
        let processor = TransactionProcessor::new(Arc::clone(&wallets), Arc::clone(&log));
        let importer = BulkImporter::new(processor, Arc::clone(&log));
        let w1 = wallets.provision(WalletKind::Main, "NGN").id;
        let w2 = wallets.provision(WalletKind::Escrow, "NGN").id;
        Fixture {
            wallets,
            log,
            importer,
            w1,
            w2,
        }
    }

    fn draft(kind: TransactionKind, wallet: WalletId, amount: u64, status: TransactionStatus) -> ImportDraft {
        ImportDraft {
            kind,
            wallet,
            destination: None,
            amount,
            status,
            created_at: None,
            description: String::new(),
            initiator: "import".to_string(),
            reference: None,
        }
    }

    #[test]
    fn test_completed_rows_apply_balance_effects() {
        let fx = fixture();
        let mut transfer = draft(TransactionKind::Transfer, fx.w1, 30_000, TransactionStatus::Completed);
        transfer.destination = Some(fx.w2);

        let summary = fx.importer.import(
            vec![
                Ok(draft(TransactionKind::Deposit, fx.w1, 100_000, TransactionStatus::Completed)),
                Ok(transfer),
            ],
            "batch-1",
        );

        assert_eq!(summary.completed, 2);
        assert!(summary.skipped.is_empty());
        assert_eq!(fx.wallets.get(fx.w1).unwrap().balance, 70_000);
        assert_eq!(fx.wallets.get(fx.w2).unwrap().balance, 30_000);
    }

    #[test]
    fn test_pending_rows_carry_no_balance_effect() {
        let fx = fixture();
        let summary = fx.importer.import(
            vec![Ok(draft(TransactionKind::Deposit, fx.w1, 100_000, TransactionStatus::Pending))],
            "batch-1",
        );

        assert_eq!(summary.pending, 1);
        assert_eq!(fx.wallets.get(fx.w1).unwrap().balance, 0);
        let row = &fx.log.all()[0];
        assert_eq!(row.status, TransactionStatus::Pending);
        assert_eq!(row.import_batch.as_deref(), Some("batch-1"));
    }

    #[test]
    fn test_underfunded_completed_row_becomes_failed_attempt() {
        let fx = fixture();
        let summary = fx.importer.import(
            vec![Ok(draft(TransactionKind::Withdrawal, fx.w1, 50_000, TransactionStatus::Completed))],
            "batch-1",
        );

        assert_eq!(summary.failed_attempts, 1);
        assert!(summary.skipped.is_empty());
        assert_eq!(fx.wallets.get(fx.w1).unwrap().balance, 0);
        assert_eq!(fx.log.all()[0].status, TransactionStatus::Failed);
    }

    #[test]
    fn test_failed_rows_are_audit_only() {
        let fx = fixture();
        let summary = fx.importer.import(
            vec![Ok(draft(TransactionKind::Withdrawal, fx.w1, 10_000, TransactionStatus::Failed))],
            "batch-1",
        );

        assert_eq!(summary.audit_rows, 1);
        assert_eq!(fx.wallets.get(fx.w1).unwrap().balance, 0);
    }

    #[test]
    fn test_bad_rows_are_skipped_and_processing_continues() {
        let fx = fixture();
        let summary = fx.importer.import(
            vec![
                Err(LedgerError::parse_error(Some(2), "bad row")),
                Ok(draft(TransactionKind::Deposit, 404, 1_000, TransactionStatus::Completed)),
                Ok(draft(TransactionKind::Deposit, fx.w1, 1_000, TransactionStatus::Completed)),
            ],
            "batch-1",
        );

        assert_eq!(summary.skipped.len(), 2);
        assert_eq!(summary.completed, 1);
        assert_eq!(fx.wallets.get(fx.w1).unwrap().balance, 1_000);
    }

    #[test]
    fn test_generated_references_are_per_batch_row() {
        let fx = fixture();
        fx.importer.import(
            vec![
                Ok(draft(TransactionKind::Deposit, fx.w1, 1_000, TransactionStatus::Completed)),
                Ok(draft(TransactionKind::Deposit, fx.w1, 2_000, TransactionStatus::Completed)),
            ],
            "batch-9",
        );

        assert!(fx.log.find_by_reference("batch-9-1").is_some());
        assert!(fx.log.find_by_reference("batch-9-2").is_some());
    }

    #[test]
    fn test_reimporting_same_references_is_idempotent() {
        let fx = fixture();
        let mut row = draft(TransactionKind::Deposit, fx.w1, 5_000, TransactionStatus::Completed);
        row.reference = Some("ext-1".to_string());

        fx.importer.import(vec![Ok(row.clone())], "batch-1");
        let summary = fx.importer.import(vec![Ok(row)], "batch-2");

        // The replay resolves to the original row; the balance applies once.
        assert_eq!(summary.completed, 1);
        assert_eq!(fx.wallets.get(fx.w1).unwrap().balance, 5_000);
        assert_eq!(fx.log.len(), 1);
    }

    #[test]
    fn test_purge_is_admin_gated_and_batch_scoped() {
        let fx = fixture();
        fx.importer.import(
            vec![Ok(draft(TransactionKind::Deposit, fx.w1, 1_000, TransactionStatus::Pending))],
            "batch-1",
        );
        fx.importer.import(
            vec![Ok(draft(TransactionKind::Deposit, fx.w1, 2_000, TransactionStatus::Pending))],
            "batch-2",
        );

        let denied = fx.importer.purge(&Principal::member("investor-1"), "batch-1");
        assert!(matches!(denied, Err(LedgerError::Unauthorized { .. })));

        let removed = fx.importer.purge(&Principal::admin("ops-1"), "batch-1").unwrap();
        assert_eq!(removed, 1);

        let remaining = fx.log.filtered(&TransactionFilter::default());
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].import_batch.as_deref(), Some("batch-2"));
    }
}
