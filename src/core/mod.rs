//! Core ledger components
//!
//! Leaves first: the wallet store and transaction log own all state; the
//! processor, approval workflow, reconciliation engine, query service, and
//! bulk importer compose them. [`Ledger`] wires a complete set together.

pub mod approval;
pub mod importer;
pub mod processor;
pub mod query;
pub mod reconciliation;
pub mod transaction_log;
pub mod wallet_store;

pub use approval::ApprovalWorkflow;
pub use importer::{BulkImporter, ImportSummary};
pub use processor::TransactionProcessor;
pub use query::{QueryOptions, QueryService};
pub use reconciliation::ReconciliationEngine;
pub use transaction_log::{SortField, SortOrder, TransactionFilter, TransactionLog};
pub use wallet_store::WalletStore;

use std::sync::Arc;

/// A fully wired in-memory ledger
///
/// Convenience bundle for callers that want the whole system rather than
/// individual components. All components share the same store and log.
#[derive(Debug, Clone)]
pub struct Ledger {
    pub wallets: Arc<WalletStore>,
    pub log: Arc<TransactionLog>,
    pub processor: TransactionProcessor,
    pub approvals: ApprovalWorkflow,
    pub reconciliation: ReconciliationEngine,
    pub query: QueryService,
    pub importer: BulkImporter,
}

impl Ledger {
    pub fn new() -> Self {
        let wallets = Arc::new(WalletStore::new());
        let log = Arc::new(TransactionLog::new());
        let processor = TransactionProcessor::new(Arc::clone(&wallets), Arc::clone(&log));
        Ledger {
            approvals: ApprovalWorkflow::new(Arc::clone(&wallets), Arc::clone(&log)),
            reconciliation: ReconciliationEngine::new(Arc::clone(&wallets), Arc::clone(&log)),
            query: QueryService::new(Arc::clone(&wallets), Arc::clone(&log)),
            importer: BulkImporter::new(processor.clone(), Arc::clone(&log)),
            processor,
            wallets,
            log,
        }
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Ledger::new()
    }
}
