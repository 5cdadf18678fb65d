//! Read-side composition for audit and listing views
//!
//! Thin filter/sort/paginate helper over the wallet store and transaction
//! log. Everything here is a snapshot read; no invariants beyond correct
//! filter composition.

use crate::core::{SortField, SortOrder, TransactionFilter, TransactionLog, WalletStore};
use crate::types::{LedgerError, Transaction, Wallet, WalletId};
use std::sync::Arc;

/// Sort and pagination options for transaction listings
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub sort_by: SortField,
    pub order: SortOrder,
    pub offset: usize,
    /// No limit when `None`
    pub limit: Option<usize>,
}

/// Read-only audit views over wallets and history
#[derive(Debug, Clone)]
pub struct QueryService {
    wallets: Arc<WalletStore>,
    log: Arc<TransactionLog>,
}

impl QueryService {
    pub fn new(wallets: Arc<WalletStore>, log: Arc<TransactionLog>) -> Self {
        QueryService { wallets, log }
    }

    /// Snapshot of one wallet
    pub fn wallet(&self, id: WalletId) -> Result<Wallet, LedgerError> {
        self.wallets.get(id)
    }

    /// All wallets, sorted by id
    pub fn wallets(&self) -> Vec<Wallet> {
        self.wallets.all()
    }

    /// Filtered, sorted, paginated transaction listing
    ///
    /// Ties sort by transaction id so the ordering is deterministic across
    /// runs.
    pub fn transactions(
        &self,
        filter: &TransactionFilter,
        options: &QueryOptions,
    ) -> Vec<Transaction> {
        let mut rows = self.log.filtered(filter);
        rows.sort_by(|a, b| {
            let ordering = match options.sort_by {
                SortField::CreatedAt => a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)),
                SortField::Amount => a.amount.cmp(&b.amount).then(a.id.cmp(&b.id)),
            };
            match options.order {
                SortOrder::Ascending => ordering,
                SortOrder::Descending => ordering.reverse(),
            }
        });
        rows.into_iter()
            .skip(options.offset)
            .take(options.limit.unwrap_or(usize::MAX))
            .collect()
    }

    /// History of one wallet, honoring the rest of the filter
    pub fn wallet_history(
        &self,
        wallet: WalletId,
        filter: &TransactionFilter,
        options: &QueryOptions,
    ) -> Vec<Transaction> {
        let filter = TransactionFilter {
            wallet: Some(wallet),
            ..filter.clone()
        };
        self.transactions(&filter, options)
    }

    /// Look up a transaction by its idempotency reference
    pub fn by_reference(&self, reference: &str) -> Option<Transaction> {
        self.log.find_by_reference(reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TransactionProcessor;
    use crate::types::{TransactionMeta, WalletKind};
    use rstest::rstest;

    struct Fixture {
        query: QueryService,
        w1: WalletId,
        w2: WalletId,
    }

    // Seeds: three deposits into w1 (10k, 30k, 20k), one transfer w1 -> w2,
    // one failed withdrawal from w2.
    fn fixture() -> Fixture {
        let wallets = Arc::new(WalletStore::new());
        let log = Arc::new(TransactionLog::new());
        let processor = TransactionProcessor::new(Arc::clone(&wallets), Arc::clone(&log));
        let query = QueryService::new(Arc::clone(&wallets), Arc::clone(&log));

        let w1 = wallets.provision(WalletKind::Main, "NGN").id;
        let w2 = wallets.provision(WalletKind::Escrow, "NGN").id;
        for (amount, reference) in [(10_000, "d1"), (30_000, "d2"), (20_000, "d3")] {
            processor
                .deposit(w1, amount, TransactionMeta::new("rent income", "system", reference))
                .unwrap();
        }
        processor
            .transfer(
                w1,
                w2,
                15_000,
                TransactionMeta::new("escrow top-up", "admin-1", "t1"),
            )
            .unwrap();
        processor
            .withdraw(
                w2,
                99_000_000,
                TransactionMeta::new("payout attempt", "investor-3", "w-fail"),
            )
            .unwrap_err();

        Fixture { query, w1, w2 }
    }

    #[test]
    fn test_sort_by_amount_ascending() {
        let fx = fixture();
        let options = QueryOptions {
            sort_by: SortField::Amount,
            order: SortOrder::Ascending,
            ..QueryOptions::default()
        };
        let amounts: Vec<u64> = fx
            .query
            .transactions(&TransactionFilter::default(), &options)
            .iter()
            .map(|tx| tx.amount)
            .collect();
        assert_eq!(amounts, vec![10_000, 15_000, 20_000, 30_000, 99_000_000]);
    }

    #[rstest]
    #[case(0, Some(2), 2)]
    #[case(3, Some(10), 2)]
    #[case(5, Some(10), 0)]
    #[case(0, None, 5)]
    fn test_pagination_bounds(
        #[case] offset: usize,
        #[case] limit: Option<usize>,
        #[case] expected: usize,
    ) {
        let fx = fixture();
        let options = QueryOptions {
            offset,
            limit,
            ..QueryOptions::default()
        };
        let rows = fx.query.transactions(&TransactionFilter::default(), &options);
        assert_eq!(rows.len(), expected);
    }

    #[test]
    fn test_text_search_matches_description_and_reference() {
        let fx = fixture();
        let options = QueryOptions::default();

        let by_description = fx.query.transactions(
            &TransactionFilter {
                search: Some("ESCROW".into()),
                ..TransactionFilter::default()
            },
            &options,
        );
        assert_eq!(by_description.len(), 1);
        assert_eq!(by_description[0].reference, "t1");

        let by_reference = fx.query.transactions(
            &TransactionFilter {
                search: Some("w-fail".into()),
                ..TransactionFilter::default()
            },
            &options,
        );
        assert_eq!(by_reference.len(), 1);
    }

    #[test]
    fn test_wallet_history_covers_both_transfer_legs() {
        let fx = fixture();
        let options = QueryOptions::default();
        let w2_rows = fx
            .query
            .wallet_history(fx.w2, &TransactionFilter::default(), &options);
        // The transfer in and the failed withdrawal.
        assert_eq!(w2_rows.len(), 2);
    }

    #[test]
    fn test_wallets_listing_is_id_ordered() {
        let fx = fixture();
        let ids: Vec<WalletId> = fx.query.wallets().iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![fx.w1, fx.w2]);
    }

    #[test]
    fn test_by_reference_passthrough() {
        let fx = fixture();
        assert!(fx.query.by_reference("d2").is_some());
        assert!(fx.query.by_reference("nope").is_none());
    }
}
