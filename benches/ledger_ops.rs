//! Benchmark suite for core ledger operations
//!
//! Measures the hot paths: single-wallet deposits, paired-lock transfers,
//! contended concurrent deposits, and reconciliation over a populated log.
//!
//! # Running Benchmarks
//!
//! ```bash
//! cargo bench
//! ```

use std::sync::Arc;
use std::thread;
use wallet_ledger::types::{TransactionMeta, WalletKind};
use wallet_ledger::Ledger;

fn main() {
    divan::main();
}

fn meta(reference: &str) -> TransactionMeta {
    TransactionMeta::new("bench", "bench", reference)
}

/// Sequential deposits into a single wallet
#[divan::bench]
fn sequential_deposits() {
    let ledger = Ledger::new();
    let w1 = ledger.wallets.provision(WalletKind::Main, "NGN").id;

    for i in 0..1_000u32 {
        ledger
            .processor
            .deposit(w1, 1_000, meta(&format!("d-{i}")))
            .expect("deposit failed");
    }
}

/// Transfers bouncing between two wallets, exercising the pair lock
#[divan::bench]
fn alternating_transfers() {
    let ledger = Ledger::new();
    let w1 = ledger.wallets.provision(WalletKind::Main, "NGN").id;
    let w2 = ledger.wallets.provision(WalletKind::Main, "NGN").id;
    ledger.processor.deposit(w1, 10_000_000, meta("s1")).expect("seed failed");
    ledger.processor.deposit(w2, 10_000_000, meta("s2")).expect("seed failed");

    for i in 0..1_000u32 {
        let (from, to) = if i % 2 == 0 { (w1, w2) } else { (w2, w1) };
        ledger
            .processor
            .transfer(from, to, 100, meta(&format!("t-{i}")))
            .expect("transfer failed");
    }
}

/// Deposits from 8 threads contending on one wallet
#[divan::bench]
fn contended_deposits() {
    let ledger = Arc::new(Ledger::new());
    let w1 = ledger.wallets.provision(WalletKind::Main, "NGN").id;

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || {
                for i in 0..250u32 {
                    ledger
                        .processor
                        .deposit(w1, 1_000, meta(&format!("c-{t}-{i}")))
                        .expect("deposit failed");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("thread panicked");
    }
}

/// Reconciliation over a wallet with 10,000 completed rows
#[divan::bench]
fn reconcile_populated_wallet(bencher: divan::Bencher) {
    let ledger = Ledger::new();
    let w1 = ledger.wallets.provision(WalletKind::Main, "NGN").id;
    for i in 0..10_000u32 {
        ledger
            .processor
            .deposit(w1, 100, meta(&format!("r-{i}")))
            .expect("deposit failed");
    }

    bencher.bench_local(|| ledger.reconciliation.reconcile(w1).expect("reconcile failed"));
}
