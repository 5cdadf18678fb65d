use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Bulk-import transactions into the wallet ledger and report balances
#[derive(Parser, Debug)]
#[command(name = "wallet-ledger")]
#[command(
    about = "Bulk-import wallet transactions and report balances with reconciliation",
    long_about = None
)]
pub struct CliArgs {
    /// Input CSV file path containing transaction rows
    #[arg(value_name = "INPUT", help = "Path to the input CSV file")]
    pub input_file: PathBuf,

    /// Reader strategy for the import file
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "sync",
        help = "Import strategy: 'sync' for streaming iteration or 'async' for batched async reading"
    )]
    pub strategy: StrategyType,

    /// Number of rows per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of rows per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Maximum number of batches processed concurrently (async mode only)
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Maximum number of batches processing concurrently (default: CPU cores)"
    )]
    pub max_concurrent_batches: Option<usize>,
}

/// Available reader strategies for the import file
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

/// Batching configuration for the async import path
#[derive(Debug, Clone, Copy)]
pub struct BatchConfig {
    pub batch_size: usize,
    pub max_concurrent_batches: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig {
            batch_size: 1000,
            max_concurrent_batches: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Build a config, falling back to defaults for zero values
    pub fn new(batch_size: usize, max_concurrent_batches: usize) -> Self {
        let default = BatchConfig::default();
        BatchConfig {
            batch_size: if batch_size == 0 {
                default.batch_size
            } else {
                batch_size
            },
            max_concurrent_batches: if max_concurrent_batches == 0 {
                default.max_concurrent_batches
            } else {
                max_concurrent_batches
            },
        }
    }
}

impl CliArgs {
    /// Batch configuration from CLI arguments, defaulted where absent
    pub fn to_batch_config(&self) -> BatchConfig {
        let default = BatchConfig::default();
        BatchConfig::new(
            self.batch_size.unwrap_or(default.batch_size),
            self.max_concurrent_batches
                .unwrap_or(default.max_concurrent_batches),
        )
    }
}
