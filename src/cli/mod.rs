//! Command-line argument parsing for the wallet-ledger binary

pub mod args;

pub use args::{BatchConfig, CliArgs, StrategyType};
