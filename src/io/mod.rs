//! Import/export surface: CSV formats, sync and async readers

pub mod async_reader;
pub mod csv_format;
pub mod sync_reader;

pub use async_reader::AsyncReader;
pub use csv_format::{
    convert_import_record, write_transactions_csv, write_wallets_csv, ExportRecord, ImportDraft,
    ImportRecord,
};
pub use sync_reader::SyncReader;
