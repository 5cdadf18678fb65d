//! Synchronous CSV reader with iterator interface
//!
//! Streams import rows from a CSV file one at a time, delegating format
//! concerns to the csv_format module. Memory usage is O(1) per record, not
//! O(file size).
//!
//! Fatal errors (file not found) are returned from `new()`; per-row parse
//! and conversion errors are yielded as `Err` items carrying the line
//! number, so a caller can log and keep going.

use crate::io::csv_format::{convert_import_record, ImportDraft, ImportRecord};
use crate::types::LedgerError;
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::path::Path;

/// Streaming reader over import rows
#[derive(Debug)]
pub struct SyncReader {
    reader: csv::Reader<File>,
    line_num: u64,
}

impl SyncReader {
    /// Open a CSV file for streaming iteration
    ///
    /// Fields are whitespace-trimmed and rows may omit trailing optional
    /// columns.
    ///
    /// # Errors
    ///
    /// Returns `IoError` if the file cannot be opened.
    pub fn new(path: &Path) -> Result<Self, LedgerError> {
        let file = File::open(path).map_err(|e| LedgerError::IoError {
            message: format!("failed to open '{}': {e}", path.display()),
        })?;

        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(file);

        Ok(SyncReader {
            reader,
            line_num: 0,
        })
    }
}

impl Iterator for SyncReader {
    type Item = Result<ImportDraft, LedgerError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut deserializer = self.reader.deserialize::<ImportRecord>();

        match deserializer.next()? {
            Ok(record) => {
                self.line_num += 1;
                // Data line 1 is file line 2, after the header.
                let line = self.line_num + 1;
                Some(
                    convert_import_record(record)
                        .map_err(|message| LedgerError::parse_error(Some(line), &message)),
                )
            }
            Err(e) => {
                self.line_num += 1;
                let line = self.line_num + 1;
                Some(Err(LedgerError::parse_error(
                    Some(line),
                    &format!("CSV parse error: {e}"),
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TransactionKind, TransactionStatus};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "id,kind,wallet,destination,amount,status,date,description,initiator,reference\n";

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    #[test]
    fn test_new_fails_on_missing_file() {
        let result = SyncReader::new(Path::new("nonexistent.csv"));
        assert!(matches!(result, Err(LedgerError::IoError { .. })));
    }

    #[test]
    fn test_iterates_valid_rows() {
        let content = format!(
            "{HEADER},deposit,1,,100000,completed,,rent income,system,d1\n\
             ,withdrawal,1,,50000,pending,,,investor-1,w1\n"
        );
        let file = create_temp_csv(&content);

        let drafts: Vec<_> = SyncReader::new(file.path())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].kind, TransactionKind::Deposit);
        assert_eq!(drafts[0].status, TransactionStatus::Completed);
        assert_eq!(drafts[0].reference.as_deref(), Some("d1"));
        assert_eq!(drafts[1].kind, TransactionKind::Withdrawal);
        assert_eq!(drafts[1].amount, 50_000);
    }

    #[test]
    fn test_errors_carry_line_numbers() {
        let content = format!(
            "{HEADER},deposit,1,,100000,,,,,d1\n\
             ,deposit,1,,not-a-number,,,,,d2\n\
             ,deposit,1,,50000,,,,,d3\n"
        );
        let file = create_temp_csv(&content);

        let rows: Vec<_> = SyncReader::new(file.path()).unwrap().collect();

        assert_eq!(rows.len(), 3);
        assert!(rows[0].is_ok());
        assert!(rows[2].is_ok());
        match &rows[1] {
            Err(LedgerError::ParseError { line, message }) => {
                assert_eq!(*line, Some(3));
                assert!(message.contains("invalid amount"));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_continues_after_error() {
        let content = format!(
            "{HEADER},dividend,1,,100,,,,,x1\n\
             ,deposit,2,,75000,,,,,x2\n"
        );
        let file = create_temp_csv(&content);

        let rows: Vec<_> = SyncReader::new(file.path()).unwrap().collect();
        assert!(rows[0].is_err());
        assert_eq!(rows[1].as_ref().unwrap().wallet, 2);
    }

    #[test]
    fn test_empty_file_after_header() {
        let file = create_temp_csv(HEADER);
        let rows: Vec<_> = SyncReader::new(file.path()).unwrap().collect();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let content = format!("{HEADER}, deposit ,1, , 100000 , completed ,,,,d1\n");
        let file = create_temp_csv(&content);

        let drafts: Vec<_> = SyncReader::new(file.path())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(drafts[0].amount, 100_000);
        assert_eq!(drafts[0].status, TransactionStatus::Completed);
    }
}
