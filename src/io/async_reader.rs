//! Asynchronous CSV reader with batch interface
//!
//! Streams import rows from an async source in batches, keeping memory
//! usage constant regardless of file size. Invalid rows are logged and
//! skipped so one bad line never aborts a bulk import.

use crate::io::csv_format::{convert_import_record, ImportDraft, ImportRecord};
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;

/// Streaming async reader over import rows
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    /// Wrap an async reader providing CSV data
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        AsyncReader { csv_reader }
    }

    /// Read up to `batch_size` validated drafts
    ///
    /// Rows that fail deserialization or conversion are logged with
    /// `log::warn!` and skipped. An empty vector means end of input.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<ImportDraft> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut records = self.csv_reader.deserialize::<ImportRecord>();

        while batch.len() < batch_size {
            match records.next().await {
                Some(Ok(record)) => match convert_import_record(record) {
                    Ok(draft) => batch.push(draft),
                    Err(e) => log::warn!("skipping import row: {e}"),
                },
                Some(Err(e)) => log::warn!("skipping unparsable import row: {e}"),
                None => break,
            }
        }

        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TransactionKind, TransactionStatus};
    use futures::io::Cursor;

    const HEADER: &str =
        "id,kind,wallet,destination,amount,status,date,description,initiator,reference\n";

    #[tokio::test]
    async fn test_read_batch_respects_batch_size() {
        let content = format!(
            "{HEADER},deposit,1,,100000,completed,,,,d1\n\
             ,withdrawal,1,,50000,pending,,,,w1\n\
             ,deposit,2,,200000,completed,,,,d2\n"
        );
        let mut reader = AsyncReader::new(Cursor::new(content.into_bytes()));

        let batch = reader.read_batch(2).await;
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].kind, TransactionKind::Deposit);
        assert_eq!(batch[1].kind, TransactionKind::Withdrawal);

        let batch = reader.read_batch(2).await;
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].wallet, 2);

        assert!(reader.read_batch(2).await.is_empty());
    }

    #[tokio::test]
    async fn test_read_batch_empty_input() {
        let mut reader = AsyncReader::new(Cursor::new(HEADER.as_bytes().to_vec()));
        assert!(reader.read_batch(10).await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_rows_are_skipped() {
        let content = format!(
            "{HEADER},dividend,1,,100,,,,,x1\n\
             ,deposit,1,,75000,,,,,x2\n"
        );
        let mut reader = AsyncReader::new(Cursor::new(content.into_bytes()));

        let batch = reader.read_batch(10).await;
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].reference.as_deref(), Some("x2"));
        assert_eq!(batch[0].status, TransactionStatus::Pending);
    }

    #[tokio::test]
    async fn test_transfer_rows_carry_destination() {
        let content = format!("{HEADER},transfer,1,2,30000,pending,,escrow move,admin-1,t1\n");
        let mut reader = AsyncReader::new(Cursor::new(content.into_bytes()));

        let batch = reader.read_batch(10).await;
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].destination, Some(2));
        assert_eq!(batch[0].description, "escrow move");
    }
}
