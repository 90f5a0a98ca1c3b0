use anyhow::Result;
use async_trait::async_trait;

use crate::domain::{OrderId, ScanRecord};

/// Durable bookkeeping of completed scans, surviving navigation between
/// screens. Implementations key the store by order id: saving twice for the
/// same order replaces the earlier record.
#[async_trait]
pub trait ScanStore: Send + Sync {
    /// Returns persisted records whose order id is in `batch_ids`.
    async fn load_scans(&self, batch_ids: &[OrderId]) -> Result<Vec<ScanRecord>>;

    /// Upserts the record for `order_id` and returns what was written.
    async fn save_scan(&self, order_id: OrderId, invoice_no: &str) -> Result<ScanRecord>;

    /// Removes records for the given order ids, or every record when
    /// `batch_ids` is `None`. Returns the number of records removed.
    async fn clear_scans(&self, batch_ids: Option<&[OrderId]>) -> Result<u64>;
}
