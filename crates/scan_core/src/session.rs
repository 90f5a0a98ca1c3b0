//! Durable tracking of which orders in a batch have been scanned.

use std::{collections::HashSet, sync::Arc};

use tracing::warn;

use shared::{
    domain::{OrderId, ScanBatch, ScanRecord},
    store::ScanStore,
};

/// Progress of a batch: how many of the expected orders have a persisted
/// scan record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    pub scanned: usize,
    pub total: usize,
}

impl BatchProgress {
    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.scanned)
    }

    pub fn is_complete(&self) -> bool {
        self.scanned == self.total
    }
}

/// Wraps the persistent store for one batch of orders. Storage failures are
/// never fatal here: reads degrade to "no records" and writes to a no-op,
/// with a warning, so a broken local store cannot block the driver.
#[derive(Clone)]
pub struct ScanSession {
    store: Arc<dyn ScanStore>,
    batch: ScanBatch,
}

impl ScanSession {
    pub fn new(store: Arc<dyn ScanStore>, batch: ScanBatch) -> Self {
        Self { store, batch }
    }

    pub fn batch(&self) -> &ScanBatch {
        &self.batch
    }

    /// Persisted records for this batch's orders.
    pub async fn records(&self) -> Vec<ScanRecord> {
        match self.store.load_scans(&self.batch.order_ids()).await {
            Ok(records) => records,
            Err(err) => {
                warn!(%err, "scan store read failed, treating as no records");
                Vec::new()
            }
        }
    }

    /// Upserts the record for a scanned order.
    pub async fn record_scan(&self, order_id: OrderId, invoice_no: &str) {
        if let Err(err) = self.store.save_scan(order_id, invoice_no).await {
            warn!(%err, order_id = order_id.0, "scan store write failed, continuing");
        }
    }

    /// Current progress, derived from persisted records. Records for orders
    /// outside the batch never count.
    pub async fn progress(&self) -> BatchProgress {
        let targets: HashSet<OrderId> = self.batch.order_ids().into_iter().collect();
        let completed: HashSet<OrderId> = self
            .records()
            .await
            .into_iter()
            .map(|r| r.order_id)
            .filter(|id| targets.contains(id))
            .collect();
        BatchProgress {
            scanned: completed.len(),
            total: targets.len(),
        }
    }

    /// Prunes this batch's records once the workflow is done with them.
    pub async fn finish(&self) {
        let ids = self.batch.order_ids();
        if ids.is_empty() {
            return;
        }
        if let Err(err) = self.store.clear_scans(Some(&ids)).await {
            warn!(%err, "scan store prune failed, continuing");
        }
    }

    /// Wipes the entire store, not just this batch.
    pub async fn clear_all(&self) {
        if let Err(err) = self.store.clear_scans(None).await {
            warn!(%err, "scan store wipe failed, continuing");
        }
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
