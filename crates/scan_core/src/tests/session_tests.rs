use super::*;

use async_trait::async_trait;
use shared::domain::BatchMember;
use storage::Storage;

fn batch_of(ids: &[(i64, &str)]) -> ScanBatch {
    ScanBatch::new(
        ids.iter()
            .map(|(id, inv)| BatchMember::new(OrderId(*id), *inv))
            .collect(),
    )
}

async fn sqlite_store() -> Arc<dyn ScanStore> {
    Arc::new(Storage::new("sqlite::memory:").await.expect("db"))
}

struct FailingStore;

#[async_trait]
impl ScanStore for FailingStore {
    async fn load_scans(&self, _batch_ids: &[OrderId]) -> anyhow::Result<Vec<ScanRecord>> {
        anyhow::bail!("store unavailable")
    }

    async fn save_scan(&self, _order_id: OrderId, _invoice_no: &str) -> anyhow::Result<ScanRecord> {
        anyhow::bail!("store unavailable")
    }

    async fn clear_scans(&self, _batch_ids: Option<&[OrderId]>) -> anyhow::Result<u64> {
        anyhow::bail!("store unavailable")
    }
}

#[tokio::test]
async fn progress_counts_down_as_scans_land() {
    let store = sqlite_store().await;
    let session = ScanSession::new(
        Arc::clone(&store),
        batch_of(&[(1, "INV001"), (2, "INV002"), (3, "INV003")]),
    );

    session.record_scan(OrderId(1), "INV001").await;
    session.record_scan(OrderId(2), "INV002").await;
    let progress = session.progress().await;
    assert_eq!(progress.scanned, 2);
    assert_eq!(progress.remaining(), 1);
    assert!(!progress.is_complete());

    session.record_scan(OrderId(3), "INV003").await;
    assert!(session.progress().await.is_complete());
}

#[tokio::test]
async fn repeated_scans_for_one_order_count_once() {
    let store = sqlite_store().await;
    let session = ScanSession::new(store, batch_of(&[(5, "INV005"), (6, "INV006")]));

    session.record_scan(OrderId(5), "INV005").await;
    session.record_scan(OrderId(5), "INV005").await;

    let progress = session.progress().await;
    assert_eq!(progress.scanned, 1);
    assert_eq!(progress.remaining(), 1);
}

#[tokio::test]
async fn records_outside_the_batch_never_count() {
    let store = sqlite_store().await;
    store.save_scan(OrderId(99), "INV099").await.expect("save");

    let session = ScanSession::new(store, batch_of(&[(1, "INV001")]));
    let progress = session.progress().await;
    assert_eq!(progress.scanned, 0);
    assert_eq!(progress.total, 1);
}

#[tokio::test]
async fn finish_prunes_only_this_batch() {
    let store = sqlite_store().await;
    store.save_scan(OrderId(99), "INV099").await.expect("save");

    let session = ScanSession::new(Arc::clone(&store), batch_of(&[(1, "INV001")]));
    session.record_scan(OrderId(1), "INV001").await;
    session.finish().await;

    assert!(session.records().await.is_empty());
    let others = store.load_scans(&[OrderId(99)]).await.expect("load");
    assert_eq!(others.len(), 1);
}

#[tokio::test]
async fn clear_all_wipes_the_whole_store() {
    let store = sqlite_store().await;
    store.save_scan(OrderId(99), "INV099").await.expect("save");

    let session = ScanSession::new(Arc::clone(&store), batch_of(&[(1, "INV001")]));
    session.record_scan(OrderId(1), "INV001").await;
    session.clear_all().await;

    let remaining = store
        .load_scans(&[OrderId(1), OrderId(99)])
        .await
        .expect("load");
    assert!(remaining.is_empty());
}

#[tokio::test]
async fn broken_store_degrades_to_empty_and_noop() {
    let session = ScanSession::new(Arc::new(FailingStore), batch_of(&[(1, "INV001")]));

    // Reads degrade to "no records", writes and prunes to no-ops.
    session.record_scan(OrderId(1), "INV001").await;
    assert!(session.records().await.is_empty());

    let progress = session.progress().await;
    assert_eq!(progress.scanned, 0);
    assert_eq!(progress.total, 1);

    session.finish().await;
    session.clear_all().await;
}
