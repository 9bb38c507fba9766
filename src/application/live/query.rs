use crate::application::live::collection::LiveCollection;
use crate::application::ports::realtime::ChangeStream;
use crate::domain::entities::Record;
use crate::shared::error::AppError;
use futures::future::BoxFuture;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Bulk fetch used to seed (and re-seed) a live query.
pub type SnapshotFn<T> =
    Arc<dyn Fn() -> BoxFuture<'static, Result<Vec<T>, AppError>> + Send + Sync>;

/// Ties one bulk fetch to one change stream: the collection is seeded from
/// the fetch, then a background task folds every notification in as it
/// arrives. Dropping the query (or calling `close`) stops the task, which
/// releases the underlying subscription through its guard.
pub struct LiveQuery<T: Record> {
    collection: Arc<RwLock<LiveCollection<T>>>,
    fetch: SnapshotFn<T>,
    alive: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl<T: Record> LiveQuery<T> {
    /// Seeds from the fetch and starts applying the stream. A failed bulk
    /// fetch is surfaced to the caller as-is; nothing retries it.
    ///
    /// The stream is held open before the fetch resolves, so notifications
    /// racing the snapshot are buffered and folded in right after seeding.
    pub async fn open(
        fetch: SnapshotFn<T>,
        stream: ChangeStream<T>,
        page_size: usize,
    ) -> Result<Self, AppError> {
        let rows = (fetch)().await?;
        debug!(rows = rows.len(), "live query seeded");

        let collection = Arc::new(RwLock::new(LiveCollection::with_page_size(page_size)));
        collection.write().await.seed(rows);

        let alive = Arc::new(AtomicBool::new(true));
        let task = tokio::spawn(apply_changes(
            stream,
            Arc::clone(&collection),
            Arc::clone(&alive),
        ));

        Ok(Self {
            collection,
            fetch,
            alive,
            task,
        })
    }

    /// Re-runs the bulk fetch and replaces the snapshot. If the query was
    /// closed while the fetch was in flight, the result is discarded.
    pub async fn refresh(&self) -> Result<(), AppError> {
        let rows = (self.fetch)().await?;
        if !self.alive.load(Ordering::SeqCst) {
            debug!("refresh finished after close, discarding");
            return Ok(());
        }
        self.collection.write().await.seed(rows);
        Ok(())
    }

    pub async fn snapshot(&self) -> Vec<T> {
        self.collection.read().await.records().to_vec()
    }

    pub async fn page(&self, page: usize) -> Vec<T> {
        self.collection.read().await.page(page).to_vec()
    }

    pub async fn len(&self) -> usize {
        self.collection.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.collection.read().await.is_empty()
    }

    pub async fn total_pages(&self) -> usize {
        self.collection.read().await.total_pages()
    }

    /// Stops applying notifications and releases the subscription.
    pub fn close(&self) {
        self.alive.store(false, Ordering::SeqCst);
        self.task.abort();
    }
}

impl<T: Record> Drop for LiveQuery<T> {
    fn drop(&mut self) {
        self.close();
    }
}

async fn apply_changes<T: Record>(
    mut stream: ChangeStream<T>,
    collection: Arc<RwLock<LiveCollection<T>>>,
    alive: Arc<AtomicBool>,
) {
    loop {
        match stream.recv().await {
            Ok(event) => {
                if !alive.load(Ordering::SeqCst) {
                    break;
                }
                collection.write().await.apply(event);
            }
            Err(RecvError::Lagged(missed)) => {
                // The transport is assumed reliable; when a consumer falls
                // behind we log the gap and keep going.
                warn!(missed, "change stream lagged, notifications dropped");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::realtime::{ChangeEvent, SubscriptionGuard};
    use crate::domain::entities::Order;
    use crate::domain::value_objects::RecordId;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::sync::broadcast;
    use tokio::time::sleep;

    fn order(id: &str, secs: i64, price: f64) -> Order {
        Order {
            id: RecordId::new(id),
            client_id: RecordId::new("client-1"),
            name: format!("customer-{id}"),
            address: "324 Main Avenue".to_string(),
            city: "New York".to_string(),
            zip_code: "11990".to_string(),
            price,
            created_at: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    fn snapshot_of(rows: Vec<Order>) -> SnapshotFn<Order> {
        Arc::new(move || {
            let rows = rows.clone();
            Box::pin(async move { Ok(rows) })
        })
    }

    fn failing_snapshot() -> SnapshotFn<Order> {
        Arc::new(|| Box::pin(async { Err(AppError::Network("connection refused".into())) }))
    }

    #[tokio::test]
    async fn notifications_fold_into_the_seeded_snapshot() {
        let (tx, rx) = broadcast::channel(16);
        let stream = ChangeStream::new(rx, SubscriptionGuard::noop());

        let query = LiveQuery::open(
            snapshot_of(vec![order("1", 100, 10.0), order("2", 90, 5.0)]),
            stream,
            10,
        )
        .await
        .expect("open live query");

        tx.send(ChangeEvent::Created(order("3", 150, 7.0))).unwrap();
        tx.send(ChangeEvent::Updated(order("1", 100, 42.0))).unwrap();
        tx.send(ChangeEvent::Deleted(RecordId::new("2"))).unwrap();
        sleep(Duration::from_millis(50)).await;

        let rows = query.snapshot().await;
        let ids: Vec<_> = rows.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1"]);
        assert_eq!(rows[1].price, 42.0);
    }

    #[tokio::test]
    async fn failed_bulk_fetch_surfaces_to_the_caller() {
        let (_tx, rx) = broadcast::channel::<ChangeEvent<Order>>(16);
        let stream = ChangeStream::new(rx, SubscriptionGuard::noop());

        let err = LiveQuery::open(failing_snapshot(), stream, 10)
            .await
            .err()
            .expect("fetch failure propagates");
        assert!(matches!(err, AppError::Network(_)));
    }

    #[tokio::test]
    async fn dropping_the_query_releases_the_subscription() {
        let released = Arc::new(AtomicUsize::new(0));
        let guard_counter = Arc::clone(&released);
        let (tx, rx) = broadcast::channel(16);
        let stream = ChangeStream::new(
            rx,
            SubscriptionGuard::new(move || {
                guard_counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        let query = LiveQuery::open(snapshot_of(vec![order("1", 100, 10.0)]), stream, 10)
            .await
            .expect("open live query");
        assert_eq!(released.load(Ordering::SeqCst), 0);

        drop(query);
        sleep(Duration::from_millis(50)).await;
        assert_eq!(released.load(Ordering::SeqCst), 1);

        // Sender sees the receiver gone once the guard has run.
        assert!(tx.send(ChangeEvent::Deleted(RecordId::new("1"))).is_err());
    }

    #[tokio::test]
    async fn close_stops_further_mutation() {
        let (tx, rx) = broadcast::channel(16);
        let stream = ChangeStream::new(rx, SubscriptionGuard::noop());

        let query = LiveQuery::open(snapshot_of(vec![order("1", 100, 10.0)]), stream, 10)
            .await
            .expect("open live query");
        query.close();
        sleep(Duration::from_millis(20)).await;

        let _ = tx.send(ChangeEvent::Deleted(RecordId::new("1")));
        sleep(Duration::from_millis(50)).await;
        assert_eq!(query.len().await, 1, "closed query must not mutate");
    }

    #[tokio::test]
    async fn refresh_after_close_is_discarded() {
        let (_tx, rx) = broadcast::channel::<ChangeEvent<Order>>(16);
        let stream = ChangeStream::new(rx, SubscriptionGuard::noop());

        let query = LiveQuery::open(snapshot_of(vec![order("1", 100, 10.0)]), stream, 10)
            .await
            .expect("open live query");
        query.close();

        // The fetch itself succeeds, but its result must not land.
        query.refresh().await.expect("refresh resolves");
        assert_eq!(query.snapshot().await.len(), 1);
    }

    #[tokio::test]
    async fn refresh_replaces_the_snapshot_while_live() {
        let (_tx, rx) = broadcast::channel::<ChangeEvent<Order>>(16);
        let stream = ChangeStream::new(rx, SubscriptionGuard::noop());

        let fetches = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fetches);
        let fetch: SnapshotFn<Order> = Arc::new(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                if n == 0 {
                    Ok(vec![order("1", 100, 10.0)])
                } else {
                    Ok(vec![order("2", 200, 20.0), order("3", 150, 30.0)])
                }
            })
        });

        let query = LiveQuery::open(fetch, stream, 10).await.expect("open");
        assert_eq!(query.len().await, 1);

        query.refresh().await.expect("refresh");
        let ids: Vec<_> = query
            .snapshot()
            .await
            .iter()
            .map(|o| o.id.to_string())
            .collect();
        assert_eq!(ids, vec!["2", "3"]);
    }
}
