//! Manager integration tests: registry behavior, resume, and shutdown.

mod support;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use delivery_tracker::fetch::Fetcher;
use delivery_tracker::store::{MemoryStore, OrderStore};
use delivery_tracker::tracker::{OrderPhase, TrackedOrder, TrackerManager};

use support::{identity, tracked_order, MockFetcher, OrderBuilder};

fn manager_with(
    store: &Arc<MemoryStore>,
    fetcher: &Arc<MockFetcher>,
) -> (TrackerManager, mpsc::Receiver<TrackedOrder>) {
    TrackerManager::new(
        Arc::clone(store) as Arc<dyn OrderStore>,
        Arc::clone(fetcher) as Arc<dyn Fetcher>,
    )
}

async fn next_update(rx: &mut mpsc::Receiver<TrackedOrder>) -> TrackedOrder {
    timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for update")
        .expect("update channel closed early")
}

/// Poll until the registry is empty; worker deregistration is asynchronous.
async fn wait_until_idle(manager: &TrackerManager) {
    for _ in 0..500 {
        if manager.active_count() == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("registry still holds workers");
}

#[tokio::test]
async fn test_duplicate_tracking_suppressed() {
    let store = Arc::new(MemoryStore::new());
    let fetcher = Arc::new(MockFetcher::new());
    for _ in 0..5 {
        fetcher.queue_order(OrderBuilder::new().phase("ACTIVE").build());
    }

    let (manager, _rx) = manager_with(&store, &fetcher);

    assert!(manager.start_tracking(identity("uuid-1")));
    assert!(!manager.start_tracking(identity("uuid-1")));
    assert!(manager.is_tracking("uuid-1"));
    assert_eq!(manager.active_count(), 1);

    manager.shutdown().await;
}

#[tokio::test]
async fn test_stop_tracking_allows_restart() {
    let store = Arc::new(MemoryStore::new());
    let fetcher = Arc::new(MockFetcher::new());
    for _ in 0..10 {
        fetcher.queue_order(OrderBuilder::new().phase("ACTIVE").build());
    }

    let (manager, _rx) = manager_with(&store, &fetcher);

    assert!(manager.start_tracking(identity("uuid-1")));
    manager.stop_tracking("uuid-1");
    assert!(!manager.is_tracking("uuid-1"));
    assert!(manager.start_tracking(identity("uuid-1")));

    manager.shutdown().await;
}

#[tokio::test]
async fn test_stop_tracking_unknown_uuid_is_idempotent() {
    let store = Arc::new(MemoryStore::new());
    let fetcher = Arc::new(MockFetcher::new());
    let (manager, _rx) = manager_with(&store, &fetcher);

    manager.stop_tracking("never-tracked");
    manager.stop_tracking("never-tracked");

    manager.shutdown().await;
}

#[tokio::test]
async fn test_finished_worker_leaves_the_registry() {
    let store = Arc::new(MemoryStore::new());
    let fetcher = Arc::new(MockFetcher::new());
    fetcher.queue_order(OrderBuilder::new().phase("COMPLETED").build());

    let (manager, mut rx) = manager_with(&store, &fetcher);
    assert!(manager.start_tracking(identity("uuid-1")));

    let update = next_update(&mut rx).await;
    assert_eq!(update.last_status, OrderPhase::Completed);

    wait_until_idle(&manager).await;

    // the uuid is free again
    fetcher.queue_order(OrderBuilder::new().phase("COMPLETED").build());
    assert!(manager.start_tracking(identity("uuid-1")));

    manager.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_closes_channel_exactly_once() {
    let store = Arc::new(MemoryStore::new());
    let fetcher = Arc::new(MockFetcher::new());
    fetcher.queue_order(OrderBuilder::new().phase("COMPLETED").build());

    let (manager, mut rx) = manager_with(&store, &fetcher);
    manager.start_tracking(identity("uuid-1"));

    let _ = next_update(&mut rx).await;
    manager.shutdown().await;

    // whatever is still buffered drains, then the channel reports closed
    while let Some(_update) = rx.recv().await {}
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn test_shutdown_with_no_workers_does_not_block() {
    let store = Arc::new(MemoryStore::new());
    let fetcher = Arc::new(MockFetcher::new());
    let (manager, _rx) = manager_with(&store, &fetcher);

    timeout(Duration::from_secs(5), manager.shutdown())
        .await
        .expect("shutdown hung with an empty registry");
}

#[tokio::test]
async fn test_shutdown_is_bounded_with_sleeping_workers() {
    let store = Arc::new(MemoryStore::new());
    let fetcher = Arc::new(MockFetcher::new());
    for _ in 0..30 {
        fetcher.queue_order(OrderBuilder::new().phase("ACTIVE").build());
    }

    let (manager, _rx) = manager_with(&store, &fetcher);
    for i in 1..=3 {
        assert!(manager.start_tracking(identity(&format!("uuid-{i}"))));
    }

    // let the initial scans finish so every worker is in its polling sleep
    tokio::time::sleep(Duration::from_millis(200)).await;

    // shutdown must not wait out the 30s+ polling intervals
    timeout(Duration::from_secs(5), manager.shutdown())
        .await
        .expect("shutdown did not return in bounded time");
}

#[tokio::test]
async fn test_resume_restarts_stored_orders() {
    let store = Arc::new(MemoryStore::new());
    store
        .save_order(&tracked_order("uuid-1", OrderPhase::Active))
        .await
        .unwrap();
    store
        .save_order(&tracked_order("uuid-2", OrderPhase::Active))
        .await
        .unwrap();

    let fetcher = Arc::new(MockFetcher::new());
    for _ in 0..2 {
        fetcher.queue_order(OrderBuilder::new().phase("COMPLETED").build());
    }

    let (manager, mut rx) = manager_with(&store, &fetcher);
    manager.resume_active_orders().await;

    let first = next_update(&mut rx).await;
    let second = next_update(&mut rx).await;
    let mut uuids = vec![first.uuid, second.uuid];
    uuids.sort();
    assert_eq!(uuids, vec!["uuid-1", "uuid-2"]);

    manager.shutdown().await;
    assert!(fetcher.call_count() >= 2);
}

#[tokio::test]
async fn test_resume_skips_terminal_and_tracked_orders() {
    let store = Arc::new(MemoryStore::new());
    store
        .save_order(&tracked_order("uuid-1", OrderPhase::Active))
        .await
        .unwrap();
    store
        .save_order(&tracked_order("uuid-2", OrderPhase::Delivered))
        .await
        .unwrap();

    let fetcher = Arc::new(MockFetcher::new());
    for _ in 0..10 {
        fetcher.queue_order(OrderBuilder::new().phase("ACTIVE").build());
    }

    let (manager, _rx) = manager_with(&store, &fetcher);

    // uuid-1 is already tracked when the resume pass runs
    assert!(manager.start_tracking(identity("uuid-1")));
    manager.resume_active_orders().await;

    assert_eq!(manager.active_count(), 1);
    assert!(!manager.is_tracking("uuid-2"));

    manager.shutdown().await;
}
