//! Registry and supervisor of order workers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::core::Config;
use crate::fetch::{Fetcher, HttpFetcher};
use crate::store::OrderStore;

use super::model::{OrderIdentity, TrackedOrder};
use super::worker::OrderWorker;

/// Capacity of the outbound update channel. A full channel blocks workers,
/// so a slow consumer slows polling instead of losing updates.
const UPDATE_CHANNEL_CAPACITY: usize = 500;

/// Supervisor of per-order tracking workers.
///
/// The registry is the single source of truth for which uuids are being
/// tracked. Its mutex guards O(1) map operations only, never fetches or
/// channel sends. Each worker runs under a child of the manager's
/// cancellation token and is joined through a task tracker on shutdown.
pub struct TrackerManager {
    store: Arc<dyn OrderStore>,
    fetcher: Arc<dyn Fetcher>,
    active: Arc<Mutex<HashMap<String, CancellationToken>>>,
    workers: TaskTracker,
    shutdown: CancellationToken,
    update_tx: mpsc::Sender<TrackedOrder>,
}

impl TrackerManager {
    /// Create a manager together with the consumer half of its update
    /// channel.
    pub fn new(
        store: Arc<dyn OrderStore>,
        fetcher: Arc<dyn Fetcher>,
    ) -> (Self, mpsc::Receiver<TrackedOrder>) {
        let (update_tx, update_rx) = mpsc::channel(UPDATE_CHANNEL_CAPACITY);
        (
            Self {
                store,
                fetcher,
                active: Arc::new(Mutex::new(HashMap::new())),
                workers: TaskTracker::new(),
                shutdown: CancellationToken::new(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Create a manager with the production HTTP fetcher.
    pub fn from_config(
        config: &Config,
        store: Arc<dyn OrderStore>,
    ) -> (Self, mpsc::Receiver<TrackedOrder>) {
        Self::new(store, Arc::new(HttpFetcher::new(config)))
    }

    /// Begin tracking an order. Returns `false` when the uuid is already
    /// being tracked.
    pub fn start_tracking(&self, id: OrderIdentity) -> bool {
        let token = {
            let mut active = self.active.lock().unwrap();
            if active.contains_key(&id.uuid) {
                return false;
            }
            let token = self.shutdown.child_token();
            active.insert(id.uuid.clone(), token.clone());
            token
        };

        let uuid = id.uuid.clone();
        let worker = OrderWorker::new(
            id,
            Arc::clone(&self.store),
            Arc::clone(&self.fetcher),
            self.update_tx.clone(),
            token.clone(),
        );

        let active = Arc::clone(&self.active);
        self.workers.spawn(async move {
            worker.run().await;
            active.lock().unwrap().remove(&uuid);
            token.cancel();
        });

        true
    }

    /// Stop tracking one order. Idempotent when the uuid is unknown.
    pub fn stop_tracking(&self, uuid: &str) {
        if let Some(token) = self.active.lock().unwrap().remove(uuid) {
            token.cancel();
        }
        tracing::info!(uuid = %uuid, "tracking stopped");
    }

    /// Restart workers for every non-terminal order found in the store.
    /// Already-tracked uuids are silently skipped.
    pub async fn resume_active_orders(&self) {
        tracing::info!("checking for interrupted orders");

        let orders = match self.store.list_resumable_orders().await {
            Ok(orders) => orders,
            Err(e) => {
                tracing::error!(error = %e, "failed to list resumable orders");
                return;
            }
        };

        let mut count = 0;
        for order in orders {
            let id = OrderIdentity::from(order);
            let uuid = id.uuid.clone();
            if self.start_tracking(id) {
                tracing::info!(uuid = %uuid, "tracking resumed");
                count += 1;
            }
        }
        tracing::info!(count, "orders resumed");
    }

    /// Whether a worker is currently registered for `uuid`.
    pub fn is_tracking(&self, uuid: &str) -> bool {
        self.active.lock().unwrap().contains_key(uuid)
    }

    /// Number of orders currently tracked.
    pub fn active_count(&self) -> usize {
        self.active.lock().unwrap().len()
    }

    /// Cancel every worker, wait for all of them to exit, then close the
    /// update channel. Consumers observe end-of-stream exactly once.
    pub async fn shutdown(self) {
        {
            let mut active = self.active.lock().unwrap();
            for (_, token) in active.drain() {
                token.cancel();
            }
        }
        self.shutdown.cancel();

        self.workers.close();
        self.workers.wait().await;
        tracing::info!("all order workers stopped");
        // dropping self releases the last update sender, closing the channel
    }
}
