//! Per-order polling worker.
//!
//! One long-running task per tracked order: fetch → decode → reconcile →
//! emit on an adaptive cadence, until the order reaches a terminal phase,
//! the failure cap is hit, or the manager cancels the token. Every
//! suspension point is raced against cancellation.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::fetch::Fetcher;
use crate::store::OrderStore;
use crate::utils::safe_truncate;

use super::model::{OrderIdentity, OrderPhase, TrackedOrder};
use super::parser::extract_eta_from_order;
use super::reconcile::{reconcile, ReconcileResult};
use super::schedule::{adaptive_interval, poll_jitter};
use super::wire::Response;
use super::TrackerError;

/// Consecutive scan failures after which tracking is abandoned.
const MAX_FAILS: u32 = 10;

/// Outcome of one scan cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    Continue,
    Stop,
}

/// Polling task for a single order.
///
/// Talks to the outside world only through the injected store, fetcher, and
/// update channel; the token comes from the manager and is the sole stop
/// signal besides the order itself terminating.
pub struct OrderWorker {
    id: OrderIdentity,
    store: Arc<dyn OrderStore>,
    fetcher: Arc<dyn Fetcher>,
    updates: mpsc::Sender<TrackedOrder>,
    shutdown: CancellationToken,
    fail_count: u32,
    no_change_count: u32,
    last_known_eta: i32,
}

impl OrderWorker {
    pub fn new(
        id: OrderIdentity,
        store: Arc<dyn OrderStore>,
        fetcher: Arc<dyn Fetcher>,
        updates: mpsc::Sender<TrackedOrder>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            id,
            store,
            fetcher,
            updates,
            shutdown,
            fail_count: 0,
            no_change_count: 0,
            last_known_eta: -1,
        }
    }

    /// Run until the order terminates, the failure cap is hit, or the token
    /// fires. Blocking; meant to be spawned by the manager.
    pub async fn run(mut self) {
        tracing::info!(uuid = %self.id.uuid, "order worker started");
        let shutdown = self.shutdown.clone();

        // Initial scan
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::info!(uuid = %safe_truncate(&self.id.uuid, 8), "worker cancelled");
                return;
            }
            outcome = self.scan() => {
                if outcome == Scan::Stop {
                    return;
                }
            }
        }

        loop {
            let interval = adaptive_interval(self.last_known_eta, self.no_change_count)
                + poll_jitter();

            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!(uuid = %safe_truncate(&self.id.uuid, 8), "worker cancelled");
                    return;
                }
                _ = tokio::time::sleep(Duration::from_secs(interval)) => {}
            }

            let prev_fails = self.fail_count;
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!(uuid = %safe_truncate(&self.id.uuid, 8), "worker cancelled");
                    return;
                }
                outcome = self.scan() => {
                    if outcome == Scan::Stop {
                        return;
                    }
                }
            }

            self.refresh_known_eta().await;

            if self.fail_count == prev_fails {
                self.no_change_count += 1;
            } else {
                self.no_change_count = 0;
            }
        }
    }

    /// One fetch → decode → reconcile → emit cycle.
    async fn scan(&mut self) -> Scan {
        let resp = match self.fetch_and_decode().await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::error!(
                    uuid = %safe_truncate(&self.id.uuid, 8),
                    error = %e,
                    "scan failed"
                );
                self.fail_count += 1;
                if self.fail_count >= MAX_FAILS {
                    tracing::error!(
                        uuid = %safe_truncate(&self.id.uuid, 8),
                        max_fails = MAX_FAILS,
                        "abandoning order after repeated failures"
                    );
                    self.emit_failure().await;
                    return Scan::Stop;
                }
                return Scan::Continue;
            }
        };

        self.fail_count = 0;

        let result = match reconcile(self.store.as_ref(), &self.id.uuid, resp).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(
                    uuid = %safe_truncate(&self.id.uuid, 8),
                    error = %e,
                    "reconcile failed"
                );
                return Scan::Continue;
            }
        };

        let phase = result.phase.clone();
        if result.should_emit {
            if let Err(e) = self.emit_update(result).await {
                tracing::error!(
                    uuid = %safe_truncate(&self.id.uuid, 8),
                    error = %e,
                    "emit failed"
                );
            }
        }

        if matches!(
            phase,
            OrderPhase::Completed | OrderPhase::Delivered | OrderPhase::Cancelled
        ) {
            Scan::Stop
        } else {
            Scan::Continue
        }
    }

    async fn fetch_and_decode(&self) -> Result<Response, TrackerError> {
        let bytes = self.fetcher.fetch(&self.id.uuid).await?;
        let resp: Response = serde_json::from_slice(&bytes)?;
        if resp.data.orders.is_empty() {
            return Err(TrackerError::EmptyResponse);
        }
        Ok(resp)
    }

    /// Persist the reconciled state and publish it on the update channel.
    /// A persistence failure skips the send; the next poll retries.
    async fn emit_update(&self, result: ReconcileResult) -> Result<(), TrackerError> {
        // the message id is advisory: misses and errors read as empty
        let message_id = self
            .store
            .get_message_id(&self.id.uuid)
            .await
            .ok()
            .flatten()
            .unwrap_or_default();

        let tracked = TrackedOrder {
            uuid: self.id.uuid.clone(),
            guild_id: self.id.guild_id.clone(),
            channel_id: self.id.channel_id.clone(),
            last_status: result.phase,
            last_updated: Utc::now(),
            full_json_data: result.final_json,
            client_id: self.id.client_id.clone(),
            cuistot_id: self.id.cuistot_id.clone(),
            last_progress: result.progress,
            last_text: result.text,
            message_id,
            eta_minutes: result.eta,
        };

        self.store.save_order(&tracked).await?;

        tracing::debug!(
            uuid = %safe_truncate(&self.id.uuid, 8),
            "state persisted, publishing update"
        );
        tokio::select! {
            _ = self.shutdown.cancelled() => {}
            _ = self.updates.send(tracked) => {}
        }
        Ok(())
    }

    /// Best-effort FAILED notice; dropped if cancellation wins the race.
    async fn emit_failure(&self) {
        let tracked = TrackedOrder {
            uuid: self.id.uuid.clone(),
            guild_id: self.id.guild_id.clone(),
            channel_id: self.id.channel_id.clone(),
            last_status: OrderPhase::Failed,
            last_updated: Utc::now(),
            full_json_data: String::new(),
            client_id: self.id.client_id.clone(),
            cuistot_id: self.id.cuistot_id.clone(),
            last_progress: 0,
            last_text: "Suivi abandonné après trop d'échecs.".to_string(),
            message_id: String::new(),
            eta_minutes: -1,
        };

        tokio::select! {
            _ = self.shutdown.cancelled() => {}
            _ = self.updates.send(tracked) => {}
        }
    }

    /// Adopt the ETA from the freshly persisted snapshot for the next
    /// scheduling round. Kept unchanged when the snapshot is unreadable or
    /// carries no ETA.
    async fn refresh_known_eta(&mut self) {
        let Ok(Some(snapshot)) = self.store.get_snapshot(&self.id.uuid).await else {
            return;
        };
        let Ok(resp) = serde_json::from_str::<Response>(&snapshot.raw_json) else {
            return;
        };
        if let Some(order) = resp.data.orders.first() {
            let eta = extract_eta_from_order(order);
            if eta >= 0 {
                self.last_known_eta = eta;
            }
        }
    }
}
