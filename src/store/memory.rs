//! In-memory order store.
//!
//! Backs tests and ephemeral runs. Supports seeding snapshots and injecting
//! one-shot errors to drive failure paths.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{OrderStore, Snapshot, StoreError, StoreResult};
use crate::tracker::{ResumableOrder, TrackedOrder};

#[derive(Default)]
struct MemoryState {
    snapshots: HashMap<String, Snapshot>,
    orders: HashMap<String, TrackedOrder>,
    messages: HashMap<String, String>,
    save_err: Option<StoreError>,
    snapshot_err: Option<StoreError>,
}

/// Hash-map-backed [`OrderStore`].
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a prior snapshot, simulating an order tracked before a restart.
    pub fn seed_snapshot(&self, uuid: &str, snapshot: Snapshot) {
        self.state
            .lock()
            .unwrap()
            .snapshots
            .insert(uuid.to_string(), snapshot);
    }

    /// Make the next `save_order` call fail with `err`.
    pub fn fail_next_save(&self, err: StoreError) {
        self.state.lock().unwrap().save_err = Some(err);
    }

    /// Make the next `get_snapshot` call fail with `err`.
    pub fn fail_next_snapshot(&self, err: StoreError) {
        self.state.lock().unwrap().snapshot_err = Some(err);
    }

    /// Last saved version of an order.
    pub fn order(&self, uuid: &str) -> Option<TrackedOrder> {
        self.state.lock().unwrap().orders.get(uuid).cloned()
    }

    /// Number of orders ever saved.
    pub fn order_count(&self) -> usize {
        self.state.lock().unwrap().orders.len()
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn get_snapshot(&self, uuid: &str) -> StoreResult<Option<Snapshot>> {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.snapshot_err.take() {
            return Err(err);
        }
        Ok(state.snapshots.get(uuid).cloned())
    }

    async fn save_order(&self, order: &TrackedOrder) -> StoreResult<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.save_err.take() {
            return Err(err);
        }

        state.orders.insert(order.uuid.clone(), order.clone());
        state.snapshots.insert(
            order.uuid.clone(),
            Snapshot {
                status: order.last_status.clone(),
                progress: order.last_progress,
                text: order.last_text.clone(),
                raw_json: order.full_json_data.clone(),
            },
        );
        if !order.message_id.is_empty() {
            state
                .messages
                .insert(order.uuid.clone(), order.message_id.clone());
        }
        Ok(())
    }

    async fn get_message_id(&self, uuid: &str) -> StoreResult<Option<String>> {
        Ok(self.state.lock().unwrap().messages.get(uuid).cloned())
    }

    async fn get_pending_orders(&self) -> StoreResult<HashMap<String, i32>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .orders
            .values()
            .filter(|order| !order.last_status.is_terminal())
            .map(|order| (order.uuid.clone(), order.last_progress))
            .collect())
    }

    async fn list_resumable_orders(&self) -> StoreResult<Vec<ResumableOrder>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .orders
            .values()
            .filter(|order| !order.last_status.is_terminal())
            .map(|order| ResumableOrder {
                uuid: order.uuid.clone(),
                channel_id: order.channel_id.clone(),
                guild_id: order.guild_id.clone(),
                client_id: order.client_id.clone(),
                cuistot_id: order.cuistot_id.clone(),
            })
            .collect())
    }
}
