//! Persistence seam for tracked orders.
//!
//! The tracking core consumes [`OrderStore`] purely through its capability
//! set; [`RedbStore`] is the embedded production implementation and
//! [`MemoryStore`] backs tests and ephemeral runs.

mod memory;
mod redb;

pub use self::memory::MemoryStore;
pub use self::redb::RedbStore;

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

use crate::tracker::{OrderPhase, ResumableOrder, TrackedOrder};

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Last persisted state of an order.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub status: OrderPhase,
    pub progress: i32,
    pub text: String,
    /// Complete serialized previous response; merge basis for the next poll.
    pub raw_json: String,
}

/// Persistence capability consumed by the tracking core.
///
/// Implementations must be internally thread-safe: many workers call them
/// concurrently. Writes are atomic from the core's perspective.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Last known state for `uuid`; `None` when never saved.
    async fn get_snapshot(&self, uuid: &str) -> StoreResult<Option<Snapshot>>;

    /// Upsert keyed by `order.uuid`. An empty `message_id` keeps any
    /// previously stored mapping.
    async fn save_order(&self, order: &TrackedOrder) -> StoreResult<()>;

    /// Chat message id associated with `uuid`, if any.
    async fn get_message_id(&self, uuid: &str) -> StoreResult<Option<String>>;

    /// Non-terminal orders, uuid → last progress.
    async fn get_pending_orders(&self) -> StoreResult<HashMap<String, i32>>;

    /// Non-terminal orders with full routing identity, for resume after
    /// restart.
    async fn list_resumable_orders(&self) -> StoreResult<Vec<ResumableOrder>>;
}
