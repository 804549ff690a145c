//! Order-tracking core
//!
//! - [`wire`]: serde model of the remote tracking payload
//! - [`parser`]: merge engine, disguised-cancellation detection, ETA extraction
//! - [`reconcile`]: new-snapshot vs stored-state reconciliation
//! - [`schedule`]: adaptive polling cadence
//! - [`worker`]: per-order polling task
//! - [`manager`]: worker registry and supervision

pub mod manager;
pub mod model;
pub mod parser;
pub mod reconcile;
pub mod schedule;
pub mod wire;
pub mod worker;

pub use manager::TrackerManager;
pub use model::{OrderIdentity, OrderPhase, ResumableOrder, TrackedOrder};
pub use reconcile::{reconcile, ReconcileResult};
pub use worker::OrderWorker;

use thiserror::Error;

/// Errors raised inside one scan cycle.
///
/// Fetch, decode, and empty-response failures count against the worker's
/// failure cap; store failures are recoverable at the next poll and do not.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("fetch: {0}")]
    Fetch(#[from] crate::fetch::FetchError),

    #[error("decode: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("no order in response")]
    EmptyResponse,

    #[error("store: {0}")]
    Store(#[from] crate::store::StoreError),
}
