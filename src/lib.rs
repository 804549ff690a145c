//! Delivery Tracker - lifecycle tracking for food-delivery orders
//!
//! # Architecture
//!
//! The tracker polls a remote tracking endpoint once per order, reconciles
//! each snapshot against the previously persisted state, and emits change
//! events on a bounded channel for a downstream consumer (typically a
//! chat-bot editing one message per order).
//!
//! # Module structure
//!
//! ```text
//! src/
//! ├── core/          # configuration
//! ├── tracker/       # wire model, merge engine, workers, manager (core engine)
//! ├── store/         # persistence seam + redb / in-memory implementations
//! ├── fetch/         # fetcher seam + HTTP implementation
//! └── utils/         # logging setup, small helpers
//! ```

pub mod core;
pub mod fetch;
pub mod store;
pub mod tracker;
pub mod utils;

pub use crate::core::Config;
pub use fetch::{FetchError, Fetcher, HttpFetcher};
pub use store::{MemoryStore, OrderStore, RedbStore, Snapshot, StoreError};
pub use tracker::{
    OrderIdentity, OrderPhase, ResumableOrder, TrackedOrder, TrackerError, TrackerManager,
};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};
