//! Tracking domain model: order identity, lifecycle phase, and the envelope
//! published on the update channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle tag of an order.
///
/// The wire form stays stringly-typed: known tags map to their variant, any
/// other tag is carried verbatim and treated as in-progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderPhase {
    Active,
    Completed,
    Delivered,
    Cancelled,
    Failed,
    /// Any unrecognized tag; polling continues.
    InProgress(String),
}

impl OrderPhase {
    pub fn as_str(&self) -> &str {
        match self {
            OrderPhase::Active => "ACTIVE",
            OrderPhase::Completed => "COMPLETED",
            OrderPhase::Delivered => "DELIVERED",
            OrderPhase::Cancelled => "CANCELLED",
            OrderPhase::Failed => "FAILED",
            OrderPhase::InProgress(tag) => tag,
        }
    }

    /// Terminal phases end tracking; no further polls are scheduled.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderPhase::Completed
                | OrderPhase::Delivered
                | OrderPhase::Cancelled
                | OrderPhase::Failed
        )
    }
}

impl From<&str> for OrderPhase {
    fn from(tag: &str) -> Self {
        match tag {
            "ACTIVE" => OrderPhase::Active,
            "COMPLETED" => OrderPhase::Completed,
            "DELIVERED" => OrderPhase::Delivered,
            "CANCELLED" => OrderPhase::Cancelled,
            "FAILED" => OrderPhase::Failed,
            other => OrderPhase::InProgress(other.to_string()),
        }
    }
}

impl From<String> for OrderPhase {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "ACTIVE" => OrderPhase::Active,
            "COMPLETED" => OrderPhase::Completed,
            "DELIVERED" => OrderPhase::Delivered,
            "CANCELLED" => OrderPhase::Cancelled,
            "FAILED" => OrderPhase::Failed,
            _ => OrderPhase::InProgress(tag),
        }
    }
}

impl From<OrderPhase> for String {
    fn from(phase: OrderPhase) -> Self {
        phase.as_str().to_string()
    }
}

impl fmt::Display for OrderPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable identifiers of one tracked order.
///
/// `uuid` is the only field used for routing, deduplication, and
/// persistence keying; the rest is addressing metadata for the consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderIdentity {
    pub uuid: String,
    pub channel_id: String,
    pub guild_id: String,
    pub client_id: String,
    pub cuistot_id: String,
}

/// Full state of a tracked order, published on the update channel and
/// persisted by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedOrder {
    pub uuid: String,
    pub guild_id: String,
    pub channel_id: String,
    pub last_status: OrderPhase,
    pub last_updated: DateTime<Utc>,
    pub full_json_data: String,
    pub client_id: String,
    pub cuistot_id: String,
    pub last_progress: i32,
    pub last_text: String,
    /// Chat message edited by the consumer; set out-of-band, never written
    /// by the tracking core.
    pub message_id: String,
    /// Minutes remaining, extracted from the background feed cards; -1 when
    /// unknown.
    pub eta_minutes: i32,
}

/// Minimum routing identity needed to restart a worker after a restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumableOrder {
    pub uuid: String,
    pub channel_id: String,
    pub guild_id: String,
    pub client_id: String,
    pub cuistot_id: String,
}

impl From<ResumableOrder> for OrderIdentity {
    fn from(order: ResumableOrder) -> Self {
        Self {
            uuid: order.uuid,
            channel_id: order.channel_id,
            guild_id: order.guild_id,
            client_id: order.client_id,
            cuistot_id: order.cuistot_id,
        }
    }
}
