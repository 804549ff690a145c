//! Shared fixtures for the integration tests: a fluent order factory and a
//! FIFO fetcher fed with canned responses.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use delivery_tracker::fetch::{FetchError, Fetcher};
use delivery_tracker::store::{MemoryStore, Snapshot};
use delivery_tracker::tracker::wire::{
    BackgroundFeedCard, CallToAction, CourierInfo, Data, DeliveryInfo, FeedCard, MapEntity, Order,
    Response, StatusInfo, SummaryText,
};
use delivery_tracker::tracker::{OrderIdentity, OrderPhase, TrackedOrder};

/// Routing identity with fixed metadata; only the uuid varies per test.
pub fn identity(uuid: &str) -> OrderIdentity {
    OrderIdentity {
        uuid: uuid.to_string(),
        channel_id: "ch-1".to_string(),
        guild_id: "g1".to_string(),
        client_id: "c1".to_string(),
        cuistot_id: "k1".to_string(),
    }
}

/// A saved order, for seeding resumable state.
pub fn tracked_order(uuid: &str, status: OrderPhase) -> TrackedOrder {
    TrackedOrder {
        uuid: uuid.to_string(),
        guild_id: "g1".to_string(),
        channel_id: "ch-1".to_string(),
        last_status: status,
        last_updated: Utc::now(),
        full_json_data: String::new(),
        client_id: "c1".to_string(),
        cuistot_id: "k1".to_string(),
        last_progress: 2,
        last_text: "En préparation".to_string(),
        message_id: String::new(),
        eta_minutes: -1,
    }
}

/// Seed the store with the snapshot a previous poll would have left behind.
pub fn seed_snapshot(store: &MemoryStore, uuid: &str, resp: &Response) {
    let order = &resp.data.orders[0];
    let (progress, text) = order
        .feed_cards
        .first()
        .and_then(|card| card.status.as_ref())
        .map(|status| (status.current_progress, status.status_summary.text.clone()))
        .unwrap_or_default();

    store.seed_snapshot(
        uuid,
        Snapshot {
            status: OrderPhase::from(order.order_info.order_phase.as_str()),
            progress,
            text,
            raw_json: serde_json::to_string(resp).unwrap(),
        },
    );
}

// ══════════════════════════════════════════════════════════════
// OrderBuilder — fluent factory for wire orders
// ══════════════════════════════════════════════════════════════

/// Builds wire orders with realistic defaults: a restaurant, one status
/// card at progress 2/5, no background cards.
pub struct OrderBuilder {
    order: Order,
}

impl OrderBuilder {
    pub fn new() -> Self {
        let mut order = Order::default();
        order.active_order_overview.title = "Test Restaurant".to_string();
        order.feed_cards.push(FeedCard {
            status: Some(StatusInfo {
                title: "En préparation".to_string(),
                status_summary: SummaryText {
                    text: "En préparation".to_string(),
                    ..SummaryText::default()
                },
                current_progress: 2,
                total_progress: 5,
                ..StatusInfo::default()
            }),
            ..FeedCard::default()
        });
        Self { order }
    }

    pub fn phase(mut self, phase: &str) -> Self {
        self.order.order_info.order_phase = phase.to_string();
        self
    }

    pub fn restaurant(mut self, name: &str) -> Self {
        self.order.active_order_overview.title = name.to_string();
        self
    }

    pub fn progress(mut self, current: i32, total: i32) -> Self {
        if let Some(status) = self.first_status() {
            status.current_progress = current;
            status.total_progress = total;
        }
        self
    }

    pub fn status_text(mut self, text: &str) -> Self {
        if let Some(status) = self.first_status() {
            status.title = text.to_string();
            status.status_summary.text = text.to_string();
        }
        self
    }

    /// Background card whose LABEL entity carries the ETA in minutes.
    pub fn eta(mut self, minutes: i32) -> Self {
        self.order.background_feed_cards = vec![BackgroundFeedCard {
            map_entity: vec![MapEntity {
                entity_type: "LABEL".to_string(),
                title: minutes.to_string(),
                ..MapEntity::default()
            }],
            ..BackgroundFeedCard::default()
        }];
        self
    }

    pub fn call_to_action(mut self, title: &str) -> Self {
        if let Some(card) = self.order.feed_cards.first_mut() {
            card.call_to_action = Some(CallToAction {
                title: title.to_string(),
                ..CallToAction::default()
            });
        }
        self
    }

    pub fn total(mut self, total: &str) -> Self {
        if let Some(card) = self.order.feed_cards.first_mut() {
            card.order_summary.total = total.to_string();
        }
        self
    }

    pub fn address(mut self, address: &str) -> Self {
        if let Some(card) = self.order.feed_cards.first_mut() {
            card.delivery = Some(DeliveryInfo {
                address: address.to_string(),
            });
        }
        self
    }

    pub fn pin(mut self, pin: &str) -> Self {
        if let Some(card) = self.order.feed_cards.first_mut() {
            let mut courier = CourierInfo::default();
            courier.pin_info.pin = pin.to_string();
            card.courier = vec![courier];
        }
        self
    }

    fn first_status(&mut self) -> Option<&mut StatusInfo> {
        self.order
            .feed_cards
            .first_mut()
            .and_then(|card| card.status.as_mut())
    }

    pub fn build(self) -> Order {
        self.order
    }

    pub fn build_response(self) -> Response {
        Response {
            data: Data {
                orders: vec![self.order],
            },
        }
    }
}

// ══════════════════════════════════════════════════════════════
// MockFetcher — FIFO queue of canned responses
// ══════════════════════════════════════════════════════════════

/// Fetcher returning queued responses in FIFO order; an empty queue yields
/// an error, which the worker counts like any transient failure.
#[derive(Default)]
pub struct MockFetcher {
    responses: Mutex<VecDeque<Result<Vec<u8>, FetchError>>>,
    calls: AtomicUsize,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_response(&self, bytes: Vec<u8>) {
        self.responses.lock().unwrap().push_back(Ok(bytes));
    }

    pub fn queue_order(&self, order: Order) {
        let resp = Response {
            data: Data {
                orders: vec![order],
            },
        };
        self.queue_response(serde_json::to_vec(&resp).unwrap());
    }

    pub fn queue_error(&self, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(FetchError::Other(message.to_string())));
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, _uuid: &str) -> Result<Vec<u8>, FetchError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        match self.responses.lock().unwrap().pop_front() {
            Some(response) => response,
            None => Err(FetchError::Other(format!(
                "no more queued responses (call #{call})"
            ))),
        }
    }
}
