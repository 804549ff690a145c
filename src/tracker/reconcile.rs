//! Reconciliation of a fresh remote snapshot against stored prior state.

use crate::store::OrderStore;
use crate::utils::safe_truncate;

use super::model::OrderPhase;
use super::parser::{extract_eta_from_order, merge_order_data};
use super::wire::{Order, Response};
use super::TrackerError;

/// Outcome of one reconciliation cycle, with everything the worker needs to
/// decide whether a downstream update is warranted.
#[derive(Debug, Clone)]
pub struct ReconcileResult {
    /// Serialized merged response; becomes the next poll's merge basis.
    pub final_json: String,
    pub phase: OrderPhase,
    pub progress: i32,
    pub text: String,
    pub eta: i32,
    pub should_emit: bool,
}

/// Merge the first order of `resp` with the snapshot stored for `uuid` and
/// compute the emission decision. Persists nothing.
pub async fn reconcile(
    store: &dyn OrderStore,
    uuid: &str,
    mut resp: Response,
) -> Result<ReconcileResult, TrackerError> {
    let new_order = match resp.data.orders.first() {
        Some(order) => order.clone(),
        None => return Err(TrackerError::EmptyResponse),
    };
    tracing::debug!(
        uuid = %safe_truncate(uuid, 8),
        phase = %new_order.order_info.order_phase,
        "snapshot received"
    );

    // Prior snapshot; a read error reads as a first poll.
    let prior = store.get_snapshot(uuid).await.ok().flatten();

    let mut master: Option<Order> = None;
    if let Some(snapshot) = &prior {
        if !snapshot.raw_json.is_empty() {
            if let Ok(last) = serde_json::from_str::<Response>(&snapshot.raw_json) {
                master = last.data.orders.into_iter().next();
            }
        }
    }

    let has_old_data = master.is_some();
    let master = master.unwrap_or_else(|| new_order.clone());

    let (mut merged, phase) = merge_order_data(master, new_order.clone(), has_old_data);

    // The background cards carry the live ETA; always take the freshest.
    if !new_order.background_feed_cards.is_empty() {
        merged.background_feed_cards = new_order.background_feed_cards;
    }

    let (progress, text) = merged
        .feed_cards
        .first()
        .and_then(|card| card.status.as_ref())
        .map(|status| (status.current_progress, status.status_summary.text.clone()))
        .unwrap_or_default();

    let eta = extract_eta_from_order(&merged);

    resp.data.orders[0] = merged;
    let final_json = serde_json::to_string(&resp)?;

    // An order with a known ETA emits on every poll (the ETA changes almost
    // every time); without one, only meaningful state changes emit.
    let should_emit = match (&prior, has_old_data) {
        (Some(last), true) => {
            phase != last.status
                || progress != last.progress
                || text != last.text
                || eta >= 0
        }
        _ => true,
    };

    Ok(ReconcileResult {
        final_json,
        phase,
        progress,
        text,
        eta,
        should_emit,
    })
}
