//! Merge engine for remote order snapshots.
//!
//! The remote endpoint progressively drops fields as an order advances
//! (total after payment confirmation, courier PIN after handoff, address
//! near the end). The merge keeps those visible across polls while still
//! letting fresh authoritative values win, and corrects the one case where
//! the endpoint lies about the phase.

use super::model::OrderPhase;
use super::wire::{CourierInfo, DeliveryInfo, Order};

/// Values that vanish from the feed mid-flight and are carried forward.
#[derive(Debug, Default)]
struct PreservedInfo {
    total: String,
    address: String,
    pin: String,
}

/// Scan the feed cards and keep the last non-empty total, address, and PIN.
fn extract_preserved_info(order: &Order) -> PreservedInfo {
    let mut kept = PreservedInfo::default();
    for card in &order.feed_cards {
        if !card.order_summary.total.is_empty() {
            kept.total = card.order_summary.total.clone();
        }
        if let Some(delivery) = &card.delivery {
            if !delivery.address.is_empty() {
                kept.address = delivery.address.clone();
            }
        }
        for courier in &card.courier {
            if !courier.pin_info.pin.is_empty() {
                kept.pin = courier.pin_info.pin.clone();
            }
        }
    }
    kept
}

/// Re-inject preserved values into the first feed card when the current
/// order lost them. Fresh non-empty values are left untouched.
fn restore_preserved_info(order: &mut Order, kept: &PreservedInfo) {
    let Some(card) = order.feed_cards.first_mut() else {
        return;
    };

    if card.order_summary.total.is_empty() && !kept.total.is_empty() {
        card.order_summary.total = kept.total.clone();
    }
    if !kept.address.is_empty() {
        let delivery = card.delivery.get_or_insert_with(DeliveryInfo::default);
        if delivery.address.is_empty() {
            delivery.address = kept.address.clone();
        }
    }
    if !kept.pin.is_empty() {
        if card.courier.is_empty() {
            card.courier.push(CourierInfo::default());
        }
        if card.courier[0].pin_info.pin.is_empty() {
            card.courier[0].pin_info.pin = kept.pin.clone();
        }
    }
}

/// Effective phase of an incoming order.
///
/// The endpoint reports a cancelled order as `COMPLETED` with an "annulée"
/// call-to-action; that disguise is unmasked here.
pub fn detect_phase(incoming: &Order) -> OrderPhase {
    let phase = OrderPhase::from(incoming.order_info.order_phase.as_str());
    if phase == OrderPhase::Completed {
        for card in &incoming.feed_cards {
            if let Some(cta) = &card.call_to_action {
                if cta.title.to_lowercase().contains("annul") {
                    return OrderPhase::Cancelled;
                }
            }
        }
    }
    phase
}

/// Extract the ETA in minutes from the background feed cards.
///
/// First `LABEL` map entity, in document order, whose trimmed title parses
/// as an integer; -1 when none does.
pub fn extract_eta_from_order(order: &Order) -> i32 {
    for card in &order.background_feed_cards {
        for entity in &card.map_entity {
            if entity.entity_type == "LABEL" {
                if let Ok(parsed) = entity.title.trim().parse::<i32>() {
                    return parsed;
                }
            }
        }
    }
    -1
}

/// Merge `incoming` into `master` and return the merged order together with
/// the detected phase.
pub fn merge_order_data(
    mut master: Order,
    incoming: Order,
    has_old_data: bool,
) -> (Order, OrderPhase) {
    // 1. Preserved fields: previous values first, fresh ones win.
    let mut kept = if has_old_data {
        extract_preserved_info(&master)
    } else {
        PreservedInfo::default()
    };
    let fresh = extract_preserved_info(&incoming);
    if !fresh.total.is_empty() {
        kept.total = fresh.total;
    }
    if !fresh.address.is_empty() {
        kept.address = fresh.address;
    }
    if !fresh.pin.is_empty() {
        kept.pin = fresh.pin;
    }

    let phase = detect_phase(&incoming);

    // 2. Top-level overwrites, wholesale when the incoming side has data.
    if !incoming.active_order_overview.title.is_empty() {
        master.active_order_overview = incoming.active_order_overview;
    }
    if !incoming.contacts.is_empty() {
        master.contacts = incoming.contacts;
    }

    // 3. Feed cards: a completed order rewrites the first status card in
    // place (the endpoint stops sending usable cards at that point);
    // otherwise fresh cards replace the old set wholesale.
    if phase == OrderPhase::Completed {
        for card in &mut master.feed_cards {
            if let Some(status) = card.status.as_mut() {
                status.title = "Commande Livrée".to_string();
                status.title_summary.summary.text =
                    "Bon appétit ! La commande a été livrée.".to_string();
                status.status_summary.text = "Livraison terminée".to_string();
                status.current_progress = 5;
                status.total_progress = 5;
                break;
            }
        }
    } else if incoming
        .feed_cards
        .first()
        .is_some_and(|card| card.status.is_some())
    {
        master.feed_cards = incoming.feed_cards;
    }

    master.order_info.order_phase = phase.as_str().to_string();

    // 4. Put back whatever the current cards lost.
    restore_preserved_info(&mut master, &kept);

    (master, phase)
}
