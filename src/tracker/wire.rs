//! Wire model of the remote tracking payload.
//!
//! Every field is optional on the wire; decoding tolerates absence and
//! re-serialization keeps the remote's field names. The persisted JSON is
//! always the re-serialized merged [`Response`], never the raw bytes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Response {
    pub data: Data,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Data {
    pub orders: Vec<Order>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Order {
    pub contacts: Vec<Contact>,
    pub active_order_overview: ActiveOrderOverview,
    pub feed_cards: Vec<FeedCard>,
    pub background_feed_cards: Vec<BackgroundFeedCard>,
    pub order_info: OrderInfo,
}

/// Map data: courier position and the ETA label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BackgroundFeedCard {
    pub map_entity: Vec<MapEntity>,
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub card_type: String,
}

/// One point on the map (courier, restaurant, customer). For `LABEL`
/// entities the `title` carries the minutes remaining.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MapEntity {
    pub uuid: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub latitude: f64,
    pub longitude: f64,
    pub title: String,
    pub subtitle: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OrderInfo {
    pub order_phase: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Contact {
    pub title: String,
    pub formatted_phone_number: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ActiveOrderOverview {
    pub title: String,
    pub items: Vec<Item>,
    pub subtitle: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Item {
    pub title: String,
    pub quantity: i32,
    pub subtitle: String,
}

/// The feed card array mixes heterogeneous objects; the optional members
/// stay absent on re-serialization when the remote never sent them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeedCard {
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub card_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_to_action: Option<CallToAction>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub courier: Vec<CourierInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery: Option<DeliveryInfo>,
    pub order_summary: OrderSummary,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderSummary {
    pub total: String,
}

/// Final message shown by the remote (cancellation, error, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CallToAction {
    pub title: String,
    pub subtitle: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatusInfo {
    pub title: String,
    pub subtitle: String,
    pub status_summary: SummaryText,
    pub timeline_summary: String,
    pub current_progress: i32,
    #[serde(rename = "totalProgressSegments")]
    pub total_progress: i32,
    pub title_summary: SummaryWrapper,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SummaryText {
    pub text: String,
    pub info_text: String,
    pub info_body: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryWrapper {
    pub summary: SummaryContent,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryContent {
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CourierInfo {
    #[serde(default, rename = "pinVerificationInfo")]
    pub pin_info: PinInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinInfo {
    pub pin: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeliveryInfo {
    #[serde(default, rename = "formattedAddress")]
    pub address: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_remote_payload() {
        let raw = r#"{
            "data": { "orders": [ {
                "orderInfo": { "orderPhase": "ACTIVE" },
                "activeOrderOverview": { "title": "Chez Momo", "items": [
                    { "title": "Bo bun", "quantity": 2, "subtitle": "sans coriandre" }
                ] },
                "feedCards": [ {
                    "type": "orderTracking",
                    "status": {
                        "title": "Préparation en cours",
                        "statusSummary": { "text": "En préparation" },
                        "currentProgress": 2,
                        "totalProgressSegments": 5
                    },
                    "courier": [ { "pinVerificationInfo": { "pin": "4321" } } ],
                    "delivery": { "formattedAddress": "12 Rue de la Paix" },
                    "orderSummary": { "total": "15,90 €" }
                } ],
                "backgroundFeedCards": [ {
                    "mapEntity": [
                        { "type": "PICKUP", "title": "Chez Momo" },
                        { "type": "LABEL", "title": " 12 " }
                    ]
                } ]
            } ] }
        }"#;

        let resp: Response = serde_json::from_str(raw).unwrap();
        let order = &resp.data.orders[0];
        assert_eq!(order.order_info.order_phase, "ACTIVE");
        assert_eq!(order.active_order_overview.title, "Chez Momo");

        let status = order.feed_cards[0].status.as_ref().unwrap();
        assert_eq!(status.current_progress, 2);
        assert_eq!(status.total_progress, 5);
        assert_eq!(status.status_summary.text, "En préparation");

        assert_eq!(order.feed_cards[0].courier[0].pin_info.pin, "4321");
        assert_eq!(
            order.feed_cards[0].delivery.as_ref().unwrap().address,
            "12 Rue de la Paix"
        );
        assert_eq!(order.feed_cards[0].order_summary.total, "15,90 €");
        assert_eq!(order.background_feed_cards[0].map_entity[1].title, " 12 ");
    }

    #[test]
    fn test_decode_tolerates_missing_fields() {
        let resp: Response = serde_json::from_str(r#"{"data":{"orders":[{}]}}"#).unwrap();
        let order = &resp.data.orders[0];
        assert_eq!(order.order_info.order_phase, "");
        assert!(order.feed_cards.is_empty());
        assert!(order.background_feed_cards.is_empty());
    }

    #[test]
    fn test_absent_objects_stay_absent_on_reserialize() {
        let resp: Response = serde_json::from_str(
            r#"{"data":{"orders":[{"feedCards":[{"status":{"currentProgress":1}}]}]}}"#,
        )
        .unwrap();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(!json.contains("callToAction"));
        assert!(!json.contains("delivery"));
        assert!(!json.contains("courier"));
        // remote field names are kept as-is
        assert!(json.contains("totalProgressSegments"));
        assert!(json.contains("orderSummary"));
        assert!(json.contains("orderInfo"));
    }
}
