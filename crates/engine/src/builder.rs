//! Message builder — assembles the delivery-service payload.

use std::collections::BTreeMap;

use relay_common::types::{DeliveryPayload, NotificationContent};

use crate::intake::DispatchRequest;

/// Click action that makes the client app's notification handler fire.
pub const CLICK_ACTION: &str = "FLUTTER_NOTIFICATION_CLICK";

/// Screen the client app opens when the notification is tapped.
pub const ROUTE: &str = "notifications";

pub struct MessageBuilder;

impl MessageBuilder {
    /// Build the payload for `token`. Title and body are used verbatim; the
    /// routing metadata is the same for every message.
    pub fn build(token: String, request: &DispatchRequest) -> DeliveryPayload {
        DeliveryPayload {
            target: token,
            notification: NotificationContent {
                title: request.title.clone(),
                body: request.body.clone(),
            },
            data: Self::routing_data(),
        }
    }

    pub fn routing_data() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("click_action".to_string(), CLICK_ACTION.to_string()),
            ("route".to_string(), ROUTE.to_string()),
        ])
    }
}
