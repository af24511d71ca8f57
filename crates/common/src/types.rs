use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Title used when a notification record carries none.
pub const DEFAULT_TITLE: &str = "New notification";

/// Body used when a notification record carries none.
pub const DEFAULT_BODY: &str = "Tienes un nuevo mensaje en la app";

/// A "record created" event as delivered by the data store's change feed
/// or by an HTTP invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordCreated {
    /// Identifier assigned to the record by the store.
    pub id: String,
    /// The record's field set.
    #[serde(default)]
    pub data: serde_json::Value,
}

/// A notification intent written by a producer.
///
/// Built from the raw field set of a [`RecordCreated`] event. Fields holding
/// anything other than a string are treated as absent; unknown fields are
/// ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRecord {
    pub id: String,
    pub recipient_id: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
}

impl NotificationRecord {
    /// Field names accepted for the recipient, in lookup order.
    const RECIPIENT_FIELDS: &[&str] = &["recipientId", "userId"];

    pub fn from_event(event: &RecordCreated) -> Self {
        let field = |key: &str| {
            event
                .data
                .get(key)
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };

        Self {
            id: event.id.clone(),
            recipient_id: Self::RECIPIENT_FIELDS.iter().find_map(|key| field(*key)),
            title: field("title"),
            body: field("body"),
        }
    }
}

/// A user profile as seen by the resolver. Owned by the user-management
/// subsystem; read-only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub delivery_token: Option<String>,
}

/// Visible part of a push message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
}

/// Fully assembled push message, ready for the delivery service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryPayload {
    /// Device token the message is addressed to.
    pub target: String,
    pub notification: NotificationContent,
    /// Routing metadata handed to the client app.
    pub data: BTreeMap<String, String>,
}

/// Fallback strings applied by event intake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDefaults {
    pub title: String,
    pub body: String,
}

impl Default for MessageDefaults {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            body: DEFAULT_BODY.to_string(),
        }
    }
}

/// Why a dispatch ended without a delivered message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingRecipient,
    UserNotFound,
    MissingToken,
    LookupFailed,
    DeliveryFailed,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::MissingRecipient => write!(f, "missing_recipient"),
            SkipReason::UserNotFound => write!(f, "user_not_found"),
            SkipReason::MissingToken => write!(f, "missing_token"),
            SkipReason::LookupFailed => write!(f, "lookup_failed"),
            SkipReason::DeliveryFailed => write!(f, "delivery_failed"),
        }
    }
}

/// Terminal result of one pipeline traversal. Never persisted, only logged
/// and (for HTTP invocations) echoed back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DispatchOutcome {
    Delivered { receipt: String },
    Skipped { reason: SkipReason },
}

impl DispatchOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DispatchOutcome::Delivered { .. })
    }

    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            DispatchOutcome::Delivered { .. } => None,
            DispatchOutcome::Skipped { reason } => Some(*reason),
        }
    }
}

impl From<SkipReason> for DispatchOutcome {
    fn from(reason: SkipReason) -> Self {
        DispatchOutcome::Skipped { reason }
    }
}

impl std::fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchOutcome::Delivered { .. } => write!(f, "delivered"),
            DispatchOutcome::Skipped { reason } => write!(f, "{}", reason),
        }
    }
}
