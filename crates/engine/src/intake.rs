//! Event intake — normalizes a created record into a dispatch request.

use relay_common::types::{MessageDefaults, NotificationRecord, RecordCreated, SkipReason};

/// Normalized fields needed by the downstream stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRequest {
    pub record_id: String,
    pub recipient_id: String,
    pub title: String,
    pub body: String,
}

/// First pipeline stage. Applies the configured defaults and rejects records
/// that name no recipient.
#[derive(Debug, Clone, Default)]
pub struct EventIntake {
    defaults: MessageDefaults,
}

impl EventIntake {
    pub fn new(defaults: MessageDefaults) -> Self {
        Self { defaults }
    }

    pub fn extract(&self, event: &RecordCreated) -> Result<DispatchRequest, SkipReason> {
        let record = NotificationRecord::from_event(event);

        let recipient_id = match non_empty(record.recipient_id) {
            Some(id) => id,
            None => {
                tracing::info!(record_id = %record.id, "No recipient in notification record");
                return Err(SkipReason::MissingRecipient);
            }
        };

        Ok(DispatchRequest {
            record_id: record.id,
            recipient_id,
            title: non_empty(record.title).unwrap_or_else(|| self.defaults.title.clone()),
            body: non_empty(record.body).unwrap_or_else(|| self.defaults.body.clone()),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}
