//! Deliverer — hands the payload to the push-delivery service once.

use std::future::Future;

use relay_common::error::AppError;
use relay_common::types::{DeliveryPayload, SkipReason};

/// A push-delivery service.
pub trait PushSender: Send + Sync {
    /// Send one message. Returns the service's opaque receipt on success.
    fn send(
        &self,
        payload: &DeliveryPayload,
    ) -> impl Future<Output = Result<String, AppError>> + Send;
}

pub struct Deliverer<P> {
    sender: P,
}

impl<P: PushSender> Deliverer<P> {
    pub fn new(sender: P) -> Self {
        Self { sender }
    }

    pub fn sender(&self) -> &P {
        &self.sender
    }

    /// Invoke the delivery service exactly once. Failures are logged and
    /// reported as [`SkipReason::DeliveryFailed`].
    pub async fn deliver(&self, payload: &DeliveryPayload) -> Result<String, SkipReason> {
        match self.sender.send(payload).await {
            Ok(receipt) => {
                tracing::info!(receipt = %receipt, "Successfully sent message");
                Ok(receipt)
            }
            Err(e) => {
                tracing::error!(error = %e, "Error sending notification");
                Err(SkipReason::DeliveryFailed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::builder::MessageBuilder;
    use crate::intake::DispatchRequest;

    struct FlakySender {
        fail: bool,
        calls: AtomicUsize,
    }

    impl PushSender for FlakySender {
        async fn send(&self, _payload: &DeliveryPayload) -> Result<String, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(AppError::Delivery("UNAVAILABLE".to_string()))
            } else {
                Ok("projects/demo/messages/1".to_string())
            }
        }
    }

    fn payload() -> DeliveryPayload {
        MessageBuilder::build(
            "T1".to_string(),
            &DispatchRequest {
                record_id: "rec-1".to_string(),
                recipient_id: "u1".to_string(),
                title: "Hi".to_string(),
                body: "There".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn test_success_returns_receipt() {
        let deliverer = Deliverer::new(FlakySender {
            fail: false,
            calls: AtomicUsize::new(0),
        });
        assert_eq!(
            deliverer.deliver(&payload()).await,
            Ok("projects/demo/messages/1".to_string())
        );
        assert_eq!(deliverer.sender().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_is_swallowed_without_retry() {
        let deliverer = Deliverer::new(FlakySender {
            fail: true,
            calls: AtomicUsize::new(0),
        });
        assert_eq!(
            deliverer.deliver(&payload()).await,
            Err(SkipReason::DeliveryFailed)
        );
        assert_eq!(deliverer.sender().calls.load(Ordering::SeqCst), 1);
    }
}
