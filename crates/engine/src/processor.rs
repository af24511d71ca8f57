//! Dispatch pipeline.
//!
//! Receives a "record created" event and:
//! 1. Extracts recipient, title and body (via `EventIntake`)
//! 2. Looks up the recipient's delivery token (via `RecipientResolver`)
//! 3. Assembles the push payload (via `MessageBuilder`)
//! 4. Sends it once (via `Deliverer`)
//!
//! Every stage may end the traversal early with a `SkipReason`. Whatever
//! happens, `dispatch` returns a `DispatchOutcome` and never an error, so the
//! invoking platform always sees a normal completion.

use tracing::Instrument;
use uuid::Uuid;

use relay_common::types::{DispatchOutcome, MessageDefaults, RecordCreated, SkipReason};

use crate::builder::MessageBuilder;
use crate::deliverer::{Deliverer, PushSender};
use crate::intake::EventIntake;
use crate::resolver::RecipientResolver;
use crate::store::ProfileStore;

/// Orchestrates the four dispatch stages for one event at a time. Holds no
/// per-event state, so one instance can serve concurrent invocations.
pub struct DispatchPipeline<S, P> {
    intake: EventIntake,
    resolver: RecipientResolver<S>,
    deliverer: Deliverer<P>,
}

impl<S: ProfileStore, P: PushSender> DispatchPipeline<S, P> {
    pub fn new(store: S, sender: P, defaults: MessageDefaults) -> Self {
        Self {
            intake: EventIntake::new(defaults),
            resolver: RecipientResolver::new(store),
            deliverer: Deliverer::new(sender),
        }
    }

    pub fn store(&self) -> &S {
        self.resolver.store()
    }

    pub fn sender(&self) -> &P {
        self.deliverer.sender()
    }

    /// Run one event through the pipeline and log its terminal outcome.
    pub async fn dispatch(&self, event: &RecordCreated) -> DispatchOutcome {
        let invocation_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "dispatch",
            invocation_id = %invocation_id,
            record_id = %event.id
        );

        async move {
            let outcome = match self.run(event).await {
                Ok(receipt) => DispatchOutcome::Delivered { receipt },
                Err(reason) => DispatchOutcome::from(reason),
            };

            match &outcome {
                DispatchOutcome::Delivered { receipt } => {
                    tracing::info!(outcome = %outcome, receipt = %receipt, "Dispatch finished");
                }
                DispatchOutcome::Skipped { reason } => {
                    tracing::warn!(outcome = %outcome, reason = %reason, "Dispatch skipped");
                }
            }

            outcome
        }
        .instrument(span)
        .await
    }

    async fn run(&self, event: &RecordCreated) -> Result<String, SkipReason> {
        let request = self.intake.extract(event)?;
        let token = self.resolver.resolve(&request.recipient_id).await?;
        let payload = MessageBuilder::build(token, &request);
        self.deliverer.deliver(&payload).await
    }
}
