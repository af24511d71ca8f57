use std::sync::Arc;

use sqlx::PgPool;
use sqlx::postgres::PgListener;
use tokio::task::JoinSet;

use relay_common::error::AppError;
use relay_common::types::{DispatchOutcome, RecordCreated};
use relay_engine::{DispatchPipeline, ProfileStore, PushSender};

/// Channel the `notifications` insert trigger publishes record ids on.
pub const NOTIFICATION_CHANNEL: &str = "notification_created";

/// Extract the record id from a trigger payload.
pub fn record_id_from_payload(payload: &str) -> Option<&str> {
    let id = payload.trim();
    (!id.is_empty()).then_some(id)
}

/// Point read of a created notification record.
pub async fn fetch_record(pool: &PgPool, id: &str) -> Result<Option<RecordCreated>, AppError> {
    let row: Option<(String, serde_json::Value)> =
        sqlx::query_as("SELECT id, data FROM notifications WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

    Ok(row.map(|(id, data)| RecordCreated { id, data }))
}

/// Subscribes to notification-record creation and runs one pipeline
/// invocation per created record.
///
/// Dispatches run on their own tasks and are owned by the listener until
/// they finish; [`ChangeListener::drain`] waits for the ones still in flight.
pub struct ChangeListener<S, P> {
    listener: PgListener,
    pool: PgPool,
    pipeline: Arc<DispatchPipeline<S, P>>,
    tasks: JoinSet<DispatchOutcome>,
}

impl<S, P> ChangeListener<S, P>
where
    S: ProfileStore + 'static,
    P: PushSender + 'static,
{
    /// Open a dedicated connection from `pool` and LISTEN on the
    /// notification channel.
    pub async fn connect(
        pool: &PgPool,
        pipeline: Arc<DispatchPipeline<S, P>>,
    ) -> Result<Self, AppError> {
        let mut listener = PgListener::connect_with(pool).await?;
        listener.listen(NOTIFICATION_CHANNEL).await?;

        tracing::info!(channel = NOTIFICATION_CHANNEL, "Listening for new notification records");
        Ok(Self {
            listener,
            pool: pool.clone(),
            pipeline,
            tasks: JoinSet::new(),
        })
    }

    /// Wait for the next created record and load it.
    ///
    /// Empty payloads, ids that no longer resolve to a row, and failed
    /// reads are logged and skipped. Connection loss is handled by
    /// `PgListener`, which reconnects; records created while disconnected
    /// are not replayed.
    pub async fn next_event(&mut self) -> Result<RecordCreated, AppError> {
        loop {
            let notification = self.listener.recv().await?;
            let Some(id) = record_id_from_payload(notification.payload()) else {
                tracing::warn!("Ignoring change notification without a record id");
                continue;
            };

            match fetch_record(&self.pool, id).await {
                Ok(Some(event)) => return Ok(event),
                Ok(None) => {
                    tracing::warn!(record_id = id, "Created record no longer exists");
                }
                Err(e) => {
                    tracing::error!(record_id = id, error = %e, "Failed to load created record");
                }
            }
        }
    }

    /// Run `event` through the pipeline on its own task.
    pub fn spawn_dispatch(&mut self, event: RecordCreated) {
        let pipeline = Arc::clone(&self.pipeline);
        self.tasks
            .spawn(async move { pipeline.dispatch(&event).await });
    }

    /// Number of dispatches spawned and not yet collected.
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Collect dispatches that have already finished, without waiting.
    fn reap_finished(&mut self) {
        while let Some(joined) = self.tasks.try_join_next() {
            if let Err(e) = joined {
                tracing::error!(error = %e, "Dispatch task failed");
            }
        }
    }

    /// Wait for every in-flight dispatch to reach its terminal outcome.
    pub async fn drain(&mut self) -> Vec<DispatchOutcome> {
        if !self.tasks.is_empty() {
            tracing::info!(in_flight = self.tasks.len(), "Waiting for in-flight dispatches");
        }

        let mut outcomes = Vec::with_capacity(self.tasks.len());
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => tracing::error!(error = %e, "Dispatch task failed"),
            }
        }
        outcomes
    }

    /// Start the listen loop. Runs until the future is dropped or the
    /// listener connection fails for good. Call [`ChangeListener::drain`]
    /// afterwards so spawned dispatches are not cut off.
    pub async fn run(&mut self) -> Result<(), AppError> {
        loop {
            let event = self.next_event().await?;
            tracing::debug!(record_id = %event.id, "Notification record created");
            self.spawn_dispatch(event);
            self.reap_finished();
        }
    }
}
