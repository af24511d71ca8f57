//! Recipient resolver — maps a recipient id to a device token.
//!
//! Exactly one profile lookup per call and no retries. Store errors are
//! logged here and reported as [`SkipReason::LookupFailed`]; they never
//! escape the pipeline.

use relay_common::types::SkipReason;

use crate::store::ProfileStore;

pub struct RecipientResolver<S> {
    store: S,
}

impl<S: ProfileStore> RecipientResolver<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Resolve the delivery token for `recipient_id`.
    pub async fn resolve(&self, recipient_id: &str) -> Result<String, SkipReason> {
        let profile = match self.store.fetch_profile(recipient_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                tracing::info!(recipient_id, "Recipient not found");
                return Err(SkipReason::UserNotFound);
            }
            Err(e) => {
                tracing::error!(recipient_id, error = %e, "Profile lookup failed");
                return Err(SkipReason::LookupFailed);
            }
        };

        match profile.delivery_token.filter(|t| !t.is_empty()) {
            Some(token) => Ok(token),
            None => {
                tracing::info!(recipient_id, "Recipient has no delivery token");
                Err(SkipReason::MissingToken)
            }
        }
    }
}
