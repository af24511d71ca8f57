//! User-profile lookups.
//!
//! The resolver only needs a single point read keyed by user id. The
//! PostgreSQL store performs an unguarded `SELECT`; a token changing while a
//! dispatch is in flight is tolerated.

use std::collections::HashMap;
use std::future::Future;

use sqlx::PgPool;

use relay_common::error::AppError;
use relay_common::types::UserProfile;

/// Point-read access to user profiles.
pub trait ProfileStore: Send + Sync {
    /// Fetch the profile for `user_id`, or `None` when no such user exists.
    fn fetch_profile(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Option<UserProfile>, AppError>> + Send;
}

/// Profile store backed by the `users` table.
#[derive(Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl ProfileStore for PgProfileStore {
    async fn fetch_profile(&self, user_id: &str) -> Result<Option<UserProfile>, AppError> {
        let row: Option<(Option<String>,)> =
            sqlx::query_as("SELECT delivery_token FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(delivery_token,)| UserProfile {
            id: user_id.to_string(),
            delivery_token,
        }))
    }
}

/// Map-backed profile store for local runs and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProfileStore {
    profiles: HashMap<String, UserProfile>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a profile, replacing any existing one with the same id.
    pub fn with_profile(mut self, user_id: &str, delivery_token: Option<&str>) -> Self {
        self.profiles.insert(
            user_id.to_string(),
            UserProfile {
                id: user_id.to_string(),
                delivery_token: delivery_token.map(str::to_string),
            },
        );
        self
    }
}

impl ProfileStore for InMemoryProfileStore {
    async fn fetch_profile(&self, user_id: &str) -> Result<Option<UserProfile>, AppError> {
        Ok(self.profiles.get(user_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_lookup() {
        let store = InMemoryProfileStore::new()
            .with_profile("u1", Some("T1"))
            .with_profile("u2", None);

        let found = store.fetch_profile("u1").await.unwrap().unwrap();
        assert_eq!(found.delivery_token.as_deref(), Some("T1"));

        let tokenless = store.fetch_profile("u2").await.unwrap().unwrap();
        assert_eq!(tokenless.delivery_token, None);

        assert!(store.fetch_profile("ghost").await.unwrap().is_none());
    }
}
