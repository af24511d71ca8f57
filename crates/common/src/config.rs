use serde::Deserialize;

use crate::types::{DEFAULT_BODY, DEFAULT_TITLE, MessageDefaults};

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// PostgreSQL connection string
    pub database_url: String,

    /// Maximum number of PostgreSQL connections in the pool (default: 10)
    pub db_max_connections: u32,

    /// Address the HTTP invocation surface binds to
    pub api_bind_addr: String,

    /// Firebase project that owns the FCM sender
    pub fcm_project_id: String,

    /// Static OAuth2 bearer token for the FCM HTTP v1 API. Google access
    /// tokens expire after about an hour, so this only suits short runs;
    /// long-running deployments set `fcm_access_token_file` instead.
    pub fcm_access_token: Option<String>,

    /// File holding the current bearer token, re-read on every send. An
    /// external refresher (metadata-server sidecar, cron job) keeps it fresh.
    pub fcm_access_token_file: Option<String>,

    /// FCM API base URL
    pub fcm_endpoint: String,

    /// Ask FCM to validate messages without delivering them
    pub fcm_validate_only: bool,

    /// Per-request timeout for delivery calls in milliseconds
    pub fcm_timeout_ms: u64,

    /// Title used when a record has none
    pub default_title: String,

    /// Body used when a record has none
    pub default_body: String,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let fcm_access_token = var("FCM_ACCESS_TOKEN");
        let fcm_access_token_file = var("FCM_ACCESS_TOKEN_FILE");
        if fcm_access_token.is_none() && fcm_access_token_file.is_none() {
            anyhow::bail!("FCM_ACCESS_TOKEN or FCM_ACCESS_TOKEN_FILE environment variable is required");
        }

        Ok(Self {
            database_url: var("DATABASE_URL")
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?,
            db_max_connections: var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|| "10".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("DB_MAX_CONNECTIONS must be a valid u32"))?,
            api_bind_addr: var("API_BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            fcm_project_id: var("FCM_PROJECT_ID").ok_or_else(|| {
                anyhow::anyhow!("FCM_PROJECT_ID environment variable is required")
            })?,
            fcm_access_token,
            fcm_access_token_file,
            fcm_endpoint: var("FCM_ENDPOINT")
                .unwrap_or_else(|| "https://fcm.googleapis.com".to_string()),
            fcm_validate_only: var("FCM_VALIDATE_ONLY")
                .unwrap_or_else(|| "false".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("FCM_VALIDATE_ONLY must be true or false"))?,
            fcm_timeout_ms: var("FCM_TIMEOUT_MS")
                .unwrap_or_else(|| "10000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("FCM_TIMEOUT_MS must be a valid u64"))?,
            default_title: var("NOTIFICATION_DEFAULT_TITLE")
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            default_body: var("NOTIFICATION_DEFAULT_BODY")
                .unwrap_or_else(|| DEFAULT_BODY.to_string()),
        })
    }

    /// Fallback strings for records without a title or body.
    pub fn message_defaults(&self) -> MessageDefaults {
        MessageDefaults {
            title: self.default_title.clone(),
            body: self.default_body.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_vars(|key| vars.get(key).cloned())
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("DATABASE_URL", "postgres://relay@localhost/relay"),
        ("FCM_PROJECT_ID", "demo-project"),
        ("FCM_ACCESS_TOKEN", "ya29.test"),
    ];

    #[test]
    fn test_defaults_applied() {
        let config = load(REQUIRED).unwrap();
        assert_eq!(config.db_max_connections, 10);
        assert_eq!(config.api_bind_addr, "0.0.0.0:3000");
        assert_eq!(config.fcm_endpoint, "https://fcm.googleapis.com");
        assert!(!config.fcm_validate_only);
        assert_eq!(config.fcm_timeout_ms, 10_000);
        assert_eq!(config.message_defaults(), MessageDefaults::default());
    }

    #[test]
    fn test_overrides_applied() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("FCM_VALIDATE_ONLY", "true"));
        pairs.push(("NOTIFICATION_DEFAULT_TITLE", "Nueva notificación"));
        pairs.push(("DB_MAX_CONNECTIONS", "3"));
        let config = load(&pairs).unwrap();
        assert!(config.fcm_validate_only);
        assert_eq!(config.db_max_connections, 3);
        assert_eq!(config.message_defaults().title, "Nueva notificación");
        assert_eq!(config.message_defaults().body, DEFAULT_BODY);
    }

    #[test]
    fn test_missing_required_var_fails() {
        let err = load(&REQUIRED[1..]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn test_token_file_satisfies_credentials() {
        let config = load(&[
            ("DATABASE_URL", "postgres://relay@localhost/relay"),
            ("FCM_PROJECT_ID", "demo-project"),
            ("FCM_ACCESS_TOKEN_FILE", "/run/secrets/fcm-token"),
        ])
        .unwrap();
        assert_eq!(config.fcm_access_token, None);
        assert_eq!(
            config.fcm_access_token_file.as_deref(),
            Some("/run/secrets/fcm-token")
        );
    }

    #[test]
    fn test_missing_credentials_fails() {
        let err = load(&REQUIRED[..2]).unwrap_err();
        assert!(err.to_string().contains("FCM_ACCESS_TOKEN"));
    }

    #[test]
    fn test_invalid_number_fails() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("FCM_TIMEOUT_MS", "soon"));
        let err = load(&pairs).unwrap_err();
        assert!(err.to_string().contains("FCM_TIMEOUT_MS"));
    }
}
