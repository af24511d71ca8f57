use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use relay_common::config::AppConfig;
use relay_common::error::AppError;
use relay_common::types::DeliveryPayload;
use relay_engine::PushSender;

/// Where the OAuth2 bearer token for FCM comes from.
///
/// Google access tokens live for about an hour. A `Static` token is never
/// refreshed by this process, so it must be replaced (and the process
/// restarted) before it expires. A `File` token is re-read on every send,
/// which lets an external refresher rotate it in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessToken {
    Static(String),
    File(PathBuf),
}

impl AccessToken {
    /// Current token value.
    pub async fn current(&self) -> Result<String, AppError> {
        match self {
            AccessToken::Static(token) => Ok(token.clone()),
            AccessToken::File(path) => {
                let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
                    AppError::Delivery(format!(
                        "Failed to read FCM access token from {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                let token = raw.trim();
                if token.is_empty() {
                    return Err(AppError::Delivery(format!(
                        "FCM access token file {} is empty",
                        path.display()
                    )));
                }
                Ok(token.to_string())
            }
        }
    }
}

/// Connection settings for the FCM HTTP v1 API.
#[derive(Debug, Clone)]
pub struct FcmConfig {
    pub endpoint: String,
    pub project_id: String,
    pub access_token: AccessToken,
    pub validate_only: bool,
    pub timeout: Duration,
}

impl FcmConfig {
    /// The token file wins when both a file and a static token are set.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, AppError> {
        let access_token = match (&config.fcm_access_token_file, &config.fcm_access_token) {
            (Some(path), _) => AccessToken::File(PathBuf::from(path)),
            (None, Some(token)) => AccessToken::Static(token.clone()),
            (None, None) => {
                return Err(AppError::Config(
                    "No FCM access token or token file configured".to_string(),
                ));
            }
        };

        Ok(Self {
            endpoint: config.fcm_endpoint.clone(),
            project_id: config.fcm_project_id.clone(),
            access_token,
            validate_only: config.fcm_validate_only,
            timeout: Duration::from_millis(config.fcm_timeout_ms),
        })
    }
}

/// `messages:send` request body.
#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    validate_only: bool,
    message: Message<'a>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    token: &'a str,
    notification: Notification<'a>,
    data: &'a BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
struct Notification<'a> {
    title: &'a str,
    body: &'a str,
}

impl<'a> SendRequest<'a> {
    fn new(payload: &'a DeliveryPayload, validate_only: bool) -> Self {
        Self {
            validate_only,
            message: Message {
                token: &payload.target,
                notification: Notification {
                    title: &payload.notification.title,
                    body: &payload.notification.body,
                },
                data: &payload.data,
            },
        }
    }
}

/// Successful `messages:send` response. `name` is the message receipt,
/// e.g. `projects/my-app/messages/0:1500415314455276%31bd1c9631bd1c96`.
#[derive(Debug, Deserialize)]
struct SendResponse {
    name: String,
}

/// Google API error envelope.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    details: Vec<serde_json::Value>,
}

/// Turn a non-2xx response into a readable error line.
///
/// Prefers the FCM-specific `errorCode` (e.g. `UNREGISTERED`) from the
/// error details, then the canonical status, then the raw body.
fn describe_error(status: reqwest::StatusCode, body: &str) -> String {
    let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) else {
        return format!("FCM returned {}: {}", status, body.trim());
    };
    let error = envelope.error;

    let fcm_code = error
        .details
        .iter()
        .find_map(|d| d.get("errorCode").and_then(|c| c.as_str()));

    let code = fcm_code.unwrap_or(error.status.as_str());
    if code.is_empty() {
        format!("FCM returned {}: {}", status, error.message)
    } else {
        format!("FCM returned {} {}: {}", status, code, error.message)
    }
}

/// FCM HTTP v1 client.
#[derive(Clone)]
pub struct FcmClient {
    http: reqwest::Client,
    send_url: String,
    access_token: AccessToken,
    validate_only: bool,
}

impl FcmClient {
    pub fn new(config: FcmConfig) -> Result<Self, AppError> {
        if config.project_id.is_empty() {
            return Err(AppError::Config("FCM project id is empty".to_string()));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let send_url = format!(
            "{}/v1/projects/{}/messages:send",
            config.endpoint.trim_end_matches('/'),
            config.project_id
        );

        match &config.access_token {
            AccessToken::Static(_) => tracing::warn!(
                "FCM client uses a static access token; it is not refreshed and must be rotated externally"
            ),
            AccessToken::File(path) => tracing::info!(
                token_file = %path.display(),
                "FCM access token is re-read from file on every send"
            ),
        }

        tracing::info!(
            send_url = %send_url,
            validate_only = config.validate_only,
            "FCM client initialized"
        );

        Ok(Self {
            http,
            send_url,
            access_token: config.access_token,
            validate_only: config.validate_only,
        })
    }

    pub fn send_url(&self) -> &str {
        &self.send_url
    }
}

impl PushSender for FcmClient {
    async fn send(&self, payload: &DeliveryPayload) -> Result<String, AppError> {
        let request = SendRequest::new(payload, self.validate_only);
        let access_token = self.access_token.current().await?;

        let response = self
            .http
            .post(&self.send_url)
            .bearer_auth(&access_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Delivery(format!("FCM request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Delivery(describe_error(status, &body)));
        }

        let receipt: SendResponse = response
            .json()
            .await
            .map_err(|e| AppError::Delivery(format!("Unreadable FCM response: {}", e)))?;

        Ok(receipt.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_common::types::NotificationContent;
    use serde_json::json;

    fn payload() -> DeliveryPayload {
        DeliveryPayload {
            target: "T1".to_string(),
            notification: NotificationContent {
                title: "Hi".to_string(),
                body: "There".to_string(),
            },
            data: BTreeMap::from([
                ("click_action".to_string(), "FLUTTER_NOTIFICATION_CLICK".to_string()),
                ("route".to_string(), "notifications".to_string()),
            ]),
        }
    }

    fn config(endpoint: &str) -> FcmConfig {
        FcmConfig {
            endpoint: endpoint.to_string(),
            project_id: "demo-app".to_string(),
            access_token: AccessToken::Static("ya29.test".to_string()),
            validate_only: false,
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_request_body_shape() {
        let payload = payload();
        let body = serde_json::to_value(SendRequest::new(&payload, false)).unwrap();
        assert_eq!(
            body,
            json!({
                "message": {
                    "token": "T1",
                    "notification": {"title": "Hi", "body": "There"},
                    "data": {
                        "click_action": "FLUTTER_NOTIFICATION_CLICK",
                        "route": "notifications"
                    }
                }
            })
        );
    }

    #[test]
    fn test_validate_only_flag_serialized_when_set() {
        let payload = payload();
        let body = serde_json::to_value(SendRequest::new(&payload, true)).unwrap();
        assert_eq!(body["validate_only"], json!(true));
    }

    #[test]
    fn test_send_url_trims_trailing_slash() {
        let client = FcmClient::new(config("https://fcm.googleapis.com/")).unwrap();
        assert_eq!(
            client.send_url(),
            "https://fcm.googleapis.com/v1/projects/demo-app/messages:send"
        );
    }

    #[test]
    fn test_empty_project_rejected() {
        let mut cfg = config("https://fcm.googleapis.com");
        cfg.project_id.clear();
        assert!(matches!(FcmClient::new(cfg), Err(AppError::Config(_))));
    }

    #[test]
    fn test_describe_error_prefers_fcm_code() {
        let body = json!({
            "error": {
                "code": 404,
                "message": "Requested entity was not found.",
                "status": "NOT_FOUND",
                "details": [{
                    "@type": "type.googleapis.com/google.firebase.fcm.v1.FcmError",
                    "errorCode": "UNREGISTERED"
                }]
            }
        })
        .to_string();
        let text = describe_error(reqwest::StatusCode::NOT_FOUND, &body);
        assert!(text.contains("UNREGISTERED"));
        assert!(text.contains("Requested entity was not found."));
    }

    #[test]
    fn test_describe_error_falls_back_to_status() {
        let body = json!({
            "error": {"code": 401, "message": "Request had invalid authentication credentials.", "status": "UNAUTHENTICATED"}
        })
        .to_string();
        let text = describe_error(reqwest::StatusCode::UNAUTHORIZED, &body);
        assert!(text.contains("UNAUTHENTICATED"));
    }

    #[test]
    fn test_describe_error_non_json_body() {
        let text = describe_error(reqwest::StatusCode::BAD_GATEWAY, "upstream down\n");
        assert_eq!(text, "FCM returned 502 Bad Gateway: upstream down");
    }

    #[tokio::test]
    async fn test_missing_token_file_is_delivery_error() {
        let token = AccessToken::File(PathBuf::from("/nonexistent/relay/fcm-token"));
        assert!(matches!(token.current().await, Err(AppError::Delivery(_))));
    }

    #[test]
    fn test_token_file_preferred_over_static_token() {
        let config = AppConfig::from_vars(|key| match key {
            "DATABASE_URL" => Some("postgres://relay@localhost/relay".to_string()),
            "FCM_PROJECT_ID" => Some("demo-app".to_string()),
            "FCM_ACCESS_TOKEN" => Some("ya29.static".to_string()),
            "FCM_ACCESS_TOKEN_FILE" => Some("/run/secrets/fcm-token".to_string()),
            _ => None,
        })
        .unwrap();

        let fcm = FcmConfig::from_app_config(&config).unwrap();
        assert_eq!(
            fcm.access_token,
            AccessToken::File(PathBuf::from("/run/secrets/fcm-token"))
        );
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_delivery_error() {
        // Port 9 (discard) on localhost is not expected to accept HTTP.
        let mut cfg = config("http://127.0.0.1:9");
        cfg.timeout = Duration::from_millis(500);
        let client = FcmClient::new(cfg).unwrap();

        let result = client.send(&payload()).await;
        assert!(matches!(result, Err(AppError::Delivery(_))));
    }
}
