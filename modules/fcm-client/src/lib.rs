pub mod models;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use thiserror::Error;
use tracing::debug;

use crate::models::{DeviceResponse, FcmMessage, Notification, TopicResponse};

const FCM_SEND_URL: &str = "https://fcm.googleapis.com/fcm/send";
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum FcmError {
    /// The device token is no longer valid; callers should deactivate it.
    #[error("device token not registered")]
    NotRegistered,

    #[error("FCM rejected the request ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("invalid server key")]
    InvalidKey(#[from] reqwest::header::InvalidHeaderValue),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Firebase Cloud Messaging client. Constructed explicitly with a server key
/// and passed by reference; there is no lazily initialized global.
#[derive(Clone)]
pub struct FcmClient {
    server_key: String,
    http: reqwest::Client,
    base_url: String,
}

impl FcmClient {
    pub fn new(server_key: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build FCM HTTP client");
        Self {
            server_key: server_key.into(),
            http,
            base_url: FCM_SEND_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn headers(&self) -> Result<HeaderMap, FcmError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("key={}", self.server_key))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// Push a notification to every subscriber of a topic.
    pub async fn send_to_topic(
        &self,
        topic: &str,
        title: &str,
        body: &str,
        data: Option<serde_json::Value>,
    ) -> Result<(), FcmError> {
        let message = FcmMessage {
            to: format!("/topics/{topic}"),
            notification: Notification {
                title: title.to_string(),
                body: body.to_string(),
            },
            data,
        };

        debug!(topic, "FCM topic send");

        let response = self
            .http
            .post(&self.base_url)
            .headers(self.headers()?)
            .json(&message)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FcmError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: TopicResponse = response.json().await?;
        if let Some(error) = parsed.error {
            return Err(FcmError::Api {
                status: status.as_u16(),
                message: error,
            });
        }
        Ok(())
    }

    /// Push a notification to a single device token.
    /// Returns `FcmError::NotRegistered` for dead tokens.
    pub async fn send_to_token(
        &self,
        token: &str,
        title: &str,
        body: &str,
        data: Option<serde_json::Value>,
    ) -> Result<(), FcmError> {
        let message = FcmMessage {
            to: token.to_string(),
            notification: Notification {
                title: title.to_string(),
                body: body.to_string(),
            },
            data,
        };

        debug!("FCM device send");

        let response = self
            .http
            .post(&self.base_url)
            .headers(self.headers()?)
            .json(&message)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FcmError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: DeviceResponse = response.json().await?;
        if parsed.failure > 0 {
            let error = parsed
                .results
                .iter()
                .find_map(|r| r.error.clone())
                .unwrap_or_else(|| "unknown FCM failure".to_string());
            if error == "NotRegistered" || error == "InvalidRegistration" {
                return Err(FcmError::NotRegistered);
            }
            return Err(FcmError::Api {
                status: status.as_u16(),
                message: error,
            });
        }
        Ok(())
    }
}
