mod error;
pub mod types;
pub mod util;

pub use error::AiError;
pub use types::{ChatCompletion, ChatRequest, Usage};

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use tracing::debug;

const OPENAI_API_URL: &str = "https://api.openai.com/v1";
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// OpenAI REST client. One instance per API key; cheap to clone.
#[derive(Clone)]
pub struct OpenAi {
    api_key: String,
    http: reqwest::Client,
    base_url: String,
}

impl OpenAi {
    pub fn new(api_key: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build OpenAI HTTP client");
        Self {
            api_key: api_key.into(),
            http,
            base_url: OPENAI_API_URL.to_string(),
        }
    }

    pub fn from_env() -> Result<Self, AiError> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| AiError::Api {
            status: 0,
            message: "OPENAI_API_KEY environment variable not set".to_string(),
        })?;
        Ok(Self::new(api_key))
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn headers(&self) -> Result<HeaderMap, AiError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// Run a chat completion. HTTP 429 maps to `AiError::RateLimited` so
    /// callers can back off differently from other failures.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatCompletion, AiError> {
        let url = format!("{}/chat/completions", self.base_url);

        debug!(model = %request.model, "OpenAI chat request");

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status == StatusCode::TOO_MANY_REQUESTS {
                return Err(AiError::RateLimited(body));
            }
            return Err(AiError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(response.json().await?)
    }

    /// Run a chat completion and return (content, total tokens), erroring on
    /// an empty choice list or null content.
    pub async fn chat_text(&self, request: &ChatRequest) -> Result<(String, u32), AiError> {
        let completion = self.chat(request).await?;
        let tokens = completion.total_tokens();
        let content = completion.content().ok_or(AiError::EmptyResponse)?;
        Ok((content.to_string(), tokens))
    }
}
