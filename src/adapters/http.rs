use crate::domain::ports::ConfigProvider;
use crate::utils::error::{MarketError, Result};
use reqwest::{Client, Method, RequestBuilder, Response};
use std::time::Duration;

/// 共用的後端 HTTP 客戶端：負責 base URL、`apikey` 與 Bearer 標頭
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl BackendClient {
    pub fn new(base_url: &str, anon_key: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        })
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        Self::new(
            config.backend_url(),
            config.anon_key(),
            Duration::from_secs(config.request_timeout_seconds()),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Without a user token the anon key doubles as the bearer.
    pub fn request(&self, method: Method, path: &str, access_token: Option<&str>) -> RequestBuilder {
        let url = self.endpoint(path);
        tracing::debug!("{} {}", method, url);

        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token.unwrap_or(&self.anon_key))
    }
}

/// Passes successful responses through; anything else becomes `BackendError`.
pub async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    tracing::debug!("Backend response status: {}", status);

    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = extract_error_message(&body)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string());

    Err(MarketError::BackendError {
        status: status.as_u16(),
        message,
    })
}

/// Auth, data and storage services each name the message field differently.
pub fn extract_error_message(body: &str) -> Option<String> {
    const KEYS: [&str; 4] = ["message", "msg", "error_description", "error"];

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::Object(obj)) => KEYS
            .iter()
            .find_map(|key| obj.get(*key).and_then(|v| v.as_str()))
            .filter(|msg| !msg.is_empty())
            .map(str::to_string),
        _ => Some(trimmed.to_string()),
    }
}
