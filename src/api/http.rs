use super::{
    ApiError, ChatApi, CreateSessionRequest, CreateSessionResponse, HistoryRequest,
    HistoryResponse, SendMessageRequest, SendMessageResponse, SendOutcome,
};
use crate::models::Message;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

pub const INIT_DATA_HEADER: &str = "X-Telegram-Init-Data";
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    /// Raw Telegram WebApp init data, forwarded verbatim for server-side auth.
    pub init_data: Option<String>,
    /// The client defines no timeout of its own.
    pub timeout: Option<Duration>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            init_data: None,
            timeout: None,
        }
    }
}

pub struct HttpChatApi {
    client: Client,
    base_url: String,
    init_data: Option<String>,
}

impl HttpChatApi {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ApiError::Config(format!(
                "base URL must be absolute http(s), got {:?}",
                config.base_url
            )));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
            init_data: config.init_data.clone().filter(|d| !d.is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn build_request<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> RequestBuilder {
        let mut req = self
            .client
            .post(self.endpoint(path))
            .header("Content-Type", "application/json")
            .json(body);

        if let Some(init_data) = &self.init_data {
            req = req.header(INIT_DATA_HEADER, init_data);
        }
        req
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let resp = self.build_request(path, body).send().await?;
        let status = resp.status();

        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            tracing::warn!(path, status = status.as_u16(), body = %text, "backend request failed");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: error_message(status.as_u16(), &text),
            });
        }

        let text = resp.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            tracing::warn!(path, error = %e, "backend response is not valid JSON");
            ApiError::Malformed(e.to_string())
        })
    }
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn create_session(
        &self,
        assistant_slug: &str,
        telegram_id: &str,
    ) -> Result<String, ApiError> {
        tracing::debug!(assistant = assistant_slug, "creating chat session");
        let body = CreateSessionRequest {
            assistant_slug: assistant_slug.to_string(),
            telegram_id: telegram_id.to_string(),
        };
        let data: CreateSessionResponse = self.post("chat/session", &body).await?;
        if data.session_id.is_empty() {
            return Err(ApiError::Malformed("empty `session_id`".into()));
        }
        Ok(data.session_id)
    }

    async fn send_message(
        &self,
        session_id: &str,
        assistant_slug: &str,
        text: &str,
    ) -> Result<SendOutcome, ApiError> {
        tracing::debug!(session = session_id, assistant = assistant_slug, "sending message");
        let body = SendMessageRequest {
            session_id: session_id.to_string(),
            assistant_slug: assistant_slug.to_string(),
            message: text.to_string(),
        };
        let data: SendMessageResponse = self.post("chat/send", &body).await?;
        data.into_outcome()
    }

    async fn fetch_history(&self, session_id: &str) -> Result<Vec<Message>, ApiError> {
        tracing::debug!(session = session_id, "fetching history");
        let body = HistoryRequest {
            session_id: session_id.to_string(),
        };
        let data: HistoryResponse = self.post("chat/history", &body).await?;
        Ok(data.messages)
    }
}

/// Human-readable failure text for a non-2xx response: `detail` first, then
/// `error`, else the bare status.
pub fn error_message(status: u16, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("detail")
                .and_then(detail_text)
                .or_else(|| value.get("error").and_then(error_text))
        })
        .unwrap_or_else(|| format!("HTTP {status}"))
}

fn detail_text(detail: &Value) -> Option<String> {
    match detail {
        Value::String(s) => non_empty(s),
        // FastAPI validation errors: [{"loc": [...], "msg": "...", ...}]
        Value::Array(items) => {
            let parts: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join("; "))
            }
        }
        _ => None,
    }
}

fn error_text(error: &Value) -> Option<String> {
    match error {
        Value::String(s) => non_empty(s),
        Value::Object(fields) => fields
            .get("message")
            .and_then(Value::as_str)
            .and_then(non_empty),
        _ => None,
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}
