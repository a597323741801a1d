pub mod http;

use crate::models::Message;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use http::{ApiConfig, HttpChatApi};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CreateSessionRequest {
    pub assistant_slug: String,
    pub telegram_id: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CreateSessionResponse {
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SendMessageRequest {
    pub session_id: String,
    pub assistant_slug: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct SendMessageResponse {
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default)]
    pub messages: Option<Vec<Message>>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HistoryRequest {
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HistoryResponse {
    pub messages: Vec<Message>,
}

/// What a successful send produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Only the assistant's reply text.
    Reply(String),
    /// The full, authoritative session transcript.
    Transcript(Vec<Message>),
}

impl SendMessageResponse {
    /// A full transcript takes precedence over a bare reply.
    pub fn into_outcome(self) -> Result<SendOutcome, ApiError> {
        match (self.messages, self.reply) {
            (Some(messages), _) => Ok(SendOutcome::Transcript(messages)),
            (None, Some(reply)) => Ok(SendOutcome::Reply(reply)),
            (None, None) => Err(ApiError::Malformed(
                "send response has neither `reply` nor `messages`".into(),
            )),
        }
    }
}

/// Backend chat endpoints. One call is one POST; nothing is retried.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn create_session(
        &self,
        assistant_slug: &str,
        telegram_id: &str,
    ) -> Result<String, ApiError>;

    async fn send_message(
        &self,
        session_id: &str,
        assistant_slug: &str,
        text: &str,
    ) -> Result<SendOutcome, ApiError>;

    async fn fetch_history(&self, session_id: &str) -> Result<Vec<Message>, ApiError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("Malformed response: {0}")]
    Malformed(String),
    #[error("Invalid API configuration: {0}")]
    Config(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    #[test]
    fn test_transcript_wins_over_reply() {
        let response: SendMessageResponse = serde_json::from_str(
            r#"{"reply":"ok","messages":[{"role":"user","content":"q"},{"role":"assistant","content":"ok"}]}"#,
        )
        .unwrap();
        assert_eq!(
            response.into_outcome().unwrap(),
            SendOutcome::Transcript(vec![
                Message::new(Role::User, "q"),
                Message::new(Role::Assistant, "ok"),
            ])
        );
    }

    #[test]
    fn test_bare_reply() {
        let response: SendMessageResponse = serde_json::from_str(r#"{"reply":"hello"}"#).unwrap();
        assert_eq!(
            response.into_outcome().unwrap(),
            SendOutcome::Reply("hello".into())
        );
    }

    #[test]
    fn test_empty_send_response_is_malformed() {
        let response: SendMessageResponse = serde_json::from_str("{}").unwrap();
        assert!(matches!(
            response.into_outcome(),
            Err(ApiError::Malformed(_))
        ));
    }
}
