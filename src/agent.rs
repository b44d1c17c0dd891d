//! HTTP exchange with the remote chat backend.

use crate::endpoint::Endpoint;
use crate::error::ChatError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

pub const CHAT_PATH: &str = "/api/chat";
pub const HEALTH_PATH: &str = "/api/health";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChatRequest {
    pub message: String,
    pub conversation_id: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatReply {
    response: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct HealthReport {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// The backend as seen by the widget.
#[async_trait]
pub trait ChatClient: Send + Sync + 'static {
    /// Sends one message and returns the reply text.
    async fn chat(&self, request: &ChatRequest) -> Result<String, ChatError>;

    async fn health(&self) -> Result<HealthReport, ChatError>;
}

pub struct HttpChatClient {
    http: reqwest::Client,
    endpoint: Endpoint,
}

impl HttpChatClient {
    pub fn new(endpoint: Endpoint, timeout: Duration) -> Result<Self, ChatError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ChatError::Transport)?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

#[async_trait]
impl ChatClient for HttpChatClient {
    #[instrument(skip(self, request), fields(conversation_id = %request.conversation_id))]
    async fn chat(&self, request: &ChatRequest) -> Result<String, ChatError> {
        let url = self.endpoint.url(CHAT_PATH);
        debug!(%url, chars = request.message.len(), "Sending chat message");

        let response = self.http.post(&url).json(request).send().await?;
        let status = response.status();
        debug!(status = status.as_u16(), "Chat backend responded");
        if !status.is_success() {
            return Err(ChatError::Status(status.as_u16()));
        }

        let reply: ChatReply = response.json().await?;
        reply
            .response
            .ok_or_else(|| ChatError::MalformedReply("missing 'response' field".to_string()))
    }

    async fn health(&self) -> Result<HealthReport, ChatError> {
        let response = self.http.get(self.endpoint.url(HEALTH_PATH)).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::Status(status.as_u16()));
        }
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client_for(server: &MockServer) -> HttpChatClient {
        let endpoint = Endpoint::resolve(Some(server.base_url().as_str()), "");
        HttpChatClient::new(endpoint, Duration::from_secs(5)).unwrap()
    }

    fn request() -> ChatRequest {
        ChatRequest {
            message: "What is alt text?".to_string(),
            conversation_id: "accessibility-chat-1".to_string(),
        }
    }

    #[tokio::test]
    async fn posts_message_and_conversation_id() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/chat")
                    .json_body(json!({
                        "message": "What is alt text?",
                        "conversation_id": "accessibility-chat-1"
                    }));
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({ "response": "Alt text describes...", "conversation_id": "accessibility-chat-1" }));
            })
            .await;

        let reply = client_for(&server).chat(&request()).await.unwrap();
        assert_eq!(reply, "Alt text describes...");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/chat");
                then.status(500)
                    .json_body(json!({ "error": "An error occurred while processing your request" }));
            })
            .await;

        let err = client_for(&server).chat(&request()).await.unwrap_err();
        assert!(matches!(err, ChatError::Status(500)));
    }

    #[tokio::test]
    async fn malformed_or_missing_reply_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/chat");
                then.status(200).body("<html>oops</html>");
            })
            .await;
        let err = client_for(&server).chat(&request()).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::MalformedReply);

        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/chat");
                then.status(200).json_body(json!({ "conversation_id": "x" }));
            })
            .await;
        let err = client_for(&server).chat(&request()).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::MalformedReply);
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        let endpoint = Endpoint::resolve(Some("http://127.0.0.1:9"), "");
        let client = HttpChatClient::new(endpoint, Duration::from_secs(2)).unwrap();
        let err = client.chat(&request()).await.unwrap_err();
        assert!(matches!(
            err.kind(),
            FailureKind::Transport | FailureKind::Timeout
        ));
    }

    #[tokio::test]
    async fn health_report_is_parsed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/health");
                then.status(200).json_body(json!({
                    "status": "healthy",
                    "timestamp": "2025-01-01T00:00:00",
                    "api_key": "configured"
                }));
            })
            .await;

        let report = client_for(&server).health().await.unwrap();
        assert!(report.is_healthy());
        assert_eq!(report.api_key.as_deref(), Some("configured"));
    }
}
