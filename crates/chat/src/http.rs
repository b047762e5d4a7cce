//! `HttpAssistant` calls the hosted chat function over HTTP.
//!
//! Request body: `{ "messages": [{ "role", "content" }] }`.
//! Response body: `{ "message": "...", "workflow": { ... }? }`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::backend::{AssistantBackend, AssistantReply};
use crate::message::{ChatMessage, Role};
use crate::ChatError;

#[derive(Serialize)]
struct WireMessage<'a> {
    role: Role,
    content: &'a str,
}

#[derive(Serialize)]
struct WireRequest<'a> {
    messages: Vec<WireMessage<'a>>,
}

#[derive(Deserialize)]
struct WireResponse {
    message: String,
    #[serde(default)]
    workflow: Option<Value>,
}

pub struct HttpAssistant {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpAssistant {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Result<Self, ChatError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChatError::Backend(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        })
    }
}

#[async_trait]
impl AssistantBackend for HttpAssistant {
    #[instrument(skip(self, history), fields(endpoint = %self.endpoint, turns = history.len()))]
    async fn complete(&self, history: &[ChatMessage]) -> Result<AssistantReply, ChatError> {
        // Earlier failures are transcript noise, not conversation.
        let body = WireRequest {
            messages: history
                .iter()
                .filter(|m| !m.is_error)
                .map(|m| WireMessage {
                    role: m.role,
                    content: &m.content,
                })
                .collect(),
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ChatError::Backend(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::Backend(format!("assistant returned {status}")));
        }

        let payload: WireResponse = response
            .json()
            .await
            .map_err(|e| ChatError::Backend(format!("unreadable assistant response: {e}")))?;

        debug!(has_workflow = payload.workflow.is_some(), "assistant replied");
        Ok(AssistantReply {
            content: payload.message,
            workflow: payload.workflow,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn assistant(server: &MockServer, key: Option<&str>) -> HttpAssistant {
        HttpAssistant::new(
            format!("{}/chat", server.uri()),
            key.map(str::to_owned),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn posts_transcript_and_reads_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .and(header("authorization", "Bearer secret"))
            .and(body_json(json!({
                "messages": [
                    { "role": "user", "content": "hi" },
                    { "role": "user", "content": "build a lead flow" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": "Drafted it",
                "workflow": { "action": "create_workflow", "nodes": [] }
            })))
            .expect(1)
            .mount(&server)
            .await;

        // The failed turn in between is not sent.
        let history = vec![
            ChatMessage::user("hi"),
            ChatMessage::error("assistant error: timeout"),
            ChatMessage::user("build a lead flow"),
        ];
        let reply = assistant(&server, Some("secret")).complete(&history).await.unwrap();

        assert_eq!(reply.content, "Drafted it");
        assert_eq!(reply.workflow, Some(json!({ "action": "create_workflow", "nodes": [] })));
    }

    #[tokio::test]
    async fn reply_without_workflow() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "Sure" })))
            .mount(&server)
            .await;

        let reply = assistant(&server, None).complete(&[ChatMessage::user("hello")]).await.unwrap();
        assert_eq!(reply, AssistantReply::text("Sure"));
    }

    #[tokio::test]
    async fn error_status_is_a_backend_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = assistant(&server, None).complete(&[ChatMessage::user("hello")]).await.unwrap_err();
        assert!(matches!(err, ChatError::Backend(msg) if msg.contains("500")));
    }

    #[tokio::test]
    async fn undecodable_body_is_a_backend_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = assistant(&server, None).complete(&[ChatMessage::user("hello")]).await.unwrap_err();
        assert!(matches!(err, ChatError::Backend(msg) if msg.contains("unreadable")));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_backend_error() {
        // Nothing listens on the discard port.
        let assistant = HttpAssistant::new("http://127.0.0.1:9/chat", None, Duration::from_secs(5)).unwrap();
        let err = assistant.complete(&[ChatMessage::user("hello")]).await.unwrap_err();
        assert!(matches!(err, ChatError::Backend(_)));
    }
}
