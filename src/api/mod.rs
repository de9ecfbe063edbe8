//! HTTP chat request layer
//!
//! This module builds and sends the chat-completion request a channel
//! describes: JSON body `{model, messages, stream: true}` posted to the
//! channel endpoint, with the auth header chosen by endpoint host
//! (`x-api-key` for Anthropic endpoints, `Authorization: Bearer` otherwise).
//!
//! A non-2xx status is a hard failure before any streaming begins; the error
//! message is extracted from the response with a fixed preference order.
//! Nothing is retried — every failure is terminal for that one request.

use crate::error::{KanavaError, Result};
use crate::store::types::Channel;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod stream;
pub use stream::{decode_stream, stream_completion};

/// A chat message as sent on the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireMessage {
    /// Role of the sender ("user" or "assistant")
    pub role: String,
    /// Text content
    pub content: String,
}

impl WireMessage {
    /// Create a wire message
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Request body posted to a channel endpoint
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    /// Model name understood by the remote endpoint
    pub model: String,
    /// Full conversation history
    pub messages: Vec<WireMessage>,
    /// Always true; this client only speaks the streaming protocol
    pub stream: bool,
}

/// Whether an endpoint wants Anthropic-style authentication
pub(crate) fn is_anthropic_endpoint(endpoint: &str) -> bool {
    endpoint.contains("anthropic.com")
}

/// Normalise roles for Anthropic endpoints
///
/// Anthropic rejects roles outside user/assistant, so anything that is not
/// an assistant message is sent as a user message.
pub(crate) fn normalize_roles_for_anthropic(messages: &[WireMessage]) -> Vec<WireMessage> {
    messages
        .iter()
        .map(|m| WireMessage {
            role: if m.role == "assistant" {
                "assistant".to_string()
            } else {
                "user".to_string()
            },
            content: m.content.clone(),
        })
        .collect()
}

/// Extract a human-readable error message from a failed response
///
/// Preference order: structured `error.message`, structured `error` string,
/// a status-code message for JSON bodies with neither, the raw body text for
/// non-JSON bodies, and the status-code message when the body is empty.
pub(crate) fn extract_error_message(status: reqwest::StatusCode, body: &str) -> String {
    let fallback = format!("API request failed ({})", status.as_u16());

    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => {
            let error = value.get("error");
            error
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
                .or_else(|| {
                    error
                        .and_then(|e| e.as_str())
                        .map(str::to_string)
                })
                .unwrap_or(fallback)
        }
        Err(_) => {
            if body.trim().is_empty() {
                fallback
            } else {
                body.to_string()
            }
        }
    }
}

/// HTTP client for chat-completion channels
///
/// Holds one `reqwest::Client` shared across requests. The client carries no
/// per-request state; concurrent calls are independent.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use kanava::api::{ChatClient, WireMessage};
/// use kanava::store::types::Channel;
///
/// # async fn example() -> kanava::error::Result<()> {
/// let client = ChatClient::new(Duration::from_secs(120))?;
/// let channel = Channel::new(
///     "main",
///     "https://api.openai.com/v1/chat/completions",
///     "sk-...",
///     Channel::parse_models("gpt-4o"),
/// );
/// let messages = vec![WireMessage::new("user", "Hello!")];
/// let response = client.send_chat(&channel, "gpt-4o", &messages).await?;
/// # Ok(())
/// # }
/// ```
pub struct ChatClient {
    client: reqwest::Client,
}

impl ChatClient {
    /// Create a new client with the given per-request timeout
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("kanava/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| KanavaError::Api(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Send a streaming chat request to a channel
    ///
    /// Posts `{model, messages, stream: true}` to the channel endpoint and
    /// returns the established response, ready for
    /// [`stream_completion`](crate::api::stream_completion).
    ///
    /// # Arguments
    ///
    /// * `channel` - Channel providing the endpoint and credentials
    /// * `model_name` - Model name to request
    /// * `messages` - Full conversation history
    ///
    /// # Errors
    ///
    /// A non-2xx status fails before streaming begins, with the message
    /// extracted per [`extract_error_message`]. Transport failures surface
    /// as-is; nothing is retried.
    pub async fn send_chat(
        &self,
        channel: &Channel,
        model_name: &str,
        messages: &[WireMessage],
    ) -> Result<reqwest::Response> {
        let anthropic = is_anthropic_endpoint(&channel.endpoint);

        let messages = if anthropic {
            normalize_roles_for_anthropic(messages)
        } else {
            messages.to_vec()
        };

        let body = ChatRequest {
            model: model_name.to_string(),
            messages,
            stream: true,
        };

        tracing::debug!(
            "Sending chat request: endpoint={}, model={}, messages={}",
            channel.endpoint,
            model_name,
            body.messages.len()
        );

        let mut request = self.client.post(&channel.endpoint).json(&body);
        request = if anthropic {
            request.header("x-api-key", &channel.key)
        } else {
            request.header("Authorization", format!("Bearer {}", channel.key))
        };

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            let message = extract_error_message(status, &body_text);
            tracing::warn!("Chat request failed: status={}, message={}", status, message);
            return Err(KanavaError::Api(message).into());
        }

        Ok(response)
    }

    /// Query the remaining account credit for a channel, best-effort
    ///
    /// Only OpenAI endpoints expose a usable credit query; every other
    /// endpoint reports "not supported". Failures become a displayed string,
    /// never an error.
    pub async fn check_balance(&self, channel: &Channel) -> String {
        if !channel.endpoint.contains("openai.com") {
            return "not supported".to_string();
        }

        #[derive(Debug, Deserialize)]
        struct CreditGrants {
            total_available: f64,
        }

        let result = self
            .client
            .get("https://api.openai.com/dashboard/billing/credit_grants")
            .header("Authorization", format!("Bearer {}", channel.key))
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                match response.json::<CreditGrants>().await {
                    Ok(grants) => format!("${:.2}", grants.total_available),
                    Err(err) => {
                        tracing::debug!("Balance response did not parse: {}", err);
                        "query failed".to_string()
                    }
                }
            }
            Ok(response) => {
                tracing::debug!("Balance query returned status {}", response.status());
                "query failed".to_string()
            }
            Err(err) => {
                tracing::debug!("Balance query failed: {}", err);
                "query failed".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_serializes_stream_flag() {
        let request = ChatRequest {
            model: "gpt-4o".to_string(),
            messages: vec![WireMessage::new("user", "hi")],
            stream: true,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"model\":\"gpt-4o\""));
        assert!(json.contains("\"stream\":true"));
        assert!(json.contains("\"role\":\"user\""));
        assert!(json.contains("\"content\":\"hi\""));
    }

    #[test]
    fn test_is_anthropic_endpoint() {
        assert!(is_anthropic_endpoint("https://api.anthropic.com/v1/messages"));
        assert!(!is_anthropic_endpoint("https://api.openai.com/v1/chat/completions"));
        assert!(!is_anthropic_endpoint("https://example.com/v1/chat"));
    }

    #[test]
    fn test_normalize_roles_for_anthropic() {
        let messages = vec![
            WireMessage::new("system", "be brief"),
            WireMessage::new("user", "q"),
            WireMessage::new("assistant", "a"),
        ];
        let normalized = normalize_roles_for_anthropic(&messages);
        let roles: Vec<&str> = normalized.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["user", "user", "assistant"]);
        assert_eq!(normalized[0].content, "be brief");
    }

    #[test]
    fn test_extract_error_message_structured_message() {
        let status = reqwest::StatusCode::UNAUTHORIZED;
        let body = r#"{"error":{"message":"bad key"}}"#;
        assert_eq!(extract_error_message(status, body), "bad key");
    }

    #[test]
    fn test_extract_error_message_error_string() {
        let status = reqwest::StatusCode::BAD_REQUEST;
        let body = r#"{"error":"model not found"}"#;
        assert_eq!(extract_error_message(status, body), "model not found");
    }

    #[test]
    fn test_extract_error_message_json_without_error_field() {
        let status = reqwest::StatusCode::INTERNAL_SERVER_ERROR;
        let body = r#"{"detail":"boom"}"#;
        assert_eq!(extract_error_message(status, body), "API request failed (500)");
    }

    #[test]
    fn test_extract_error_message_error_object_without_message() {
        let status = reqwest::StatusCode::FORBIDDEN;
        let body = r#"{"error":{"code":"denied"}}"#;
        assert_eq!(extract_error_message(status, body), "API request failed (403)");
    }

    #[test]
    fn test_extract_error_message_raw_text() {
        let status = reqwest::StatusCode::BAD_GATEWAY;
        assert_eq!(extract_error_message(status, "upstream timeout"), "upstream timeout");
    }

    #[test]
    fn test_extract_error_message_empty_body() {
        let status = reqwest::StatusCode::NOT_FOUND;
        assert_eq!(extract_error_message(status, ""), "API request failed (404)");
        assert_eq!(extract_error_message(status, "  "), "API request failed (404)");
    }

    #[test]
    fn test_chat_client_new() {
        let client = ChatClient::new(Duration::from_secs(5));
        assert!(client.is_ok());
    }
}
