//! Record types persisted in the local store
//!
//! One authoritative shape for each record. Field names serialize in the
//! camelCase the store format uses (`channelId`, `createdAt`, ...), and every
//! field tolerates absence: a channel with no models, a conversation with no
//! channel, or a message with no token estimate all load cleanly with
//! defaults.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generate a fresh record identifier
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Current wall-clock time as epoch milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// A model offered by a channel
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ModelEntry {
    /// Unique identifier for the model entry
    #[serde(default)]
    pub id: String,
    /// Model name sent on the wire (e.g. "gpt-4o", "claude-sonnet-4-5")
    #[serde(default)]
    pub name: String,
}

impl ModelEntry {
    /// Create a model entry with a generated id
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
        }
    }
}

/// A configured remote chat-completion endpoint plus credentials and models
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Channel {
    /// Unique identifier for the channel
    #[serde(default)]
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Endpoint URL the chat request is posted to
    #[serde(default)]
    pub endpoint: String,
    /// Secret key sent in the auth header
    #[serde(default)]
    pub key: String,
    /// Models available on this channel, in preference order
    #[serde(default)]
    pub models: Vec<ModelEntry>,
}

impl Channel {
    /// Create a channel with a generated id
    ///
    /// # Arguments
    ///
    /// * `name` - Display name
    /// * `endpoint` - Endpoint URL
    /// * `key` - Secret key
    /// * `models` - Available models
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        key: impl Into<String>,
        models: Vec<ModelEntry>,
    ) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            endpoint: endpoint.into(),
            key: key.into(),
            models,
        }
    }

    /// Parse a user-supplied model list into model entries
    ///
    /// Accepts one model name per line or comma-separated names. An empty
    /// list yields a single `default-model` entry so a channel is always
    /// usable.
    ///
    /// # Examples
    ///
    /// ```
    /// use kanava::store::types::Channel;
    ///
    /// let models = Channel::parse_models("gpt-4o, gpt-4o-mini");
    /// assert_eq!(models.len(), 2);
    /// assert_eq!(models[0].name, "gpt-4o");
    ///
    /// let fallback = Channel::parse_models("  ");
    /// assert_eq!(fallback[0].name, "default-model");
    /// ```
    pub fn parse_models(text: &str) -> Vec<ModelEntry> {
        let names: Vec<&str> = text
            .split(['\n', ','])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        if names.is_empty() {
            return vec![ModelEntry::new("default-model")];
        }

        names.into_iter().map(ModelEntry::new).collect()
    }

    /// Resolve a model id to a model entry, falling back to the first model
    ///
    /// A dangling or absent model id resolves to the channel's first model.
    /// Returns `None` only when the channel has no models at all.
    pub fn resolve_model(&self, model_id: Option<&str>) -> Option<&ModelEntry> {
        model_id
            .and_then(|id| self.models.iter().find(|m| m.id == id))
            .or_else(|| self.models.first())
    }
}

/// A single message inside a conversation
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoredMessage {
    /// Unique identifier for the message
    #[serde(default)]
    pub id: String,
    /// Role of the sender: "user" or "assistant"
    #[serde(default)]
    pub role: String,
    /// Text content
    #[serde(default)]
    pub content: String,
    /// Creation time, epoch milliseconds
    #[serde(default)]
    pub timestamp: i64,
    /// Estimated token count, display-only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<usize>,
}

impl StoredMessage {
    /// Create a user message stamped with the current time
    pub fn user(content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            id: new_id(),
            role: "user".to_string(),
            tokens: Some(crate::text::estimate_tokens(&content)),
            content,
            timestamp: now_millis(),
        }
    }

    /// Create an assistant message stamped with the current time
    pub fn assistant(content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            id: new_id(),
            role: "assistant".to_string(),
            tokens: Some(crate::text::estimate_tokens(&content)),
            content,
            timestamp: now_millis(),
        }
    }
}

/// A conversation: an ordered message history bound to a channel and model
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Unique identifier for the conversation
    #[serde(default)]
    pub id: String,
    /// User-facing title, derived from the first user message
    #[serde(default)]
    pub title: String,
    /// Channel this conversation talks to; may dangle after channel removal
    #[serde(default)]
    pub channel_id: Option<String>,
    /// Model used for replies; resolved against the channel at send time
    #[serde(default)]
    pub model_id: Option<String>,
    /// Ordered message history
    #[serde(default)]
    pub messages: Vec<StoredMessage>,
    /// Creation time, epoch milliseconds
    #[serde(default)]
    pub created_at: i64,
}

impl Conversation {
    /// Create an empty conversation bound to the given channel
    ///
    /// The conversation inherits the channel's first model when one exists.
    pub fn new(channel: Option<&Channel>) -> Self {
        Self {
            id: new_id(),
            title: crate::text::DEFAULT_TITLE.to_string(),
            channel_id: channel.map(|c| c.id.clone()),
            model_id: channel.and_then(|c| c.models.first()).map(|m| m.id.clone()),
            messages: Vec::new(),
            created_at: now_millis(),
        }
    }

    /// Time of the most recent activity, epoch milliseconds
    ///
    /// The timestamp of the last message, falling back to the creation time
    /// for empty conversations. Used to order conversation listings.
    pub fn last_activity(&self) -> i64 {
        self.messages
            .last()
            .map(|m| m.timestamp)
            .unwrap_or(self.created_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_id_is_unique() {
        assert_ne!(new_id(), new_id());
    }

    #[test]
    fn test_channel_new_generates_id() {
        let channel = Channel::new("Main", "https://api.example.com/v1/chat", "sk-x", vec![]);
        assert!(!channel.id.is_empty());
        assert_eq!(channel.name, "Main");
    }

    #[test]
    fn test_parse_models_newline_separated() {
        let models = Channel::parse_models("gpt-4o\ngpt-4o-mini\n");
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].name, "gpt-4o");
        assert_eq!(models[1].name, "gpt-4o-mini");
        assert_ne!(models[0].id, models[1].id);
    }

    #[test]
    fn test_parse_models_comma_separated() {
        let models = Channel::parse_models("a, b ,c");
        let names: Vec<&str> = models.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_models_empty_defaults() {
        let models = Channel::parse_models("");
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].name, "default-model");
    }

    #[test]
    fn test_resolve_model_by_id() {
        let mut channel = Channel::new("c", "https://x", "k", Channel::parse_models("a\nb"));
        let second_id = channel.models[1].id.clone();
        let resolved = channel.resolve_model(Some(&second_id)).unwrap();
        assert_eq!(resolved.name, "b");

        // Dangling id falls back to the first model.
        let resolved = channel.resolve_model(Some("missing")).unwrap();
        assert_eq!(resolved.name, "a");

        // No id at all also falls back to the first model.
        let resolved = channel.resolve_model(None).unwrap();
        assert_eq!(resolved.name, "a");

        channel.models.clear();
        assert!(channel.resolve_model(None).is_none());
    }

    #[test]
    fn test_stored_message_user() {
        let msg = StoredMessage::user("hello");
        assert_eq!(msg.role, "user");
        assert_eq!(msg.content, "hello");
        assert!(!msg.id.is_empty());
        assert!(msg.timestamp > 0);
        assert_eq!(msg.tokens, Some(2));
    }

    #[test]
    fn test_stored_message_assistant() {
        let msg = StoredMessage::assistant("hi there");
        assert_eq!(msg.role, "assistant");
        assert_eq!(msg.tokens, Some(2));
    }

    #[test]
    fn test_conversation_new_inherits_channel_model() {
        let channel = Channel::new("c", "https://x", "k", Channel::parse_models("m1\nm2"));
        let conversation = Conversation::new(Some(&channel));
        assert_eq!(conversation.channel_id.as_deref(), Some(channel.id.as_str()));
        assert_eq!(
            conversation.model_id.as_deref(),
            Some(channel.models[0].id.as_str())
        );
        assert!(conversation.messages.is_empty());
    }

    #[test]
    fn test_conversation_new_without_channel() {
        let conversation = Conversation::new(None);
        assert!(conversation.channel_id.is_none());
        assert!(conversation.model_id.is_none());
    }

    #[test]
    fn test_last_activity_prefers_last_message() {
        let mut conversation = Conversation::new(None);
        conversation.created_at = 100;
        assert_eq!(conversation.last_activity(), 100);

        let mut msg = StoredMessage::user("x");
        msg.timestamp = 500;
        conversation.messages.push(msg);
        assert_eq!(conversation.last_activity(), 500);
    }

    #[test]
    fn test_conversation_serializes_camel_case() {
        let conversation = Conversation::new(None);
        let json = serde_json::to_string(&conversation).unwrap();
        assert!(json.contains("\"channelId\""));
        assert!(json.contains("\"modelId\""));
        assert!(json.contains("\"createdAt\""));
    }

    #[test]
    fn test_records_tolerate_missing_fields() {
        // A channel persisted before models existed.
        let channel: Channel = serde_json::from_str(r#"{"id":"c1","name":"old"}"#).unwrap();
        assert!(channel.models.is_empty());
        assert!(channel.endpoint.is_empty());

        // A conversation with no channel binding and no timestamps.
        let conversation: Conversation =
            serde_json::from_str(r#"{"id":"v1","title":"t","messages":[]}"#).unwrap();
        assert!(conversation.channel_id.is_none());
        assert_eq!(conversation.created_at, 0);

        // A message with no token estimate.
        let message: StoredMessage =
            serde_json::from_str(r#"{"id":"m1","role":"user","content":"hi","timestamp":5}"#)
                .unwrap();
        assert_eq!(message.tokens, None);
    }
}
