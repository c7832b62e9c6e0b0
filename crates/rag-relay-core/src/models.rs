//! Core data models used throughout rag-relay.
//!
//! These types represent the chat messages that flow through the relay and
//! the index entries and ranked candidates produced by retrieval.

use serde::{Deserialize, Deserializer, Serialize};

/// Role of a chat message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    /// Absent or `null` content reads as empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Inbound chat request sent by the host platform.
///
/// Fields other than `messages` are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

impl ChatRequest {
    /// Returns the most recent user message with non-empty content.
    ///
    /// Walks the conversation newest-first, skipping non-user and empty
    /// messages, and stops at the first match.
    pub fn latest_user_message(&self) -> Option<&ChatMessage> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::User && !m.content.is_empty())
    }
}

/// Outbound streaming chat-completion request.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
}

/// A document stored in the index, identified by its path.
///
/// `payload` is the metadata stored alongside the vector; in this
/// deployment it only carries `{"filename": path}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentReference {
    pub path: String,
    #[serde(default)]
    pub payload: serde_json::Map<String, serde_json::Value>,
}

impl DocumentReference {
    /// Create a reference whose payload records the filename.
    pub fn from_path(path: impl Into<String>) -> Self {
        let path = path.into();
        let mut payload = serde_json::Map::new();
        payload.insert(
            "filename".to_string(),
            serde_json::Value::String(path.clone()),
        );
        Self { path, payload }
    }
}

/// An embedding vector paired with the document it was computed from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub vector: Vec<f32>,
    pub reference: DocumentReference,
}

/// A retrieval result: a document and its cosine similarity to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedCandidate {
    pub reference: DocumentReference,
    pub score: f32,
}
