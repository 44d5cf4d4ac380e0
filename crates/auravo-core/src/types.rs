use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::data_uri::DataUri;

/// Title given to every conversation until its first exchange is summarized.
pub const DEFAULT_TITLE: &str = "New Chat";

/// Prefix of a legacy untagged content string that holds an image.
const LEGACY_IMAGE_PREFIX: &str = "data:image";

// =============================================================================
// Enums
// =============================================================================

/// Author of a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The person typing or speaking.
    User,
    /// The hosted language model.
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a message, tagged by kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "TaggedContent", from = "ContentRepr")]
pub enum MessageContent {
    /// Plain or markdown text.
    Text(String),
    /// A generated image.
    Image(DataUri),
}

impl MessageContent {
    pub fn text(value: impl Into<String>) -> Self {
        MessageContent::Text(value.into())
    }

    pub fn is_image(&self) -> bool {
        matches!(self, MessageContent::Image(_))
    }

    /// The content as it is sent to the model or shown in a transcript.
    pub fn as_str(&self) -> &str {
        match self {
            MessageContent::Text(text) => text,
            MessageContent::Image(uri) => uri.as_str(),
        }
    }

    /// Interpret an untagged content string, sniffing for an image data URI.
    pub fn from_legacy(value: String) -> Self {
        if value.starts_with(LEGACY_IMAGE_PREFIX) {
            match value.parse::<DataUri>() {
                Ok(uri) => return MessageContent::Image(uri),
                Err(e) => tracing::debug!(error = %e, "Legacy image content kept as text"),
            }
        }
        MessageContent::Text(value)
    }
}

/// Wire form of [`MessageContent`].
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
enum TaggedContent {
    Text(String),
    Image(DataUri),
}

/// Accepts both the tagged form and the older bare-string form.
#[derive(Deserialize)]
#[serde(untagged)]
enum ContentRepr {
    Tagged(TaggedContent),
    Legacy(String),
}

impl From<MessageContent> for TaggedContent {
    fn from(content: MessageContent) -> Self {
        match content {
            MessageContent::Text(text) => TaggedContent::Text(text),
            MessageContent::Image(uri) => TaggedContent::Image(uri),
        }
    }
}

impl From<ContentRepr> for MessageContent {
    fn from(repr: ContentRepr) -> Self {
        match repr {
            ContentRepr::Tagged(TaggedContent::Text(text)) => MessageContent::Text(text),
            ContentRepr::Tagged(TaggedContent::Image(uri)) => MessageContent::Image(uri),
            ContentRepr::Legacy(value) => MessageContent::from_legacy(value),
        }
    }
}

// =============================================================================
// Messages and conversations
// =============================================================================

/// A single turn in a conversation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
    /// Set on model replies the presentation layer should reveal incrementally.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_streaming: bool,
}

impl Message {
    pub fn user(content: MessageContent) -> Self {
        Self {
            role: Role::User,
            content,
            is_streaming: false,
        }
    }

    pub fn model(content: MessageContent) -> Self {
        Self {
            role: Role::Model,
            content,
            is_streaming: false,
        }
    }

    pub fn streaming(mut self) -> Self {
        self.is_streaming = true;
        self
    }
}

/// Identifier of a conversation, derived from its creation time.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    /// Id for a conversation created at the given unix millisecond.
    pub fn from_millis(millis: i64) -> Self {
        Self(format!("chat-{}", millis))
    }

    /// Id for a conversation created now.
    pub fn now() -> Self {
        Self::from_millis(Utc::now().timestamp_millis())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ConversationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ConversationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An ordered exchange of messages with a title.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub title: String,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Conversation {
    /// An empty conversation carrying the placeholder title.
    pub fn new(id: ConversationId) -> Self {
        Self {
            id,
            title: DEFAULT_TITLE.to_string(),
            messages: Vec::new(),
        }
    }

    pub fn has_default_title(&self) -> bool {
        self.title == DEFAULT_TITLE
    }

    /// Render the messages as `role: content` lines. Images appear as
    /// `[image]`.
    pub fn transcript(&self) -> String {
        self.messages
            .iter()
            .map(|m| match &m.content {
                MessageContent::Text(text) => format!("{}: {}", m.role, text),
                MessageContent::Image(_) => format!("{}: [image]", m.role),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Lightweight listing entry for a conversation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub id: ConversationId,
    pub title: String,
    pub message_count: usize,
    pub is_current: bool,
}

// =============================================================================
// Tests
// =============================================================================
