//! Request and response shapes of the gateway operations.

use auravo_core::{DataUri, Message, MessageContent, Role};
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// One prior turn sent along with a chat prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub role: Role,
    pub content: MessageContent,
}

impl From<&Message> for HistoryTurn {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

/// Input of [`ModelGateway::chat`](crate::ModelGateway::chat).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Prior turns, oldest first. Does not include `prompt`.
    pub history: Vec<HistoryTurn>,
    pub prompt: String,
}

impl ChatRequest {
    pub fn new(history: Vec<HistoryTurn>, prompt: impl Into<String>) -> Self {
        Self {
            history,
            prompt: prompt.into(),
        }
    }

    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.prompt.trim().is_empty() {
            return Err(GatewayError::InvalidRequest(
                "chat prompt cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
}

/// Input of [`ModelGateway::transcribe_audio`](crate::ModelGateway::transcribe_audio).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptionRequest {
    pub audio: DataUri,
}

impl TranscriptionRequest {
    pub fn new(audio: DataUri) -> Self {
        Self { audio }
    }

    pub fn validate(&self) -> Result<(), GatewayError> {
        if !self.audio.is_audio() {
            return Err(GatewayError::InvalidRequest(format!(
                "expected audio data, got '{}'",
                self.audio.mime_type()
            )));
        }
        if self.audio.payload().is_empty() {
            return Err(GatewayError::InvalidRequest(
                "audio payload is empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    pub transcript: String,
}

/// Input of [`ModelGateway::generate_image`](crate::ModelGateway::generate_image).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRequest {
    pub prompt: String,
}

impl ImageRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }

    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.prompt.trim().is_empty() {
            return Err(GatewayError::InvalidRequest(
                "image prompt cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub image: DataUri,
}

/// Input of [`ModelGateway::summarize_conversation`](crate::ModelGateway::summarize_conversation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRequest {
    /// `role: content` lines of the exchange.
    pub conversation: String,
}

impl SummaryRequest {
    pub fn new(conversation: impl Into<String>) -> Self {
        Self {
            conversation: conversation.into(),
        }
    }

    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.conversation.trim().is_empty() {
            return Err(GatewayError::InvalidRequest(
                "conversation text cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub summary: String,
}
