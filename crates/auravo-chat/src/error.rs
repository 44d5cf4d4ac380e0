//! Error types for the conversation controller and input capture.

use auravo_core::error::AuravoError;
use auravo_core::ConversationId;
use auravo_gateway::GatewayError;
use auravo_storage::StoreError;

use crate::voice::Notice;

/// Errors from the conversation controller.
///
/// Gateway failures never appear here; they become the fallback reply.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("conversation not found: {0}")]
    ConversationNotFound(ConversationId),
    #[error("conversation state unavailable: {0}")]
    State(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<StoreError> for ChatError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ChatError::ConversationNotFound(id),
            StoreError::Persistence(inner) => ChatError::Storage(inner.to_string()),
        }
    }
}

impl From<ChatError> for AuravoError {
    fn from(err: ChatError) -> Self {
        AuravoError::Storage(err.to_string())
    }
}

/// Errors from the voice capture path.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("a recording is already in progress")]
    AlreadyRecording,
    #[error("no recording in progress")]
    NotRecording,
    #[error("microphone unavailable: {0}")]
    Microphone(String),
    #[error("recorder failed: {0}")]
    Recorder(String),
    #[error("recording is empty")]
    EmptyRecording,
    #[error("recording of {size} bytes exceeds limit of {limit} bytes")]
    TooLarge { size: usize, limit: usize },
    #[error("transcription failed: {0}")]
    Transcription(#[from] GatewayError),
}

impl CaptureError {
    /// The notification to show for this failure, if any.
    ///
    /// Misuse of the state machine is a programming error and has none.
    pub fn notice(&self) -> Option<Notice> {
        match self {
            CaptureError::AlreadyRecording | CaptureError::NotRecording => None,
            CaptureError::Microphone(_) => Some(Notice::microphone_error()),
            CaptureError::Recorder(_)
            | CaptureError::EmptyRecording
            | CaptureError::TooLarge { .. }
            | CaptureError::Transcription(_) => Some(Notice::processing_failed()),
        }
    }
}

impl From<CaptureError> for AuravoError {
    fn from(err: CaptureError) -> Self {
        AuravoError::Capture(err.to_string())
    }
}
