//! Deterministic gateway for tests and offline use.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use auravo_core::DataUri;

use crate::error::GatewayError;
use crate::types::{
    ChatReply, ChatRequest, ConversationSummary, GeneratedImage, ImageRequest, SummaryRequest,
    Transcript, TranscriptionRequest,
};
use crate::ModelGateway;

/// 1x1 transparent PNG returned by the default image behaviour.
const PLACEHOLDER_PNG_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

/// A call observed by [`MockGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    Chat { history_len: usize, prompt: String },
    TranscribeAudio { mime_type: String },
    GenerateImage { prompt: String },
    SummarizeConversation { conversation: String },
}

/// How one operation of the mock responds.
#[derive(Debug, Clone)]
enum Behaviour<T> {
    Default,
    Reply(T),
    Fail(String),
}

/// Mock model gateway.
///
/// Each operation answers with a built-in default unless overridden with a
/// fixed reply or a failure. Requests are validated exactly like the real
/// gateway and every call is recorded, including failed ones.
#[derive(Debug)]
pub struct MockGateway {
    chat: Behaviour<String>,
    transcript: Behaviour<String>,
    image: Behaviour<DataUri>,
    summary: Behaviour<String>,
    chat_delay: Option<Duration>,
    calls: Mutex<Vec<GatewayCall>>,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            chat: Behaviour::Default,
            transcript: Behaviour::Default,
            image: Behaviour::Default,
            summary: Behaviour::Default,
            chat_delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_chat_reply(mut self, reply: impl Into<String>) -> Self {
        self.chat = Behaviour::Reply(reply.into());
        self
    }

    pub fn failing_chat(mut self, reason: impl Into<String>) -> Self {
        self.chat = Behaviour::Fail(reason.into());
        self
    }

    /// Sleep before answering chat calls.
    pub fn with_chat_delay(mut self, delay: Duration) -> Self {
        self.chat_delay = Some(delay);
        self
    }

    pub fn with_transcript(mut self, transcript: impl Into<String>) -> Self {
        self.transcript = Behaviour::Reply(transcript.into());
        self
    }

    pub fn failing_transcription(mut self, reason: impl Into<String>) -> Self {
        self.transcript = Behaviour::Fail(reason.into());
        self
    }

    pub fn with_image(mut self, image: DataUri) -> Self {
        self.image = Behaviour::Reply(image);
        self
    }

    pub fn failing_image(mut self, reason: impl Into<String>) -> Self {
        self.image = Behaviour::Fail(reason.into());
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Behaviour::Reply(summary.into());
        self
    }

    pub fn failing_summary(mut self, reason: impl Into<String>) -> Self {
        self.summary = Behaviour::Fail(reason.into());
        self
    }

    /// Every call observed so far, oldest first.
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn chat_calls(&self) -> usize {
        self.count(|c| matches!(c, GatewayCall::Chat { .. }))
    }

    pub fn image_calls(&self) -> usize {
        self.count(|c| matches!(c, GatewayCall::GenerateImage { .. }))
    }

    pub fn transcription_calls(&self) -> usize {
        self.count(|c| matches!(c, GatewayCall::TranscribeAudio { .. }))
    }

    pub fn summary_calls(&self) -> usize {
        self.count(|c| matches!(c, GatewayCall::SummarizeConversation { .. }))
    }

    fn count(&self, pred: impl Fn(&GatewayCall) -> bool) -> usize {
        self.calls
            .lock()
            .map(|c| c.iter().filter(|call| pred(call)).count())
            .unwrap_or(0)
    }

    fn record(&self, call: GatewayCall) {
        match self.calls.lock() {
            Ok(mut calls) => calls.push(call),
            Err(e) => tracing::error!("Mock call log poisoned: {}", e),
        }
    }
}

fn respond<T: Clone>(
    behaviour: &Behaviour<T>,
    default: impl FnOnce() -> T,
) -> Result<T, GatewayError> {
    match behaviour {
        Behaviour::Default => Ok(default()),
        Behaviour::Reply(value) => Ok(value.clone()),
        Behaviour::Fail(reason) => Err(GatewayError::Mock(reason.clone())),
    }
}

#[async_trait]
impl ModelGateway for MockGateway {
    async fn chat(&self, request: ChatRequest) -> Result<ChatReply, GatewayError> {
        self.record(GatewayCall::Chat {
            history_len: request.history.len(),
            prompt: request.prompt.clone(),
        });
        request.validate()?;
        if let Some(delay) = self.chat_delay {
            tokio::time::sleep(delay).await;
        }
        let response = respond(&self.chat, || format!("You said: {}", request.prompt))?;
        tracing::debug!(response_len = response.len(), "Mock chat reply generated");
        Ok(ChatReply { response })
    }

    async fn transcribe_audio(
        &self,
        request: TranscriptionRequest,
    ) -> Result<Transcript, GatewayError> {
        self.record(GatewayCall::TranscribeAudio {
            mime_type: request.audio.mime_type().to_string(),
        });
        request.validate()?;
        let transcript = respond(&self.transcript, || "[mock transcription]".to_string())?;
        Ok(Transcript { transcript })
    }

    async fn generate_image(&self, request: ImageRequest) -> Result<GeneratedImage, GatewayError> {
        self.record(GatewayCall::GenerateImage {
            prompt: request.prompt.clone(),
        });
        request.validate()?;
        let image = respond(&self.image, || {
            DataUri::from_base64("image/png", PLACEHOLDER_PNG_BASE64)
        })?;
        Ok(GeneratedImage { image })
    }

    async fn summarize_conversation(
        &self,
        request: SummaryRequest,
    ) -> Result<ConversationSummary, GatewayError> {
        self.record(GatewayCall::SummarizeConversation {
            conversation: request.conversation.clone(),
        });
        request.validate()?;
        let summary = respond(&self.summary, || "Mock Conversation".to_string())?;
        Ok(ConversationSummary { summary })
    }
}

// =============================================================================
// Tests
// =============================================================================
