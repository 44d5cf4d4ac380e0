//! Model Gateway: the request/response boundary to the hosted language model.
//!
//! Four independent operations (chat, audio transcription, image generation
//! and conversation summarization) behind the [`ModelGateway`] trait, with a
//! Gemini REST implementation and a deterministic mock.

pub mod error;
pub mod gemini;
pub mod mock;
pub mod prompts;
pub mod types;

use async_trait::async_trait;

pub use error::GatewayError;
pub use gemini::GeminiGateway;
pub use mock::{GatewayCall, MockGateway};
pub use prompts::suggested_prompts;
pub use types::{
    ChatReply, ChatRequest, ConversationSummary, GeneratedImage, HistoryTurn, ImageRequest,
    SummaryRequest, Transcript, TranscriptionRequest,
};

/// A single-call boundary to the hosted model.
///
/// Implementations hold no session state and never retry; every call is one
/// request and one response or error.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Continue a conversation with `prompt`, given the prior history.
    async fn chat(&self, request: ChatRequest) -> Result<ChatReply, GatewayError>;

    /// Turn recorded audio into text.
    async fn transcribe_audio(
        &self,
        request: TranscriptionRequest,
    ) -> Result<Transcript, GatewayError>;

    /// Produce an image for a text prompt.
    async fn generate_image(&self, request: ImageRequest) -> Result<GeneratedImage, GatewayError>;

    /// Produce a short title for a conversation transcript.
    async fn summarize_conversation(
        &self,
        request: SummaryRequest,
    ) -> Result<ConversationSummary, GatewayError>;
}
