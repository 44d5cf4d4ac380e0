//! GeminiGateway - direct REST implementation against the Gemini API.
//!
//! Every operation is one `generateContent` call. Request bodies and
//! response extraction are plain functions so they can be checked without
//! a network.

use async_trait::async_trait;
use auravo_core::config::GatewayConfig;
use auravo_core::{DataUri, MessageContent, Role};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::prompts::{clean_title, summary_prompt, SYSTEM_INSTRUCTION, TRANSCRIPTION_INSTRUCTION};
use crate::types::{
    ChatReply, ChatRequest, ConversationSummary, GeneratedImage, ImageRequest, SummaryRequest,
    Transcript, TranscriptionRequest,
};
use crate::ModelGateway;

/// Gateway that talks to the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiGateway {
    client: Client,
    api_key: String,
    base_url: String,
    chat_model: String,
    image_model: String,
}

impl std::fmt::Debug for GeminiGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiGateway")
            .field("base_url", &self.base_url)
            .field("chat_model", &self.chat_model)
            .field("image_model", &self.image_model)
            .finish_non_exhaustive()
    }
}

impl GeminiGateway {
    /// Build a gateway from configuration, resolving the API key from the
    /// environment when the config leaves it empty.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let api_key = config.resolve_api_key().ok_or(GatewayError::MissingApiKey)?;
        Ok(Self {
            client: Client::new(),
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            chat_model: config.chat_model.clone(),
            image_model: config.image_model.clone(),
        })
    }

    /// Replace the HTTP client (proxies, custom TLS).
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    async fn generate(
        &self,
        model: &str,
        body: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GatewayError> {
        let url = format!("{}/{}:generateContent", self.base_url, model);
        tracing::debug!(model = %model, contents = body.contents.len(), "Gemini request");

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read Gemini error body".to_string());
            return Err(map_http_error(status, &body_text));
        }

        Ok(response.json::<GenerateContentResponse>().await?)
    }
}

#[async_trait]
impl ModelGateway for GeminiGateway {
    async fn chat(&self, request: ChatRequest) -> Result<ChatReply, GatewayError> {
        request.validate()?;
        let body = build_chat_request(&request);
        let response = self.generate(&self.chat_model, &body).await?;
        Ok(ChatReply {
            response: extract_text(response)?,
        })
    }

    async fn transcribe_audio(
        &self,
        request: TranscriptionRequest,
    ) -> Result<Transcript, GatewayError> {
        request.validate()?;
        let body = build_transcription_request(&request.audio);
        let response = self.generate(&self.chat_model, &body).await?;
        Ok(Transcript {
            transcript: extract_text(response)?.trim().to_string(),
        })
    }

    async fn generate_image(&self, request: ImageRequest) -> Result<GeneratedImage, GatewayError> {
        request.validate()?;
        let body = build_image_request(&request.prompt);
        let response = self.generate(&self.image_model, &body).await?;
        Ok(GeneratedImage {
            image: extract_image(response)?,
        })
    }

    async fn summarize_conversation(
        &self,
        request: SummaryRequest,
    ) -> Result<ConversationSummary, GatewayError> {
        request.validate()?;
        let body = GenerateContentRequest {
            contents: vec![Content::user(vec![Part::text(summary_prompt(
                &request.conversation,
            ))])],
            system_instruction: None,
            generation_config: None,
        };
        let response = self.generate(&self.chat_model, &body).await?;
        let summary = clean_title(&extract_text(response)?);
        if summary.is_empty() {
            return Err(GatewayError::EmptyResponse(
                "summary was blank".to_string(),
            ));
        }
        Ok(ConversationSummary { summary })
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

impl Content {
    fn user(parts: Vec<Part>) -> Self {
        Self {
            role: Some("user"),
            parts,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    fn inline(uri: &DataUri) -> Self {
        Part::InlineData {
            inline_data: InlineData {
                mime_type: uri.mime_type().to_string(),
                data: uri.payload().to_string(),
            },
        }
    }

    fn from_content(content: &MessageContent) -> Self {
        match content {
            MessageContent::Text(text) => Part::text(text.clone()),
            MessageContent::Image(uri) => Part::inline(uri),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartResponse {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

// =============================================================================
// Request construction and response extraction
// =============================================================================

fn role_name(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Model => "model",
    }
}

fn build_chat_request(request: &ChatRequest) -> GenerateContentRequest {
    let mut contents: Vec<Content> = request
        .history
        .iter()
        .map(|turn| Content {
            role: Some(role_name(turn.role)),
            parts: vec![Part::from_content(&turn.content)],
        })
        .collect();
    contents.push(Content::user(vec![Part::text(request.prompt.clone())]));

    GenerateContentRequest {
        contents,
        system_instruction: Some(Content {
            role: None,
            parts: vec![Part::text(SYSTEM_INSTRUCTION)],
        }),
        generation_config: None,
    }
}

fn build_transcription_request(audio: &DataUri) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content::user(vec![
            Part::text(TRANSCRIPTION_INSTRUCTION),
            Part::inline(audio),
        ])],
        system_instruction: None,
        generation_config: None,
    }
}

fn build_image_request(prompt: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content::user(vec![Part::text(prompt)])],
        system_instruction: None,
        generation_config: Some(GenerationConfig {
            response_modalities: vec!["TEXT", "IMAGE"],
        }),
    }
}

fn first_parts(response: GenerateContentResponse) -> Result<Vec<PartResponse>, GatewayError> {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts)
        .filter(|parts| !parts.is_empty())
        .ok_or_else(|| GatewayError::EmptyResponse("no candidates in response".to_string()))
}

/// Concatenate the text parts of the first candidate.
fn extract_text(response: GenerateContentResponse) -> Result<String, GatewayError> {
    let text: String = first_parts(response)?
        .into_iter()
        .filter_map(|part| part.text)
        .collect();
    if text.trim().is_empty() {
        return Err(GatewayError::EmptyResponse(
            "response carried no text".to_string(),
        ));
    }
    Ok(text)
}

/// The first inline image part of the first candidate, as a data URI.
fn extract_image(response: GenerateContentResponse) -> Result<DataUri, GatewayError> {
    first_parts(response)?
        .into_iter()
        .filter_map(|part| part.inline_data)
        .find(|data| data.mime_type.starts_with("image/"))
        .map(|data| DataUri::from_base64(&data.mime_type, &data.data))
        .ok_or_else(|| GatewayError::EmptyResponse("response carried no image".to_string()))
}

fn map_http_error(status: StatusCode, body: &str) -> GatewayError {
    let message = serde_json::from_str::<ErrorWrapper>(body)
        .map(|wrapper| {
            let msg = wrapper.error.message.unwrap_or_else(|| body.to_string());
            match wrapper.error.status {
                Some(status_text) if !status_text.is_empty() => format!("{status_text}: {msg}"),
                _ => msg,
            }
        })
        .unwrap_or_else(|_| body.to_string());

    GatewayError::Upstream {
        status: status.as_u16(),
        message,
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HistoryTurn;

    fn response(json: serde_json::Value) -> GenerateContentResponse {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_from_config_requires_key() {
        let config = GatewayConfig {
            api_key: "k".to_string(),
            base_url: "http://localhost:9999/models/".to_string(),
            ..GatewayConfig::default()
        };
        let gateway = GeminiGateway::from_config(&config).unwrap();
        assert_eq!(gateway.base_url, "http://localhost:9999/models");
        assert_eq!(gateway.api_key, "k");
        assert!(!format!("{:?}", gateway).contains("\"k\""));
    }

    #[test]
    fn test_chat_request_body() {
        let image = DataUri::from_bytes("image/png", b"png");
        let request = ChatRequest::new(
            vec![
                HistoryTurn {
                    role: Role::User,
                    content: MessageContent::text("draw a cat"),
                },
                HistoryTurn {
                    role: Role::Model,
                    content: MessageContent::Image(image.clone()),
                },
            ],
            "make it orange",
        );
        let body = serde_json::to_value(build_chat_request(&request)).unwrap();

        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[0]["parts"][0]["text"], "draw a cat");
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[1]["parts"][0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(contents[1]["parts"][0]["inlineData"]["data"], image.payload());
        assert_eq!(contents[2]["parts"][0]["text"], "make it orange");
        assert!(body["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("Auravo"));
        assert!(body["systemInstruction"].get("role").is_none());
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn test_transcription_request_body() {
        let audio = DataUri::from_bytes("audio/webm", b"opus");
        let body = serde_json::to_value(build_transcription_request(&audio)).unwrap();
        let parts = body["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0]["text"], TRANSCRIPTION_INSTRUCTION);
        assert_eq!(parts[1]["inlineData"]["mimeType"], "audio/webm");
    }

    #[test]
    fn test_image_request_asks_for_image_modality() {
        let body = serde_json::to_value(build_image_request("a cat")).unwrap();
        assert_eq!(
            body["generationConfig"]["responseModalities"],
            serde_json::json!(["TEXT", "IMAGE"])
        );
        assert_eq!(body["contents"][0]["parts"][0]["text"], "a cat");
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let resp = response(serde_json::json!({
            "candidates": [{"content": {"role": "model", "parts": [
                {"text": "Hi "}, {"text": "there!"}
            ]}}]
        }));
        assert_eq!(extract_text(resp).unwrap(), "Hi there!");
    }

    #[test]
    fn test_extract_text_no_candidates() {
        let resp = response(serde_json::json!({"candidates": []}));
        assert!(matches!(
            extract_text(resp),
            Err(GatewayError::EmptyResponse(_))
        ));

        let resp = response(serde_json::json!({}));
        assert!(extract_text(resp).is_err());
    }

    #[test]
    fn test_extract_image() {
        let resp = response(serde_json::json!({
            "candidates": [{"content": {"parts": [
                {"text": "Here is your cat."},
                {"inlineData": {"mimeType": "image/png", "data": "iVBORw0KGgo="}}
            ]}}]
        }));
        let uri = extract_image(resp).unwrap();
        assert_eq!(uri.as_str(), "data:image/png;base64,iVBORw0KGgo=");
        assert!(uri.is_image());
    }

    #[test]
    fn test_extract_image_text_only() {
        let resp = response(serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "I can't draw that."}]}}]
        }));
        assert!(matches!(
            extract_image(resp),
            Err(GatewayError::EmptyResponse(_))
        ));
    }

    #[test]
    fn test_map_http_error_with_envelope() {
        let body = r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
        match map_http_error(StatusCode::TOO_MANY_REQUESTS, body) {
            GatewayError::Upstream { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "RESOURCE_EXHAUSTED: Quota exceeded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_map_http_error_plain_body() {
        match map_http_error(StatusCode::BAD_GATEWAY, "upstream down") {
            GatewayError::Upstream { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "upstream down");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_request_fails_before_network() {
        let config = GatewayConfig {
            api_key: "k".to_string(),
            base_url: "http://127.0.0.1:1".to_string(),
            ..GatewayConfig::default()
        };
        let gateway = GeminiGateway::from_config(&config).unwrap();
        let err = gateway
            .chat(ChatRequest::new(vec![], "  "))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidRequest(_)));
    }
}
