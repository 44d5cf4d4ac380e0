//! Error types for the model gateway.

use auravo_core::error::AuravoError;

/// Errors from a model gateway call.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("no API key configured (set gateway.api_key or GEMINI_API_KEY)")]
    MissingApiKey,
    #[error("request failed: {0}")]
    Transport(String),
    #[error("upstream returned {status}: {message}")]
    Upstream { status: u16, message: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("empty response: {0}")]
    EmptyResponse(String),
    #[error("mock failure: {0}")]
    Mock(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GatewayError::MalformedResponse(err.to_string())
        } else {
            GatewayError::Transport(err.to_string())
        }
    }
}

impl From<GatewayError> for AuravoError {
    fn from(err: GatewayError) -> Self {
        AuravoError::Gateway(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_error_display() {
        let err = GatewayError::InvalidRequest("prompt is empty".to_string());
        assert_eq!(err.to_string(), "invalid request: prompt is empty");

        let err = GatewayError::Upstream {
            status: 429,
            message: "RESOURCE_EXHAUSTED: quota".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "upstream returned 429: RESOURCE_EXHAUSTED: quota"
        );

        let err = GatewayError::MissingApiKey;
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn test_gateway_error_into_auravo_error() {
        let err: AuravoError = GatewayError::EmptyResponse("no candidates".to_string()).into();
        assert!(matches!(err, AuravoError::Gateway(_)));
        assert!(err.to_string().contains("no candidates"));
    }
}
