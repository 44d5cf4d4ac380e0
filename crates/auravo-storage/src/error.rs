//! Error types for the conversation store.

use auravo_core::error::AuravoError;
use auravo_core::ConversationId;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("conversation not found: {0}")]
    NotFound(ConversationId),
    /// The in-memory change was applied but could not be written out.
    #[error("failed to persist conversations: {0}")]
    Persistence(#[from] AuravoError),
}

impl From<StoreError> for AuravoError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Persistence(inner) => inner,
            other => AuravoError::Storage(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::NotFound(ConversationId::from("chat-1"));
        assert_eq!(err.to_string(), "conversation not found: chat-1");

        let err = StoreError::Persistence(AuravoError::Storage("disk full".to_string()));
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn test_not_found_into_auravo_error() {
        let err: AuravoError = StoreError::NotFound(ConversationId::from("chat-9")).into();
        assert!(matches!(err, AuravoError::Storage(ref m) if m.contains("chat-9")));
    }
}
