//! Error types for account operations.

use auravo_core::error::AuravoError;

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("You must be logged in to update your profile.")]
    NotLoggedIn,
    #[error("invalid form: {0}")]
    InvalidForm(String),
    #[error("upload failed: {0}")]
    Upload(String),
    #[error("profile storage error: {0}")]
    Storage(String),
}

impl From<std::io::Error> for AccountError {
    fn from(err: std::io::Error) -> Self {
        AccountError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AccountError {
    fn from(err: serde_json::Error) -> Self {
        AccountError::Storage(err.to_string())
    }
}

impl From<AccountError> for AuravoError {
    fn from(err: AccountError) -> Self {
        AuravoError::Account(err.to_string())
    }
}
