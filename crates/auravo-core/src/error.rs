use thiserror::Error;

/// Top-level error type for Auravo.
///
/// Subsystem crates define their own error types and implement
/// `From<SubsystemError> for AuravoError` so that `?` works across crate
/// boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuravoError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Capture error: {0}")]
    Capture(String),

    #[error("Account error: {0}")]
    Account(String),

    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for AuravoError {
    fn from(err: toml::de::Error) -> Self {
        AuravoError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for AuravoError {
    fn from(err: toml::ser::Error) -> Self {
        AuravoError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for AuravoError {
    fn from(err: serde_json::Error) -> Self {
        AuravoError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Auravo operations.
pub type Result<T> = std::result::Result<T, AuravoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuravoError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");

        let err = AuravoError::InvalidDataUri("no comma".to_string());
        assert_eq!(err.to_string(), "Invalid data URI: no comma");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: AuravoError = io_err.into();
        assert!(matches!(err, AuravoError::Io(_)));
        assert!(err.to_string().starts_with("I/O error:"));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_from_toml_de() {
        let err: std::result::Result<toml::Value, _> = toml::from_str("invalid = [[[");
        let err: AuravoError = err.unwrap_err().into();
        assert!(matches!(err, AuravoError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let err: std::result::Result<serde_json::Value, _> = serde_json::from_str("{ nope }");
        let err: AuravoError = err.unwrap_err().into();
        assert!(matches!(err, AuravoError::Serialization(_)));
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<String> {
            let io_result: std::result::Result<i32, std::io::Error> = Ok(42);
            let value = io_result?;
            Ok(value.to_string())
        }

        assert_eq!(inner().unwrap(), "42");
    }
}
