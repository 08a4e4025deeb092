//! Error types for the datobridge core library.

use thiserror::Error;

/// Result type alias using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error types for datobridge.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration loading or validation error.
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// No API token could be resolved from any configured source.
    #[error("Credential error: {0}")]
    Credential(String),

    /// A content item is missing required data.
    #[error("Invalid content item {id:?}: {message}")]
    InvalidItem { id: String, message: String },

    /// Two content items share the same identifier.
    #[error("Duplicate content item id: {0}")]
    DuplicateItem(String),

    /// File system I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic configuration crate error.
    #[error("Config crate error: {0}")]
    ConfigCrate(#[from] config::ConfigError),
}

impl CoreError {
    /// Create a new configuration error with a message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new configuration error with source.
    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new credential error.
    pub fn credential(message: impl Into<String>) -> Self {
        Self::Credential(message.into())
    }

    /// Create a new invalid item error.
    pub fn invalid_item(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidItem {
            id: id.into(),
            message: message.into(),
        }
    }

    /// Whether this error means no credential was available.
    #[must_use]
    pub fn is_credential(&self) -> bool {
        matches!(self, Self::Credential(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let err = CoreError::config("missing field");
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("missing field"));
    }

    #[test]
    fn test_credential_error() {
        let err = CoreError::credential("Missing DatoCMS site API token!");
        assert!(err.is_credential());
        assert!(err.to_string().contains("API token"));
    }

    #[test]
    fn test_invalid_item_error() {
        let err = CoreError::invalid_item("42", "missing item type");
        assert!(!err.is_credential());
        assert!(err.to_string().contains("\"42\""));
        assert!(err.to_string().contains("missing item type"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CoreError = io_err.into();
        assert!(err.to_string().contains("IO error"));
    }
}
