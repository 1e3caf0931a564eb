//! Configuration Error Types
//!
//! Specific, actionable errors for configuration loading and validation. They are
//! folded into [`FlowlaneError::ConfigurationError`] at the crate boundary, which keeps
//! them in the fatal class.

use thiserror::Error;

use crate::error::FlowlaneError;

#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Missing or unreadable configuration source
    #[error("Failed to load configuration from {source_name}: {error}")]
    LoadError { source_name: String, error: String },

    /// Sources loaded but did not deserialize into the expected shape
    #[error("Invalid configuration structure: {error}")]
    ParseError { error: String },

    /// Invalid configuration value
    #[error("Invalid value '{value}' for field '{field}': {context}")]
    InvalidValue {
        field: String,
        value: String,
        context: String,
    },
}

impl ConfigurationError {
    pub fn load_error(source_name: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self::LoadError {
            source_name: source_name.into(),
            error: error.to_string(),
        }
    }

    pub fn parse_error(error: impl std::fmt::Display) -> Self {
        Self::ParseError {
            error: error.to_string(),
        }
    }

    pub fn invalid_value(
        field: impl Into<String>,
        value: impl std::fmt::Display,
        context: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.to_string(),
            context: context.into(),
        }
    }
}

impl From<ConfigurationError> for FlowlaneError {
    fn from(error: ConfigurationError) -> Self {
        FlowlaneError::ConfigurationError(error.to_string())
    }
}

pub type ConfigResult<T> = Result<T, ConfigurationError>;
