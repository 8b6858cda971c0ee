//! Error types for the market engine

use thiserror::Error;

/// Market engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Malformed order book snapshot: {0}")]
    MalformedSnapshot(String),

    #[error("Invalid rounding input: {0}")]
    InvalidRoundingInput(String),

    #[error("Invalid pool metadata: {0}")]
    InvalidPool(String),

    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    #[error("Pool not found: {0}")]
    PoolNotFound(String),

    #[error("Failed to parse message: {0}")]
    ParseError(String),

    #[error("REST API error: {0}")]
    RestApiError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    IoError(String),
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::ParseError(err.to_string())
    }
}

impl From<reqwest::Error> for EngineError {
    fn from(err: reqwest::Error) -> Self {
        EngineError::RestApiError(err.to_string())
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::IoError(err.to_string())
    }
}

impl From<::config::ConfigError> for EngineError {
    fn from(err: ::config::ConfigError) -> Self {
        EngineError::ConfigError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
