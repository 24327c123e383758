//! Error types for the forecaster
//!
//! Provider, oracle and renderer failures are recoverable per instrument.
//! Model-load and configuration failures end the process.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ForecastError>;

#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("provider {provider} failed: {message}")]
    Provider { provider: String, message: String },

    #[error("forecast oracle failed: {0}")]
    Oracle(String),

    #[error("model load failed: {0}")]
    ModelLoad(String),

    #[error("chart rendering failed: {0}")]
    Renderer(String),

    #[error("cycle produced no forecasts")]
    EmptyReport,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid time series: {0}")]
    InvalidSeries(String),

    #[error("invalid ensemble: {0}")]
    InvalidEnsemble(String),

    #[error("insufficient history: need {needed} bars, have {available}")]
    InsufficientHistory { needed: usize, available: usize },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("report publishing failed: {0}")]
    Publish(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ForecastError {
    pub fn provider(provider: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.to_string(),
        }
    }

    /// Fatal errors stop the process instead of skipping an instrument or a cycle.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ModelLoad(_) | Self::Config(_))
    }
}

impl From<config::ConfigError> for ForecastError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
