//! Forecasting oracle
//!
//! The sequence model is treated as an opaque stochastic function: given a
//! history window, a future timestamp axis and sampling parameters it
//! returns an ensemble of predicted close and volume paths. Any backend
//! that honours [`ForecastOracle`] can drive the pipeline.

pub mod http;
pub mod random_walk;
pub mod slot;

pub use http::HttpOracle;
pub use random_walk::RandomWalkOracle;
pub use slot::{OracleSlot, OracleState};

use crate::config::{ModelConfig, OracleBackend};
use crate::error::Result;
use crate::types::{Ensemble, TimeSeries};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Sampling controls for one oracle call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    /// Stochastic temperature; higher spreads paths further apart
    pub temperature: f64,
    /// Nucleus (top-p) probability mass
    pub top_p: f64,
    /// Paths to sample
    pub sample_count: usize,
}

/// Inputs for one oracle call
#[derive(Debug, Clone)]
pub struct ForecastRequest {
    pub history: TimeSeries,
    pub future_timestamps: Vec<DateTime<Utc>>,
    pub sampling: SamplingParams,
}

impl ForecastRequest {
    pub fn horizon(&self) -> usize {
        self.future_timestamps.len()
    }
}

/// Jointly sampled close and volume paths (same draws)
#[derive(Debug, Clone)]
pub struct PredictedPaths {
    pub close: Ensemble,
    pub volume: Ensemble,
}

/// A loaded forecasting model
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ForecastOracle: Send + Sync {
    async fn predict(&self, request: &ForecastRequest) -> Result<PredictedPaths>;
}

/// Produces the oracle on first use
#[async_trait]
pub trait OracleLoader: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn ForecastOracle>>;
}

/// Builds the backend selected by `[model].backend`
pub struct BackendLoader {
    model: ModelConfig,
}

impl BackendLoader {
    pub fn new(model: ModelConfig) -> Self {
        Self { model }
    }
}

#[async_trait]
impl OracleLoader for BackendLoader {
    async fn load(&self) -> Result<Arc<dyn ForecastOracle>> {
        tracing::info!(
            "Loading forecasting model (size={}, device={}, backend={:?})...",
            self.model.size,
            self.model.device,
            self.model.backend
        );
        let oracle: Arc<dyn ForecastOracle> = match self.model.backend {
            OracleBackend::Http => Arc::new(HttpOracle::connect(&self.model).await?),
            OracleBackend::RandomWalk => Arc::new(match self.model.seed {
                Some(seed) => RandomWalkOracle::with_seed(seed),
                None => RandomWalkOracle::new(),
            }),
        };
        tracing::info!("Model loaded successfully");
        Ok(oracle)
    }
}
