//! Remote inference service backend
//!
//! Protocol:
//! - `POST {endpoint}/v1/models/load` with model/tokenizer ids, device and
//!   context length; any 2xx means the model is resident.
//! - `POST {endpoint}/v1/predict` with history, future timestamps and
//!   sampling parameters; returns `close` and `volume` as `[sample][step]`.

use super::{ForecastOracle, ForecastRequest, PredictedPaths};
use crate::config::ModelConfig;
use crate::error::{ForecastError, Result};
use crate::types::{Bar, Ensemble};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub struct HttpOracle {
    http: Client,
    endpoint: String,
    max_context: usize,
}

#[derive(Debug, Serialize)]
struct LoadBody<'a> {
    model_id: &'a str,
    tokenizer_id: &'a str,
    device: &'a str,
    max_context: usize,
}

#[derive(Debug, Serialize)]
pub(crate) struct PredictBody<'a> {
    pub history: &'a [Bar],
    pub future_timestamps: &'a [DateTime<Utc>],
    pub pred_len: usize,
    pub temperature: f64,
    pub top_p: f64,
    pub sample_count: usize,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PredictResponse {
    pub close: Vec<Vec<f64>>,
    pub volume: Vec<Vec<f64>>,
}

impl HttpOracle {
    /// Ask the service to load the configured model
    pub async fn connect(model: &ModelConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(model.timeout_secs))
            .build()
            .map_err(|e| ForecastError::ModelLoad(e.to_string()))?;
        let endpoint = model.endpoint.trim_end_matches('/').to_string();

        let body = LoadBody {
            model_id: model.size.model_id(),
            tokenizer_id: model.size.tokenizer_id(),
            device: &model.device,
            max_context: model.max_context(),
        };
        let resp = http
            .post(format!("{}/v1/models/load", endpoint))
            .json(&body)
            .send()
            .await
            .map_err(|e| ForecastError::ModelLoad(format!("{}: {}", endpoint, e)))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ForecastError::ModelLoad(format!("status {}: {}", status, text)));
        }

        Ok(Self {
            http,
            endpoint,
            max_context: model.max_context(),
        })
    }

    pub(crate) fn body<'a>(&self, request: &'a ForecastRequest) -> PredictBody<'a> {
        let bars = request.history.bars();
        let start = bars.len().saturating_sub(self.max_context);
        PredictBody {
            history: &bars[start..],
            future_timestamps: &request.future_timestamps,
            pred_len: request.horizon(),
            temperature: request.sampling.temperature,
            top_p: request.sampling.top_p,
            sample_count: request.sampling.sample_count,
        }
    }
}

#[async_trait]
impl ForecastOracle for HttpOracle {
    async fn predict(&self, request: &ForecastRequest) -> Result<PredictedPaths> {
        let resp = self
            .http
            .post(format!("{}/v1/predict", self.endpoint))
            .json(&self.body(request))
            .send()
            .await
            .map_err(|e| ForecastError::Oracle(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ForecastError::Oracle(format!("status {}: {}", status, text)));
        }

        let parsed: PredictResponse = resp
            .json()
            .await
            .map_err(|e| ForecastError::Oracle(format!("bad response: {}", e)))?;
        into_paths(parsed)
    }
}

pub(crate) fn into_paths(resp: PredictResponse) -> Result<PredictedPaths> {
    let close = Ensemble::new(resp.close).map_err(|e| ForecastError::Oracle(e.to_string()))?;
    let volume = Ensemble::new(resp.volume).map_err(|e| ForecastError::Oracle(e.to_string()))?;
    Ok(PredictedPaths { close, volume })
}
