//! Two-temperature ensemble sampling
//!
//! A moderate temperature gives a tight central estimate for directional
//! probability; a high temperature gives realistic dispersion for the
//! volatility comparison. Both calls share history and future axis.

use super::horizon::StepUnit;
use crate::error::{ForecastError, Result};
use crate::oracle::{ForecastOracle, ForecastRequest, SamplingParams};
use crate::types::{Ensemble, TimeSeries};
use chrono::{DateTime, Utc};
use std::time::Instant;
use tracing::{debug, info};

pub const MAIN_TEMPERATURE: f64 = 0.6;
pub const VOLATILITY_TEMPERATURE: f64 = 0.9;
pub const TOP_P: f64 = 0.9;

/// Ensembles for one instrument, all aligned to `axis`
#[derive(Debug, Clone)]
pub struct ForecastEnsembles {
    pub step_unit: StepUnit,
    pub axis: Vec<DateTime<Utc>>,
    pub main_close: Ensemble,
    pub main_volume: Ensemble,
    pub volatility_close: Ensemble,
}

impl ForecastEnsembles {
    pub fn horizon(&self) -> usize {
        self.axis.len()
    }
}

#[derive(Debug, Clone)]
pub struct EnsembleGenerator {
    main_temperature: f64,
    volatility_temperature: f64,
    top_p: f64,
}

impl Default for EnsembleGenerator {
    fn default() -> Self {
        Self {
            main_temperature: MAIN_TEMPERATURE,
            volatility_temperature: VOLATILITY_TEMPERATURE,
            top_p: TOP_P,
        }
    }
}

impl EnsembleGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample the main (close + volume) and volatility (close) ensembles
    pub async fn generate(
        &self,
        oracle: &dyn ForecastOracle,
        history: &TimeSeries,
        horizon: usize,
        sample_count: usize,
        interval: &str,
    ) -> Result<ForecastEnsembles> {
        if history.len() < 2 {
            return Err(ForecastError::InsufficientHistory {
                needed: 2,
                available: history.len(),
            });
        }
        if horizon == 0 || sample_count == 0 {
            return Err(ForecastError::InvalidInput(format!(
                "horizon ({}) and sample count ({}) must be positive",
                horizon, sample_count
            )));
        }

        let step_unit = StepUnit::from_interval(interval);
        let last = history
            .last_timestamp()
            .ok_or_else(|| ForecastError::InvalidInput("empty history".into()))?;
        let axis = step_unit.future_axis(last, horizon);

        let mut request = ForecastRequest {
            history: history.clone(),
            future_timestamps: axis.clone(),
            sampling: SamplingParams {
                temperature: self.main_temperature,
                top_p: self.top_p,
                sample_count,
            },
        };

        info!("Making main prediction (T={})...", self.main_temperature);
        let started = Instant::now();
        let main = oracle.predict(&request).await?;
        check_shape(&main.close, horizon, sample_count, "main close")?;
        check_shape(&main.volume, horizon, sample_count, "main volume")?;
        debug!("Main prediction completed in {:.2}s", started.elapsed().as_secs_f64());

        request.sampling.temperature = self.volatility_temperature;
        info!("Making volatility prediction (T={})...", self.volatility_temperature);
        let started = Instant::now();
        let volatility = oracle.predict(&request).await?;
        check_shape(&volatility.close, horizon, sample_count, "volatility close")?;
        debug!(
            "Volatility prediction completed in {:.2}s",
            started.elapsed().as_secs_f64()
        );

        Ok(ForecastEnsembles {
            step_unit,
            axis,
            main_close: main.close,
            main_volume: main.volume,
            volatility_close: volatility.close,
        })
    }
}

fn check_shape(ensemble: &Ensemble, horizon: usize, samples: usize, what: &str) -> Result<()> {
    if ensemble.horizon() != horizon || ensemble.sample_count() != samples {
        return Err(ForecastError::Oracle(format!(
            "{} ensemble is {}x{}, expected {}x{}",
            what,
            ensemble.sample_count(),
            ensemble.horizon(),
            samples,
            horizon
        )));
    }
    Ok(())
}
