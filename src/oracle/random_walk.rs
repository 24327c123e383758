//! In-process random-walk oracle
//!
//! Geometric random walk calibrated on the history's log returns. The
//! temperature scales dispersion relative to 0.6, so high-temperature
//! ensembles come out wider, as they would from a sampled sequence model.

use super::{ForecastOracle, ForecastRequest, PredictedPaths};
use crate::error::{ForecastError, Result};
use crate::forecast::metrics::{log_returns, sample_std};
use crate::types::Ensemble;
use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const REFERENCE_TEMPERATURE: f64 = 0.6;
const FALLBACK_SIGMA: f64 = 0.01;
const VOLUME_LOOKBACK: usize = 20;

pub struct RandomWalkOracle {
    rng: Mutex<StdRng>,
}

impl RandomWalkOracle {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomWalkOracle {
    fn default() -> Self {
        Self::new()
    }
}

/// Box-Muller standard normal draw
fn standard_normal(rng: &mut StdRng) -> f64 {
    let u1: f64 = 1.0 - rng.random::<f64>();
    let u2: f64 = rng.random::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

#[async_trait]
impl ForecastOracle for RandomWalkOracle {
    async fn predict(&self, request: &ForecastRequest) -> Result<PredictedPaths> {
        let closes = request.history.closes();
        let last_close = *closes
            .last()
            .ok_or_else(|| ForecastError::Oracle("empty history".into()))?;

        let returns = log_returns(&closes);
        let mu = if returns.is_empty() {
            0.0
        } else {
            returns.iter().sum::<f64>() / returns.len() as f64
        };
        let sigma = sample_std(&returns)
            .filter(|s| *s > 0.0)
            .unwrap_or(FALLBACK_SIGMA);
        let scale = request.sampling.temperature / REFERENCE_TEMPERATURE;

        let volumes = request.history.volumes();
        let recent = &volumes[volumes.len().saturating_sub(VOLUME_LOOKBACK)..];
        let base_volume = recent.iter().sum::<f64>() / recent.len().max(1) as f64;

        let horizon = request.horizon();
        let mut rng = self.rng.lock();
        let mut close_paths = Vec::with_capacity(request.sampling.sample_count);
        let mut volume_paths = Vec::with_capacity(request.sampling.sample_count);

        for _ in 0..request.sampling.sample_count {
            let mut price = last_close;
            let mut closes = Vec::with_capacity(horizon);
            let mut vols = Vec::with_capacity(horizon);
            for _ in 0..horizon {
                let z = standard_normal(&mut rng);
                price *= (mu + sigma * scale * z).exp();
                closes.push(price);
                vols.push(base_volume * (0.5 * scale * standard_normal(&mut rng)).exp());
            }
            close_paths.push(closes);
            volume_paths.push(vols);
        }

        Ok(PredictedPaths {
            close: Ensemble::new(close_paths).map_err(|e| ForecastError::Oracle(e.to_string()))?,
            volume: Ensemble::new(volume_paths).map_err(|e| ForecastError::Oracle(e.to_string()))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::SamplingParams;
    use crate::types::{Bar, TimeSeries};
    use chrono::{Duration, TimeZone, Utc};

    fn request(temperature: f64, samples: usize) -> ForecastRequest {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let bars = (0..50)
            .map(|i| {
                let close = 100.0 * (1.0 + 0.01 * ((i % 7) as f64 - 3.0));
                Bar {
                    timestamp: start + Duration::days(i),
                    open: close,
                    high: close * 1.01,
                    low: close * 0.99,
                    close,
                    volume: 1000.0,
                    amount: 1000.0 * close,
                }
            })
            .collect();
        ForecastRequest {
            history: TimeSeries::new(bars).unwrap(),
            future_timestamps: (1..=12).map(|d| start + Duration::days(49 + d)).collect(),
            sampling: SamplingParams {
                temperature,
                top_p: 0.9,
                sample_count: samples,
            },
        }
    }

    #[tokio::test]
    async fn test_shape_matches_request() {
        let oracle = RandomWalkOracle::with_seed(42);
        let paths = oracle.predict(&request(0.6, 8)).await.unwrap();
        assert_eq!(paths.close.sample_count(), 8);
        assert_eq!(paths.close.horizon(), 12);
        assert_eq!(paths.volume.sample_count(), 8);
        assert!(paths.close.paths().iter().flatten().all(|p| *p > 0.0));
    }

    #[tokio::test]
    async fn test_seeded_runs_are_reproducible() {
        let a = RandomWalkOracle::with_seed(7).predict(&request(0.6, 4)).await.unwrap();
        let b = RandomWalkOracle::with_seed(7).predict(&request(0.6, 4)).await.unwrap();
        assert_eq!(a.close, b.close);
    }

    #[tokio::test]
    async fn test_higher_temperature_widens_spread() {
        let spread = |paths: &PredictedPaths| {
            let finals = paths.close.final_values();
            let max = finals.iter().cloned().fold(f64::MIN, f64::max);
            let min = finals.iter().cloned().fold(f64::MAX, f64::min);
            max - min
        };
        let cool = RandomWalkOracle::with_seed(1).predict(&request(0.6, 200)).await.unwrap();
        let hot = RandomWalkOracle::with_seed(1).predict(&request(1.8, 200)).await.unwrap();
        assert!(spread(&hot) > spread(&cool));
    }
}
