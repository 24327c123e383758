//! Core data types shared by every stage of the forecast cycle

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One historical OHLCV observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// Traded notional (quote volume)
    pub amount: f64,
}

impl Bar {
    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ForecastError::InvalidSeries(format!(
                    "{} at {} must be positive, got {}",
                    name, self.timestamp, value
                )));
            }
        }
        for (name, value) in [("volume", self.volume), ("amount", self.amount)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ForecastError::InvalidSeries(format!(
                    "{} at {} must be non-negative, got {}",
                    name, self.timestamp, value
                )));
            }
        }
        Ok(())
    }
}

/// Ordered bar sequence with strictly increasing timestamps.
///
/// Spacing may be irregular. An empty series is representable so that
/// providers can report "no data" without an error; consumers check
/// length against their own preconditions.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimeSeries {
    bars: Vec<Bar>,
}

impl TimeSeries {
    pub fn new(bars: Vec<Bar>) -> Result<Self> {
        for bar in &bars {
            bar.validate()?;
        }
        if let Some(pair) = bars.windows(2).find(|w| w[1].timestamp <= w[0].timestamp) {
            return Err(ForecastError::InvalidSeries(format!(
                "timestamps not strictly increasing: {} followed by {}",
                pair[0].timestamp, pair[1].timestamp
            )));
        }
        Ok(Self { bars })
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.bars.last().map(|b| b.timestamp)
    }

    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().map(|b| b.close)
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume).collect()
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.bars.iter().map(|b| b.timestamp).collect()
    }

    /// Series with the most recent bar removed
    pub fn without_last(&self) -> TimeSeries {
        let end = self.bars.len().saturating_sub(1);
        TimeSeries {
            bars: self.bars[..end].to_vec(),
        }
    }

    /// The most recent `n` bars (or all of them if fewer)
    pub fn tail(&self, n: usize) -> TimeSeries {
        let start = self.bars.len().saturating_sub(n);
        TimeSeries {
            bars: self.bars[start..].to_vec(),
        }
    }
}

/// A fixed-size set of sampled future paths sharing one horizon.
///
/// Stored path-major: `paths[sample][step]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ensemble {
    paths: Vec<Vec<f64>>,
}

impl Ensemble {
    pub fn new(paths: Vec<Vec<f64>>) -> Result<Self> {
        let horizon = match paths.first() {
            Some(p) if !p.is_empty() => p.len(),
            Some(_) => return Err(ForecastError::InvalidEnsemble("empty path".into())),
            None => return Err(ForecastError::InvalidEnsemble("no paths".into())),
        };
        if let Some((i, p)) = paths.iter().enumerate().find(|(_, p)| p.len() != horizon) {
            return Err(ForecastError::InvalidEnsemble(format!(
                "path {} has length {}, expected {}",
                i,
                p.len(),
                horizon
            )));
        }
        if paths.iter().flatten().any(|v| !v.is_finite()) {
            return Err(ForecastError::InvalidEnsemble("non-finite value".into()));
        }
        Ok(Self { paths })
    }

    pub fn paths(&self) -> &[Vec<f64>] {
        &self.paths
    }

    pub fn sample_count(&self) -> usize {
        self.paths.len()
    }

    pub fn horizon(&self) -> usize {
        self.paths[0].len()
    }

    /// Terminal value of every path
    pub fn final_values(&self) -> Vec<f64> {
        self.paths.iter().filter_map(|p| p.last().copied()).collect()
    }

    /// Cross-sample mean at each step
    pub fn step_means(&self) -> Vec<f64> {
        let n = self.sample_count() as f64;
        (0..self.horizon())
            .map(|step| self.paths.iter().map(|p| p[step]).sum::<f64>() / n)
            .collect()
    }

    pub fn step_mins(&self) -> Vec<f64> {
        (0..self.horizon())
            .map(|step| self.paths.iter().map(|p| p[step]).fold(f64::INFINITY, f64::min))
            .collect()
    }

    pub fn step_maxs(&self) -> Vec<f64> {
        (0..self.horizon())
            .map(|step| {
                self.paths
                    .iter()
                    .map(|p| p[step])
                    .fold(f64::NEG_INFINITY, f64::max)
            })
            .collect()
    }
}

/// Per-instrument outcome of one successful pipeline pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    /// Fraction of main-ensemble paths ending above the last close
    pub upside_probability: f64,
    /// Fraction of high-temperature paths more volatile than recent history
    pub volatility_amplification_probability: f64,
    /// Rendered chart artifact
    pub chart: PathBuf,
}

/// Forecast results for one cycle keyed by instrument, in processing order
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub generated_at: DateTime<Utc>,
    entries: IndexMap<String, ForecastResult>,
}

impl CycleReport {
    pub fn new() -> Self {
        Self {
            generated_at: Utc::now(),
            entries: IndexMap::new(),
        }
    }

    pub fn insert(&mut self, instrument: impl Into<String>, result: ForecastResult) {
        self.entries.insert(instrument.into(), result);
    }

    pub fn get(&self, instrument: &str) -> Option<&ForecastResult> {
        self.entries.get(instrument)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ForecastResult)> {
        self.entries.iter()
    }

    pub fn instruments(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl Default for CycleReport {
    fn default() -> Self {
        Self::new()
    }
}
