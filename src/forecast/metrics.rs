//! Ensemble-to-probability reduction

use crate::error::{ForecastError, Result};
use crate::types::{Ensemble, TimeSeries};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastMetrics {
    /// P(final predicted close > last close)
    pub upside_probability: f64,
    /// P(predicted path volatility > trailing historical volatility)
    pub volatility_amplification_probability: f64,
    /// `None` when fewer than two returns are available
    pub historical_volatility: Option<f64>,
}

/// `ln(x[t] / x[t-1])` for consecutive pairs
pub fn log_returns(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| (w[1] / w[0]).ln()).collect()
}

/// Sample standard deviation (n - 1 denominator); `None` below two values
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(var.sqrt())
}

/// Deviation of the most recent `window` close-to-close log returns
pub fn historical_volatility(series: &TimeSeries, window: usize) -> Option<f64> {
    let returns = log_returns(&series.closes());
    let start = returns.len().saturating_sub(window);
    sample_std(&returns[start..])
}

/// Fraction of paths whose terminal value strictly exceeds `last_close`
pub fn upside_probability(last_close: f64, main_close: &Ensemble) -> f64 {
    let finals = main_close.final_values();
    let above = finals.iter().filter(|v| **v > last_close).count();
    above as f64 / finals.len() as f64
}

/// Volatility of one path measured from `last_close` through its end.
///
/// `None` if the path has a non-positive value or yields fewer than two
/// returns.
pub fn path_volatility(last_close: f64, path: &[f64]) -> Option<f64> {
    if path.iter().any(|v| *v <= 0.0) {
        return None;
    }
    let mut sequence = Vec::with_capacity(path.len() + 1);
    sequence.push(last_close);
    sequence.extend_from_slice(path);
    sample_std(&log_returns(&sequence)).filter(|v| v.is_finite())
}

/// Fraction of paths whose volatility exceeds the historical baseline.
///
/// With a zero or undefined baseline every path with nonzero predicted
/// volatility counts as amplified.
pub fn volatility_amplification_probability(
    last_close: f64,
    historical_vol: Option<f64>,
    volatility_close: &Ensemble,
) -> f64 {
    let baseline = historical_vol.filter(|v| v.is_finite() && *v > 0.0);
    let amplified = volatility_close
        .paths()
        .iter()
        .filter_map(|path| path_volatility(last_close, path))
        .filter(|predicted| match baseline {
            Some(hist) => *predicted > hist,
            None => *predicted > 0.0,
        })
        .count();
    amplified as f64 / volatility_close.sample_count() as f64
}

/// Reduce the ensembles to the two published probabilities.
///
/// `trailing` must hold at least `vol_window + 1` bars; its last close is
/// the reference price.
pub fn compute_metrics(
    trailing: &TimeSeries,
    main_close: &Ensemble,
    volatility_close: &Ensemble,
    vol_window: usize,
) -> Result<ForecastMetrics> {
    if trailing.len() < vol_window + 1 {
        return Err(ForecastError::InsufficientHistory {
            needed: vol_window + 1,
            available: trailing.len(),
        });
    }
    if main_close.horizon() != volatility_close.horizon() {
        return Err(ForecastError::InvalidEnsemble(format!(
            "horizon mismatch: main {} vs volatility {}",
            main_close.horizon(),
            volatility_close.horizon()
        )));
    }
    let last_close = trailing
        .last_close()
        .ok_or_else(|| ForecastError::InvalidInput("empty trailing history".into()))?;

    let historical = historical_volatility(trailing, vol_window);
    let upside = upside_probability(last_close, main_close);
    let amplification = volatility_amplification_probability(last_close, historical, volatility_close);

    Ok(ForecastMetrics {
        upside_probability: upside,
        volatility_amplification_probability: amplification,
        historical_volatility: historical,
    })
}
