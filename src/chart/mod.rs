//! Forecast charts

pub mod svg;

pub use svg::SvgChartRenderer;

use crate::error::Result;
use crate::forecast::ForecastEnsembles;
use crate::types::TimeSeries;
use async_trait::async_trait;
use std::path::PathBuf;

/// Draws history plus the main close/volume ensembles to an image file
#[async_trait]
pub trait ChartRenderer: Send + Sync {
    /// Returns the path of the written artifact
    async fn render(
        &self,
        history: &TimeSeries,
        ensembles: &ForecastEnsembles,
        symbol: &str,
        interval: &str,
    ) -> Result<PathBuf>;
}

/// Replace anything outside `[A-Za-z0-9._-]` so a symbol is a safe file stem.
///
/// Distinct symbols can map to the same stem (`ETH/USD`, `ETH_USD`); the
/// orchestrator keeps the first and skips the rest within a cycle. Mock
/// mode reads instrument ids back from stems, so it reports the sanitized
/// form.
pub fn artifact_stem(symbol: &str) -> String {
    symbol
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
