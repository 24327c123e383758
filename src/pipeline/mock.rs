//! Placeholder reports built from charts already on disk

use crate::error::Result;
use crate::types::{CycleReport, ForecastResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const PLACEHOLDER_PROBABILITY: f64 = 0.5;

const CHART_EXTENSIONS: [&str; 2] = ["svg", "png"];

/// List chart artifacts in `chart_dir`, sorted by file name
pub async fn chart_artifacts(chart_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = match tokio::fs::read_dir(chart_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("Chart directory {} does not exist", chart_dir.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    let mut charts = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_chart = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| CHART_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if is_chart && entry.file_type().await?.is_file() {
            charts.push(path);
        }
    }
    charts.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(charts)
}

/// Report with fixed probabilities for every chart found; the file stem is
/// the instrument id
pub async fn placeholder_report(chart_dir: &Path) -> Result<CycleReport> {
    let mut report = CycleReport::new();
    for chart in chart_artifacts(chart_dir).await? {
        let Some(instrument) = chart.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
            continue;
        };
        info!("Mock forecast for {} using {}", instrument, chart.display());
        report.insert(
            instrument,
            ForecastResult {
                upside_probability: PLACEHOLDER_PROBABILITY,
                volatility_amplification_probability: PLACEHOLDER_PROBABILITY,
                chart,
            },
        );
    }
    Ok(report)
}
