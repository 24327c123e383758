//! Report publishing
//!
//! A cycle report becomes a static page plus a machine-readable JSON
//! snapshot in the output directory.

use crate::error::{ForecastError, Result};
use crate::types::CycleReport;
use async_trait::async_trait;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tracing::info;

pub const INDEX_FILE: &str = "index.html";
pub const JSON_FILE: &str = "forecasts.json";

/// Publishes a complete cycle report
#[async_trait]
pub trait ReportPublisher: Send + Sync {
    /// Returns the path of the primary artifact
    async fn publish(&self, report: &CycleReport) -> Result<PathBuf>;
}

pub struct HtmlReportPublisher {
    output_dir: PathBuf,
}

impl HtmlReportPublisher {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Chart link as seen from the page: relative when under the output dir
    fn chart_href(&self, chart: &Path) -> String {
        match chart.strip_prefix(&self.output_dir) {
            Ok(rel) => rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/"),
            Err(_) => chart.display().to_string(),
        }
    }

    pub(crate) fn render_html(&self, report: &CycleReport) -> String {
        let updated = report.generated_at.format("%Y-%m-%d %H:%M:%S");

        let mut rows = String::new();
        for (instrument, result) in report.iter() {
            let name = escape(instrument);
            let href = escape(&self.chart_href(&result.chart));
            let _ = write!(
                rows,
                r#"
      <section class="forecast">
        <h2>{name}</h2>
        <table>
          <tr><th>Upside probability</th><td>{upside}</td></tr>
          <tr><th>Volatility amplification probability</th><td>{amp}</td></tr>
        </table>
        <a href="{href}"><img src="{href}" alt="{name} forecast chart"></a>
      </section>"#,
                name = name,
                upside = percent(result.upside_probability),
                amp = percent(result.volatility_amplification_probability),
                href = href,
            );
        }

        format!(
            r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8">
    <title>Probabilistic Forecasts</title>
    <style>
      body {{ font-family: sans-serif; margin: 2rem; }}
      .forecast img {{ max-width: 100%; }}
      th {{ text-align: left; padding-right: 1rem; }}
    </style>
  </head>
  <body>
    <h1>Probabilistic Forecasts</h1>
    <p>Last updated: {updated} UTC</p>{rows}
  </body>
</html>
"#,
            updated = updated,
            rows = rows,
        )
    }
}

#[async_trait]
impl ReportPublisher for HtmlReportPublisher {
    /// Both files are staged under temporary names and renamed into place,
    /// JSON first; a failure leaves the previously published page untouched.
    async fn publish(&self, report: &CycleReport) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| ForecastError::Publish(format!("{}: {}", self.output_dir.display(), e)))?;

        let json = serde_json::to_string_pretty(report)?;
        let html = self.render_html(report);

        let snapshot = self.output_dir.join(JSON_FILE);
        let index = self.output_dir.join(INDEX_FILE);
        let staged_snapshot = staging_path(&snapshot);
        let staged_index = staging_path(&index);

        let result = async {
            write_file(&staged_snapshot, json.as_bytes()).await?;
            write_file(&staged_index, html.as_bytes()).await?;
            rename_file(&staged_snapshot, &snapshot).await?;
            rename_file(&staged_index, &index).await
        }
        .await;

        if let Err(e) = result {
            for staged in [&staged_snapshot, &staged_index] {
                let _ = tokio::fs::remove_file(staged).await;
            }
            return Err(e);
        }

        info!("Report published to {} ({} instruments)", index.display(), report.len());
        Ok(index)
    }
}

fn staging_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{}.tmp", name))
}

async fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| ForecastError::Publish(format!("{}: {}", path.display(), e)))
}

async fn rename_file(from: &Path, to: &Path) -> Result<()> {
    tokio::fs::rename(from, to)
        .await
        .map_err(|e| ForecastError::Publish(format!("{}: {}", to.display(), e)))
}

/// 0.6 -> "60.0%"
fn percent(p: f64) -> String {
    format!("{:.1}%", p * 100.0)
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
