//! SVG chart output
//!
//! Two stacked panels sharing a time axis: price (history, mean forecast,
//! min-max band) above volume (history and mean forecast bars).

use super::{artifact_stem, ChartRenderer};
use crate::error::{ForecastError, Result};
use crate::forecast::{ForecastEnsembles, StepUnit};
use crate::types::TimeSeries;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tracing::info;

const WIDTH: f64 = 1500.0;
const HEIGHT: f64 = 1000.0;
const MARGIN_LEFT: f64 = 90.0;
const MARGIN_RIGHT: f64 = 30.0;
const TITLE_HEIGHT: f64 = 60.0;
const PANEL_GAP: f64 = 40.0;
const AXIS_HEIGHT: f64 = 60.0;
const X_TICKS: usize = 6;

pub struct SvgChartRenderer {
    chart_dir: PathBuf,
}

impl SvgChartRenderer {
    pub fn new(chart_dir: impl Into<PathBuf>) -> Self {
        Self {
            chart_dir: chart_dir.into(),
        }
    }

    pub fn chart_dir(&self) -> &Path {
        &self.chart_dir
    }
}

#[async_trait]
impl ChartRenderer for SvgChartRenderer {
    async fn render(
        &self,
        history: &TimeSeries,
        ensembles: &ForecastEnsembles,
        symbol: &str,
        _interval: &str,
    ) -> Result<PathBuf> {
        info!("Generating forecast chart for {}...", symbol);
        let document = draw(history, ensembles, symbol)?;

        tokio::fs::create_dir_all(&self.chart_dir)
            .await
            .map_err(|e| ForecastError::Renderer(format!("{}: {}", self.chart_dir.display(), e)))?;
        let path = self.chart_dir.join(format!("{}.svg", artifact_stem(symbol)));
        tokio::fs::write(&path, document)
            .await
            .map_err(|e| ForecastError::Renderer(format!("{}: {}", path.display(), e)))?;

        info!("Chart saved to: {}", path.display());
        Ok(path)
    }
}

/// Linear map from a data range onto a pixel range
#[derive(Clone, Copy)]
struct Scale {
    d0: f64,
    d1: f64,
    p0: f64,
    p1: f64,
}

impl Scale {
    fn new(d0: f64, d1: f64, p0: f64, p1: f64) -> Self {
        // a degenerate domain maps to the middle of the range
        let (d0, d1) = if (d1 - d0).abs() < f64::EPSILON {
            (d0 - 1.0, d1 + 1.0)
        } else {
            (d0, d1)
        };
        Self { d0, d1, p0, p1 }
    }

    fn map(&self, v: f64) -> f64 {
        self.p0 + (v - self.d0) / (self.d1 - self.d0) * (self.p1 - self.p0)
    }
}

fn secs(t: &DateTime<Utc>) -> f64 {
    t.timestamp() as f64
}

fn points(xs: &[f64], ys: &[f64], x: Scale, y: Scale) -> String {
    xs.iter()
        .zip(ys)
        .map(|(a, b)| format!("{:.1},{:.1}", x.map(*a), y.map(*b)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub(crate) fn draw(history: &TimeSeries, ensembles: &ForecastEnsembles, symbol: &str) -> Result<String> {
    let first = history
        .bars()
        .first()
        .ok_or_else(|| ForecastError::Renderer("empty history".into()))?;
    let last_hist = history
        .last_timestamp()
        .ok_or_else(|| ForecastError::Renderer("empty history".into()))?;
    let last_pred = ensembles
        .axis
        .last()
        .ok_or_else(|| ForecastError::Renderer("empty forecast axis".into()))?;

    let hist_x: Vec<f64> = history.bars().iter().map(|b| secs(&b.timestamp)).collect();
    let pred_x: Vec<f64> = ensembles.axis.iter().map(secs).collect();
    let closes = history.closes();
    let volumes = history.volumes();
    let mean = ensembles.main_close.step_means();
    let lo = ensembles.main_close.step_mins();
    let hi = ensembles.main_close.step_maxs();
    let mean_volume = ensembles.main_volume.step_means();

    let plot_left = MARGIN_LEFT;
    let plot_right = WIDTH - MARGIN_RIGHT;
    let plot_height = HEIGHT - TITLE_HEIGHT - PANEL_GAP - AXIS_HEIGHT;
    let price_top = TITLE_HEIGHT;
    let price_bottom = price_top + plot_height * 0.75;
    let volume_top = price_bottom + PANEL_GAP;
    let volume_bottom = volume_top + plot_height * 0.25;

    let x = Scale::new(secs(&first.timestamp), secs(last_pred), plot_left, plot_right);

    let price_min = closes.iter().chain(&lo).cloned().fold(f64::INFINITY, f64::min);
    let price_max = closes.iter().chain(&hi).cloned().fold(f64::NEG_INFINITY, f64::max);
    let pad = (price_max - price_min) * 0.05;
    let y_price = Scale::new(price_min - pad, price_max + pad, price_bottom, price_top);

    let volume_max = volumes.iter().chain(&mean_volume).cloned().fold(0.0, f64::max);
    let y_volume = Scale::new(0.0, volume_max * 1.05, volume_bottom, volume_top);

    let total_points = (hist_x.len() + pred_x.len()) as f64;
    let bar_width = ((plot_right - plot_left) / total_points * 0.8).max(1.0);

    let horizon_unit = ensembles.step_unit.title();
    let title = format!(
        "{} Probabilistic Price &amp; Volume Forecast (Next {} {})",
        escape(symbol),
        ensembles.horizon(),
        horizon_unit
    );

    // write! into a String cannot fail
    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif">"#,
        w = WIDTH,
        h = HEIGHT
    );
    let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);
    let _ = writeln!(
        svg,
        r#"<text x="{:.1}" y="38" font-size="24" font-weight="bold" text-anchor="middle">{}</text>"#,
        WIDTH / 2.0,
        title
    );

    for (top, bottom) in [(price_top, price_bottom), (volume_top, volume_bottom)] {
        let _ = writeln!(
            svg,
            r##"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="none" stroke="#bbbbbb"/>"##,
            plot_left,
            top,
            plot_right - plot_left,
            bottom - top
        );
    }

    // price panel
    let mut band = points(&pred_x, &hi, x, y_price);
    let lo_rev: Vec<f64> = lo.iter().rev().cloned().collect();
    let x_rev: Vec<f64> = pred_x.iter().rev().cloned().collect();
    band.push(' ');
    band.push_str(&points(&x_rev, &lo_rev, x, y_price));
    let _ = writeln!(
        svg,
        r#"<polygon points="{}" fill="darkorange" fill-opacity="0.2" stroke="none"/>"#,
        band
    );
    let _ = writeln!(
        svg,
        r#"<polyline points="{}" fill="none" stroke="royalblue" stroke-width="1.5"/>"#,
        points(&hist_x, &closes, x, y_price)
    );
    let _ = writeln!(
        svg,
        r#"<polyline points="{}" fill="none" stroke="darkorange" stroke-width="1.5"/>"#,
        points(&pred_x, &mean, x, y_price)
    );
    for (value, label) in [(price_max, price_max), (price_min, price_min)] {
        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" font-size="12" text-anchor="end">{:.2}</text>"#,
            plot_left - 6.0,
            y_price.map(value) + 4.0,
            label
        );
    }
    let _ = writeln!(
        svg,
        r#"<text x="20" y="{:.1}" font-size="14" transform="rotate(-90 20 {:.1})" text-anchor="middle">Price</text>"#,
        (price_top + price_bottom) / 2.0,
        (price_top + price_bottom) / 2.0
    );

    // volume panel
    for (vx, vy, color) in hist_x
        .iter()
        .zip(&volumes)
        .map(|(a, b)| (a, b, "skyblue"))
        .chain(pred_x.iter().zip(&mean_volume).map(|(a, b)| (a, b, "sandybrown")))
    {
        let top = y_volume.map(*vy);
        let _ = writeln!(
            svg,
            r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}"/>"#,
            x.map(*vx) - bar_width / 2.0,
            top,
            bar_width,
            (volume_bottom - top).max(0.0),
            color
        );
    }
    let _ = writeln!(
        svg,
        r#"<text x="20" y="{:.1}" font-size="14" transform="rotate(-90 20 {:.1})" text-anchor="middle">Volume</text>"#,
        (volume_top + volume_bottom) / 2.0,
        (volume_top + volume_bottom) / 2.0
    );

    // history/forecast boundary
    let boundary = secs(&last_hist) + ensembles.step_unit.duration().num_seconds() as f64 / 2.0;
    let bx = x.map(boundary);
    let _ = writeln!(
        svg,
        r#"<line x1="{bx:.1}" y1="{:.1}" x2="{bx:.1}" y2="{:.1}" stroke="red" stroke-width="1.5" stroke-dasharray="6,4"/>"#,
        price_top,
        volume_bottom,
        bx = bx
    );

    // time axis
    let format = match ensembles.step_unit {
        StepUnit::Day => "%Y-%m-%d",
        _ => "%m-%d %H:%M",
    };
    let span = last_pred.signed_duration_since(first.timestamp);
    for i in 0..X_TICKS {
        let t = first.timestamp + span * i as i32 / (X_TICKS as i32 - 1);
        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" font-size="12" text-anchor="middle">{}</text>"#,
            x.map(secs(&t)),
            volume_bottom + 20.0,
            t.format(format)
        );
    }
    let _ = writeln!(
        svg,
        r#"<text x="{:.1}" y="{:.1}" font-size="14" text-anchor="middle">Time (UTC)</text>"#,
        (plot_left + plot_right) / 2.0,
        volume_bottom + 45.0
    );

    // legend
    let legend = [
        ("royalblue", "Historical Price"),
        ("darkorange", "Mean Forecast"),
        ("sandybrown", "Mean Forecasted Volume"),
    ];
    for (i, (color, label)) in legend.iter().enumerate() {
        let ly = price_top + 20.0 + i as f64 * 20.0;
        let _ = writeln!(
            svg,
            r#"<rect x="{:.1}" y="{:.1}" width="14" height="10" fill="{}"/><text x="{:.1}" y="{:.1}" font-size="12">{}</text>"#,
            plot_left + 12.0,
            ly - 9.0,
            color,
            plot_left + 32.0,
            ly,
            label
        );
    }

    svg.push_str("</svg>\n");
    Ok(svg)
}
