//! Cycle orchestration

use super::{mock, CycleRunner};
use crate::chart::{artifact_stem, ChartRenderer, SvgChartRenderer};
use crate::config::{CommonConfig, Config, SourceConfig};
use crate::data::{DataProvider, ProviderRegistry};
use crate::error::{ForecastError, Result};
use crate::forecast::{compute_metrics, EnsembleGenerator};
use crate::oracle::{BackendLoader, ForecastOracle, OracleSlot};
use crate::report::{HtmlReportPublisher, ReportPublisher};
use crate::types::{CycleReport, ForecastResult};
use async_trait::async_trait;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// What a cycle does
#[derive(Debug, Clone, PartialEq)]
pub enum RunMode {
    /// Fetch, forecast, render and publish every configured instrument
    Inference,
    /// Republish charts already in `chart_dir` with placeholder probabilities
    Mock { chart_dir: PathBuf },
}

impl RunMode {
    fn label(&self) -> &'static str {
        match self {
            RunMode::Inference => "inference",
            RunMode::Mock { .. } => "mock",
        }
    }
}

/// Pipeline stage an instrument failed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Fetch,
    Forecast,
    Metrics,
    Render,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Fetch => "fetch",
            Stage::Forecast => "forecast",
            Stage::Metrics => "metrics",
            Stage::Render => "render",
        };
        f.write_str(name)
    }
}

struct InstrumentFailure {
    stage: Stage,
    error: ForecastError,
}

fn at<T>(stage: Stage, result: Result<T>) -> std::result::Result<T, InstrumentFailure> {
    result.map_err(|error| InstrumentFailure { stage, error })
}

pub struct CycleOrchestrator {
    settings: CommonConfig,
    sources: IndexMap<String, SourceConfig>,
    providers: ProviderRegistry,
    oracle: OracleSlot,
    generator: EnsembleGenerator,
    renderer: Arc<dyn ChartRenderer>,
    publisher: Arc<dyn ReportPublisher>,
    mode: RunMode,
}

impl CycleOrchestrator {
    pub fn new(
        settings: CommonConfig,
        sources: IndexMap<String, SourceConfig>,
        providers: ProviderRegistry,
        oracle: OracleSlot,
        renderer: Arc<dyn ChartRenderer>,
        publisher: Arc<dyn ReportPublisher>,
        mode: RunMode,
    ) -> Self {
        Self {
            settings,
            sources,
            providers,
            oracle,
            generator: EnsembleGenerator::new(),
            renderer,
            publisher,
            mode,
        }
    }

    /// Wire the built-in backend loader, SVG renderer and HTML publisher
    pub fn from_config(config: &Config, providers: ProviderRegistry, mock: bool) -> Self {
        let chart_dir = config.output.chart_dir();
        let mode = if mock {
            RunMode::Mock {
                chart_dir: chart_dir.clone(),
            }
        } else {
            RunMode::Inference
        };
        Self::new(
            config.common.clone(),
            config.sources.clone(),
            providers,
            OracleSlot::new(Arc::new(BackendLoader::new(config.model.clone()))),
            Arc::new(SvgChartRenderer::new(chart_dir)),
            Arc::new(HtmlReportPublisher::new(config.output.resolved_dir())),
            mode,
        )
    }

    pub fn mode(&self) -> &RunMode {
        &self.mode
    }

    pub fn oracle(&self) -> &OracleSlot {
        &self.oracle
    }

    /// Run one cycle and publish its report.
    ///
    /// Fails with [`ForecastError::EmptyReport`] when no instrument
    /// succeeded; nothing is published in that case.
    pub async fn run_cycle(&mut self) -> Result<CycleReport> {
        let cycle_id = Uuid::new_v4();
        let span = info_span!("cycle", id = %cycle_id, mode = self.mode.label());
        self.run_cycle_inner(cycle_id).instrument(span).await
    }

    async fn run_cycle_inner(&mut self, cycle_id: Uuid) -> Result<CycleReport> {
        let started = Instant::now();
        info!("===== Forecast cycle {} started ({}) =====", cycle_id, self.mode.label());

        let report = match self.mode.clone() {
            RunMode::Inference => self.forecast_all().await?,
            RunMode::Mock { chart_dir } => mock::placeholder_report(&chart_dir).await?,
        };

        if report.is_empty() {
            warn!("No instrument produced a forecast; nothing to publish");
            return Err(ForecastError::EmptyReport);
        }

        let published = self.publisher.publish(&report).await?;
        info!(
            "===== Forecast cycle {} finished: {} instruments in {:.1}s, report at {} =====",
            cycle_id,
            report.len(),
            started.elapsed().as_secs_f64(),
            published.display()
        );
        Ok(report)
    }

    async fn forecast_all(&mut self) -> Result<CycleReport> {
        let oracle = self.oracle.get_or_load().await?;
        let mut report = CycleReport::new();
        // chart file stem -> instrument that owns it this cycle
        let mut chart_owners: HashMap<String, String> = HashMap::new();

        for (provider_name, source) in &self.sources {
            let Some(provider) = self.providers.get(provider_name) else {
                warn!(provider = %provider_name, stage = "fetch", "Provider not registered, skipping source");
                continue;
            };

            for symbol in &source.symbols {
                let stem = artifact_stem(symbol);
                match chart_owners.get(&stem) {
                    Some(owner) if owner != symbol => {
                        warn!(
                            provider = %provider_name,
                            symbol = %symbol,
                            stage = "render",
                            "Skipping instrument: chart name {} already used by {}",
                            stem,
                            owner
                        );
                        continue;
                    }
                    Some(_) => {}
                    None => {
                        chart_owners.insert(stem, symbol.clone());
                    }
                }

                let span = info_span!(
                    "instrument",
                    provider = %provider_name,
                    symbol = %symbol,
                    interval = %source.interval
                );
                let outcome = self
                    .forecast_one(
                        oracle.as_ref(),
                        provider_name,
                        provider.as_ref(),
                        symbol,
                        &source.interval,
                    )
                    .instrument(span)
                    .await;

                match outcome {
                    Ok(result) => {
                        info!(
                            "{}: upside {:.1}%, volatility amplification {:.1}%",
                            symbol,
                            result.upside_probability * 100.0,
                            result.volatility_amplification_probability * 100.0
                        );
                        report.insert(symbol.clone(), result);
                    }
                    Err(failure) if failure.error.is_fatal() => return Err(failure.error),
                    Err(failure) => {
                        warn!(
                            provider = %provider_name,
                            symbol = %symbol,
                            stage = %failure.stage,
                            "Skipping instrument: {}",
                            failure.error
                        );
                    }
                }
            }
        }

        Ok(report)
    }

    async fn forecast_one(
        &self,
        oracle: &dyn ForecastOracle,
        provider_name: &str,
        provider: &dyn DataProvider,
        symbol: &str,
        interval: &str,
    ) -> std::result::Result<ForecastResult, InstrumentFailure> {
        let limit = self.settings.fetch_limit();
        info!("Fetching {} bars of {} ({})", limit, symbol, interval);
        let series = at(Stage::Fetch, provider.fetch(symbol, interval, limit).await)?;
        if series.is_empty() {
            return Err(InstrumentFailure {
                stage: Stage::Fetch,
                error: ForecastError::provider(provider_name, format!("no bars returned for {}", symbol)),
            });
        }

        // the newest bar may still be forming
        let history = series.without_last();

        let ensembles = at(
            Stage::Forecast,
            self.generator
                .generate(
                    oracle,
                    &history,
                    self.settings.pred_horizon,
                    self.settings.n_predictions,
                    interval,
                )
                .await,
        )?;

        let window = self.settings.vol_window.min(history.len().saturating_sub(1));
        if window < self.settings.vol_window {
            debug!(
                "Volatility window truncated to {} returns ({} bars available)",
                window,
                history.len()
            );
        }
        let trailing = history.tail(window + 1);
        let metrics = at(
            Stage::Metrics,
            compute_metrics(&trailing, &ensembles.main_close, &ensembles.volatility_close, window),
        )?;

        let display = history.tail(self.settings.hist_points);
        let chart = at(
            Stage::Render,
            self.renderer.render(&display, &ensembles, symbol, interval).await,
        )?;

        Ok(ForecastResult {
            upside_probability: metrics.upside_probability,
            volatility_amplification_probability: metrics.volatility_amplification_probability,
            chart,
        })
    }
}

#[async_trait]
impl CycleRunner for CycleOrchestrator {
    async fn run_forecast(&mut self) -> Result<bool> {
        match self.run_cycle().await {
            Ok(_) => Ok(true),
            Err(e) if e.is_fatal() => {
                error!("Fatal error: {}", e);
                Err(e)
            }
            Err(e) => {
                error!("Forecast cycle failed: {}", e);
                Ok(false)
            }
        }
    }
}
