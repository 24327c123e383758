//! Ensemble Forecaster
//!
//! Runs one forecast cycle, or keeps running them on a schedule.

use clap::Parser;
use ensemble_forecaster::{
    config::{Config, LoggingConfig},
    data::ProviderRegistry,
    error::ForecastError,
    pipeline::CycleOrchestrator,
    scheduler::Scheduler,
    telemetry,
};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "ensemble-forecaster")]
#[command(about = "Probabilistic price & volume forecasts from sampled model ensembles")]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Republish existing charts with placeholder probabilities (no model, no data fetch)
    #[arg(long)]
    mock: bool,

    /// Keep running cycles every `update_interval_minutes` until interrupted
    #[arg(long)]
    schedule: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            // logging is not configured yet; fall back to defaults to report the error
            let _guard = telemetry::init_logging(&LoggingConfig::default()).ok();
            tracing::error!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let _guard = match telemetry::init_logging(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(config, cli.mock, cli.schedule).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config, mock: bool, schedule: bool) -> anyhow::Result<ExitCode> {
    tracing::info!("Starting ensemble forecaster");
    if mock {
        tracing::warn!("Running in MOCK mode - no data fetches or model inference");
    }

    let providers = ProviderRegistry::with_defaults()?;
    providers.check_sources(&config)?;
    for (name, source) in &config.sources {
        tracing::info!(
            "Source {}: {} symbols @ {}",
            name,
            source.symbols.len(),
            source.interval
        );
    }

    let mut orchestrator = CycleOrchestrator::from_config(&config, providers, mock);

    if !schedule {
        return Ok(match orchestrator.run_cycle().await {
            Ok(report) => {
                tracing::info!("Forecast complete: {} instruments", report.len());
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::error!("Forecast failed: {}", e);
                ExitCode::FAILURE
            }
        });
    }

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Interrupt received, finishing current cycle");
                shutdown.cancel();
            }
            Err(e) => tracing::error!("Failed to listen for interrupt: {}", e),
        }
    });

    let scheduler = Scheduler::with_minutes(config.common.update_interval_minutes, cancel)?;
    match scheduler.run(&mut orchestrator).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e @ ForecastError::ModelLoad(_)) => {
            tracing::error!("Model could not be loaded, exiting: {}", e);
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e.into()),
    }
}
