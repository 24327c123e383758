//! Ensemble Forecaster
//!
//! Samples stochastic price/volume paths from a forecasting model and
//! reduces them to two probabilities per instrument, published as a static
//! report on a fixed schedule.
//!
//! ## Architecture
//!
//! ```text
//! DataProvider → EnsembleGenerator (T=0.6, T=0.9) → Metrics → ChartRenderer
//!                         ↑                                        ↓
//!                   ForecastOracle                CycleReport → ReportPublisher
//!
//! Scheduler → CycleOrchestrator (one cycle per tick)
//! ```

pub mod chart;
pub mod config;
pub mod data;
pub mod error;
pub mod forecast;
pub mod oracle;
pub mod pipeline;
pub mod report;
pub mod scheduler;
pub mod telemetry;
pub mod types;

#[cfg(test)]
mod config_tests;
#[cfg(test)]
mod error_tests;
