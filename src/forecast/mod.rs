//! Forecast ensemble generation and metric reduction

pub mod ensemble;
pub mod horizon;
pub mod metrics;


pub use ensemble::{EnsembleGenerator, ForecastEnsembles};
pub use horizon::StepUnit;
pub use metrics::{compute_metrics, ForecastMetrics};
