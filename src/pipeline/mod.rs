//! Forecast cycles
//!
//! One cycle walks every configured `(provider, symbol)` pair in order,
//! turns each into a [`crate::types::ForecastResult`] and publishes the
//! complete report once. Per-instrument failures are logged and skipped.

pub mod mock;
pub mod orchestrator;


pub use orchestrator::{CycleOrchestrator, RunMode};

use crate::error::Result;
use async_trait::async_trait;

/// Something the scheduler can drive once per tick
#[async_trait]
pub trait CycleRunner: Send {
    /// `Ok(true)` when a report was published, `Ok(false)` when the cycle
    /// failed but the process can continue. `Err` only for fatal errors.
    async fn run_forecast(&mut self) -> Result<bool>;
}
