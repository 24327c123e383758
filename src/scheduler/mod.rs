//! Fixed-period cycle scheduling
//!
//! The scheduler starts idle: the first cycle begins one period after
//! start-up. Later starts are spaced by the period measured from the
//! previous start. A cycle that overruns the period is followed
//! immediately by the next one; cycles never overlap. Cancellation is
//! observed before each cycle and during the idle wait, never mid-cycle.

use crate::error::{ForecastError, Result};
use crate::pipeline::CycleRunner;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};


/// Time source for the scheduler
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    async fn sleep_until(&self, deadline: Instant);
}

/// Wall clock backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep_until(&self, deadline: Instant) {
        tokio::time::sleep_until(deadline).await;
    }
}

pub struct Scheduler {
    period: Duration,
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
}

impl Scheduler {
    pub fn new(period: Duration, clock: Arc<dyn Clock>, cancel: CancellationToken) -> Self {
        Self {
            period,
            clock,
            cancel,
        }
    }

    /// Wall-clock scheduler with a period given in minutes
    pub fn with_minutes(minutes: u64, cancel: CancellationToken) -> Result<Self> {
        let secs = minutes.checked_mul(60).ok_or_else(|| {
            ForecastError::Config(format!("schedule period of {} minutes is too large", minutes))
        })?;
        Ok(Self::new(Duration::from_secs(secs), Arc::new(TokioClock), cancel))
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Run cycles until cancelled (`Ok`) or a cycle reports a fatal error (`Err`)
    pub async fn run<R>(&self, runner: &mut R) -> Result<()>
    where
        R: CycleRunner + ?Sized,
    {
        info!(
            "🕐 Scheduler started, running every {} minutes",
            self.period.as_secs() / 60
        );
        let mut cycles = 0u64;
        let mut next_start = self.clock.now() + self.period;

        loop {
            if self.cancel.is_cancelled() {
                info!("Shutdown requested, scheduler stopping after {} cycles", cycles);
                return Ok(());
            }

            let now = self.clock.now();
            if next_start > now {
                info!("Next cycle in {:.0}s", (next_start - now).as_secs_f64());
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => {
                        info!("Shutdown requested during idle wait, scheduler stopping after {} cycles", cycles);
                        return Ok(());
                    }
                    _ = self.clock.sleep_until(next_start) => {}
                }
            }

            let started = self.clock.now();
            cycles += 1;
            match runner.run_forecast().await {
                Ok(true) => info!("Cycle {} completed", cycles),
                Ok(false) => warn!("Cycle {} produced no report; waiting for next tick", cycles),
                Err(e) => {
                    error!("Scheduler stopping on fatal error: {}", e);
                    return Err(e);
                }
            }

            next_start = started + self.period;
            let now = self.clock.now();
            if next_start <= now {
                warn!(
                    "Cycle took {:.0}s, longer than the {}s period; starting next cycle now",
                    (now - started).as_secs_f64(),
                    self.period.as_secs()
                );
            }
        }
    }
}
