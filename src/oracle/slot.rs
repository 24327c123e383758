//! One-time oracle initialization

use super::{ForecastOracle, OracleLoader};
use crate::error::{ForecastError, Result};
use std::sync::Arc;

pub enum OracleState {
    Unloaded,
    Loaded(Arc<dyn ForecastOracle>),
    /// Terminal: the process has no fallback model
    Failed(String),
}

/// Owns the oracle and loads it at most once per process
pub struct OracleSlot {
    loader: Arc<dyn OracleLoader>,
    state: OracleState,
}

impl OracleSlot {
    pub fn new(loader: Arc<dyn OracleLoader>) -> Self {
        Self {
            loader,
            state: OracleState::Unloaded,
        }
    }

    pub fn state(&self) -> &OracleState {
        &self.state
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, OracleState::Loaded(_))
    }

    /// Return the loaded oracle, loading it on first call.
    ///
    /// A failed load is remembered and every later call reports
    /// [`ForecastError::ModelLoad`] without retrying.
    pub async fn get_or_load(&mut self) -> Result<Arc<dyn ForecastOracle>> {
        match &self.state {
            OracleState::Loaded(oracle) => return Ok(oracle.clone()),
            OracleState::Failed(message) => return Err(ForecastError::ModelLoad(message.clone())),
            OracleState::Unloaded => {}
        }

        match self.loader.load().await {
            Ok(oracle) => {
                self.state = OracleState::Loaded(oracle.clone());
                Ok(oracle)
            }
            Err(e) => {
                let message = match e {
                    ForecastError::ModelLoad(m) => m,
                    other => other.to_string(),
                };
                tracing::error!("Model load failed: {}", message);
                self.state = OracleState::Failed(message.clone());
                Err(ForecastError::ModelLoad(message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::MockForecastOracle;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingLoader {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl OracleLoader for CountingLoader {
        async fn load(&self) -> Result<Arc<dyn ForecastOracle>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(ForecastError::Oracle("weights not found".into()))
            } else {
                Ok(Arc::new(MockForecastOracle::new()))
            }
        }
    }

    #[tokio::test]
    async fn test_loads_once() {
        let loader = Arc::new(CountingLoader {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let mut slot = OracleSlot::new(loader.clone());
        assert!(!slot.is_loaded());

        slot.get_or_load().await.unwrap();
        slot.get_or_load().await.unwrap();

        assert!(slot.is_loaded());
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_is_terminal() {
        let loader = Arc::new(CountingLoader {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        let mut slot = OracleSlot::new(loader.clone());

        let first = slot.get_or_load().await.err().unwrap();
        let second = slot.get_or_load().await.err().unwrap();

        assert!(matches!(first, ForecastError::ModelLoad(_)));
        assert!(second.is_fatal());
        assert!(second.to_string().contains("weights not found"));
        assert!(matches!(slot.state(), OracleState::Failed(_)));
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
    }
}
