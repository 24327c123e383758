//! Market data providers
//!
//! Each provider turns a vendor response into a canonical [`TimeSeries`].
//! The orchestrator only knows providers by name, through [`ProviderRegistry`].

pub mod binance;
pub mod eastmoney;

#[cfg(test)]
mod tests;

pub use binance::BinanceProvider;
pub use eastmoney::EastMoneyProvider;

use crate::config::Config;
use crate::error::{ForecastError, Result};
use crate::types::TimeSeries;
use async_trait::async_trait;
use indexmap::IndexMap;
use std::sync::Arc;

/// Source of historical bars
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Fetch up to `limit` of the most recent bars for `symbol`
    async fn fetch(&self, symbol: &str, interval: &str, limit: usize) -> Result<TimeSeries>;
}

/// Providers keyed by the name used in `[sources.<name>]`
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: IndexMap<String, Arc<dyn DataProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in provider
    pub fn with_defaults() -> Result<Self> {
        let mut registry = Self::new();
        registry.register(binance::PROVIDER_NAME, Arc::new(BinanceProvider::new()?));
        registry.register(eastmoney::PROVIDER_NAME, Arc::new(EastMoneyProvider::new()?));
        Ok(registry)
    }

    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn DataProvider>) {
        self.providers.insert(name.into(), provider);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn DataProvider>> {
        self.providers.get(name).cloned()
    }

    pub fn has(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }

    /// Every configured source must name a registered provider with an
    /// interval it can serve
    pub fn check_sources(&self, config: &Config) -> Result<()> {
        for (name, source) in &config.sources {
            if name == eastmoney::PROVIDER_NAME {
                eastmoney::check_interval(&source.interval)?;
            }
            if !self.has(name) {
                let known: Vec<&str> = self.names().collect();
                return Err(ForecastError::Config(format!(
                    "unknown data source '{}' (known: {})",
                    name,
                    known.join(", ")
                )));
            }
        }
        Ok(())
    }
}
