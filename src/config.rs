//! Configuration loading
//!
//! Layers built-in defaults, a TOML file and `FORECAST__`-prefixed
//! environment variables (e.g. `FORECAST__COMMON__PRED_HORIZON=48`).

use crate::error::{ForecastError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub common: CommonConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Instrument lists keyed by provider name, in file order
    #[serde(default)]
    pub sources: IndexMap<String, SourceConfig>,
}

pub const MAX_PRED_HORIZON: usize = 10_000;
pub const MAX_N_PREDICTIONS: usize = 1_000;
/// One week
pub const MAX_UPDATE_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

/// Forecast sizing and schedule
#[derive(Debug, Clone, Deserialize)]
pub struct CommonConfig {
    /// Future steps per sampled path
    #[serde(default = "default_pred_horizon")]
    pub pred_horizon: usize,
    /// Paths sampled per oracle call
    #[serde(default = "default_n_predictions")]
    pub n_predictions: usize,
    /// Bars shown on the chart
    #[serde(default = "default_hist_points")]
    pub hist_points: usize,
    /// Log returns used for the historical volatility baseline
    #[serde(default = "default_vol_window")]
    pub vol_window: usize,
    #[serde(default = "default_update_interval_minutes")]
    pub update_interval_minutes: u64,
}

impl Default for CommonConfig {
    fn default() -> Self {
        Self {
            pred_horizon: default_pred_horizon(),
            n_predictions: default_n_predictions(),
            hist_points: default_hist_points(),
            vol_window: default_vol_window(),
            update_interval_minutes: default_update_interval_minutes(),
        }
    }
}

impl CommonConfig {
    /// Bars requested from a provider per instrument
    pub fn fetch_limit(&self) -> usize {
        self.hist_points + self.vol_window
    }
}

fn default_pred_horizon() -> usize {
    24
}
fn default_n_predictions() -> usize {
    30
}
fn default_hist_points() -> usize {
    200
}
fn default_vol_window() -> usize {
    180
}
fn default_update_interval_minutes() -> u64 {
    60
}

/// Forecasting model variant; each implies a fixed context length
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelSize {
    Mini,
    #[default]
    Small,
    Base,
}

impl ModelSize {
    pub fn max_context(&self) -> usize {
        match self {
            ModelSize::Mini => 2048,
            ModelSize::Small | ModelSize::Base => 512,
        }
    }

    pub fn model_id(&self) -> &'static str {
        match self {
            ModelSize::Mini => "NeoQuasar/Kronos-mini",
            ModelSize::Small => "NeoQuasar/Kronos-small",
            ModelSize::Base => "NeoQuasar/Kronos-base",
        }
    }

    pub fn tokenizer_id(&self) -> &'static str {
        match self {
            ModelSize::Mini => "NeoQuasar/Kronos-Tokenizer-2k",
            ModelSize::Small | ModelSize::Base => "NeoQuasar/Kronos-Tokenizer-base",
        }
    }
}

impl std::fmt::Display for ModelSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ModelSize::Mini => "mini",
            ModelSize::Small => "small",
            ModelSize::Base => "base",
        };
        f.write_str(name)
    }
}

/// Where inference runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OracleBackend {
    /// Remote inference service
    #[default]
    Http,
    /// In-process random walk, for offline runs
    RandomWalk,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub size: ModelSize,
    #[serde(default = "default_device")]
    pub device: String,
    #[serde(default)]
    pub backend: OracleBackend,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Random-walk backend only
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            size: ModelSize::default(),
            device: default_device(),
            backend: OracleBackend::default(),
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
            seed: None,
        }
    }
}

impl ModelConfig {
    pub fn max_context(&self) -> usize {
        self.size.max_context()
    }
}

fn default_device() -> String {
    "cpu".to_string()
}
fn default_endpoint() -> String {
    "http://127.0.0.1:8000".to_string()
}
fn default_timeout_secs() -> u64 {
    600
}

/// Report and chart locations
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: String,
    #[serde(default = "default_chart_subdir")]
    pub chart_subdir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            chart_subdir: default_chart_subdir(),
        }
    }
}

impl OutputConfig {
    pub fn resolved_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.dir).into_owned())
    }

    pub fn chart_dir(&self) -> PathBuf {
        self.resolved_dir().join(&self.chart_subdir)
    }
}

fn default_output_dir() -> String {
    "docs".to_string()
}
fn default_chart_subdir() -> String {
    "static/chart".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Instruments served by one provider
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// TOML array or a comma-separated string
    #[serde(deserialize_with = "deserialize_symbols")]
    pub symbols: Vec<String>,
    pub interval: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SymbolList {
    Csv(String),
    List(Vec<String>),
}

fn deserialize_symbols<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match SymbolList::deserialize(deserializer)? {
        SymbolList::Csv(s) => s.split(',').map(str::to_string).collect::<Vec<_>>(),
        SymbolList::List(v) => v,
    };
    Ok(raw
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

impl Config {
    /// Load from a TOML file, then apply environment overrides
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ForecastError::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        let settings = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Toml))
            .add_source(
                config::Environment::with_prefix("FORECAST")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse an in-memory TOML document (no environment layer)
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()?;
        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let c = &self.common;
        if c.pred_horizon == 0 || c.pred_horizon > MAX_PRED_HORIZON {
            return Err(ForecastError::Config(format!(
                "common.pred_horizon must be between 1 and {}",
                MAX_PRED_HORIZON
            )));
        }
        if c.n_predictions == 0 || c.n_predictions > MAX_N_PREDICTIONS {
            return Err(ForecastError::Config(format!(
                "common.n_predictions must be between 1 and {}",
                MAX_N_PREDICTIONS
            )));
        }
        if c.hist_points < 2 {
            return Err(ForecastError::Config("common.hist_points must be at least 2".into()));
        }
        if c.vol_window == 0 {
            return Err(ForecastError::Config("common.vol_window must be at least 1".into()));
        }
        if c.update_interval_minutes == 0 || c.update_interval_minutes > MAX_UPDATE_INTERVAL_MINUTES {
            return Err(ForecastError::Config(format!(
                "common.update_interval_minutes must be between 1 and {}",
                MAX_UPDATE_INTERVAL_MINUTES
            )));
        }
        for (name, source) in &self.sources {
            if source.symbols.is_empty() {
                return Err(ForecastError::Config(format!("sources.{} has no symbols", name)));
            }
            if source.interval.trim().is_empty() {
                return Err(ForecastError::Config(format!("sources.{} has no interval", name)));
            }
        }
        Ok(())
    }
}
