//! Tests for configuration

#[cfg(test)]
mod tests {
    use super::super::config::*;
    use std::io::Write;

    #[test]
    fn test_common_config_defaults() {
        let config: CommonConfig = toml::from_str("").unwrap();
        assert_eq!(config.pred_horizon, 24);
        assert_eq!(config.n_predictions, 30);
        assert_eq!(config.hist_points, 200);
        assert_eq!(config.vol_window, 180);
        assert_eq!(config.update_interval_minutes, 60);
        assert_eq!(config.fetch_limit(), 380);
    }

    #[test]
    fn test_model_config_defaults() {
        let config: ModelConfig = toml::from_str("").unwrap();
        assert_eq!(config.size, ModelSize::Small);
        assert_eq!(config.device, "cpu");
        assert_eq!(config.backend, OracleBackend::Http);
        assert_eq!(config.max_context(), 512);
        assert!(config.seed.is_none());
    }

    #[test]
    fn test_model_size_context_lengths() {
        assert_eq!(ModelSize::Mini.max_context(), 2048);
        assert_eq!(ModelSize::Small.max_context(), 512);
        assert_eq!(ModelSize::Base.max_context(), 512);
        assert_eq!(ModelSize::Mini.tokenizer_id(), "NeoQuasar/Kronos-Tokenizer-2k");
        assert_eq!(ModelSize::Base.model_id(), "NeoQuasar/Kronos-base");
    }

    #[test]
    fn test_model_size_parsing() {
        let config: ModelConfig = toml::from_str(r#"size = "mini""#).unwrap();
        assert_eq!(config.size, ModelSize::Mini);

        let bad: Result<ModelConfig, _> = toml::from_str(r#"size = "huge""#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_random_walk_backend() {
        let toml_str = r#"
backend = "random_walk"
seed = 7
"#;
        let config: ModelConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.backend, OracleBackend::RandomWalk);
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn test_source_symbols_as_csv() {
        let toml_str = r#"
symbols = "BTCUSDT, ETHUSDT,,SOLUSDT "
interval = "1h"
"#;
        let config: SourceConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.symbols, vec!["BTCUSDT", "ETHUSDT", "SOLUSDT"]);
        assert_eq!(config.interval, "1h");
    }

    #[test]
    fn test_source_symbols_as_list() {
        let toml_str = r#"
symbols = ["600519", " 000001 "]
interval = "1d"
"#;
        let config: SourceConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.symbols, vec!["600519", "000001"]);
    }

    #[test]
    fn test_output_config_paths() {
        let config = OutputConfig::default();
        assert_eq!(config.resolved_dir(), std::path::PathBuf::from("docs"));
        assert_eq!(config.chart_dir(), std::path::PathBuf::from("docs/static/chart"));
    }

    #[test]
    fn test_full_config_preserves_source_order() {
        let raw = r#"
[common]
pred_horizon = 12

[sources.eastmoney]
symbols = ["600519"]
interval = "1d"

[sources.binance]
symbols = "BTCUSDT,ETHUSDT"
interval = "1h"
"#;
        let config = Config::from_toml_str(raw).unwrap();
        assert_eq!(config.common.pred_horizon, 12);
        assert_eq!(config.common.n_predictions, 30);
        let names: Vec<&String> = config.sources.keys().collect();
        assert_eq!(names, vec!["eastmoney", "binance"]);
        assert_eq!(config.sources["binance"].symbols.len(), 2);
    }

    #[test]
    fn test_validate_rejects_zero_horizon() {
        let raw = r#"
[common]
pred_horizon = 0
"#;
        assert!(Config::from_toml_str(raw).is_err());
    }

    #[test]
    fn test_validate_rejects_oversized_values() {
        let mut config = Config::default();
        config.common.pred_horizon = MAX_PRED_HORIZON + 1;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.common.n_predictions = MAX_N_PREDICTIONS + 1;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.common.update_interval_minutes = u64::MAX;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.common.update_interval_minutes = MAX_UPDATE_INTERVAL_MINUTES;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_tiny_display_window() {
        let mut config = Config::default();
        config.common.hist_points = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_symbol_list() {
        let raw = r#"
[sources.binance]
symbols = " , "
interval = "1h"
"#;
        assert!(Config::from_toml_str(raw).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load("/definitely/not/here.toml").unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[model]
size = "base"
device = "cuda"

[output]
dir = "site"

[sources.binance]
symbols = ["BTCUSDT"]
interval = "4h"
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.model.size, ModelSize::Base);
        assert_eq!(config.model.device, "cuda");
        assert_eq!(config.output.dir, "site");
        assert_eq!(config.sources["binance"].interval, "4h");
    }
}
