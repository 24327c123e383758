//! Tests for error types

#[cfg(test)]
mod tests {
    use super::super::error::*;

    #[test]
    fn test_provider_error_display() {
        let err = ForecastError::provider("binance", "connection reset");
        assert_eq!(err.to_string(), "provider binance failed: connection reset");
    }

    #[test]
    fn test_insufficient_history_display() {
        let err = ForecastError::InsufficientHistory {
            needed: 181,
            available: 40,
        };
        assert_eq!(
            err.to_string(),
            "insufficient history: need 181 bars, have 40"
        );
    }

    #[test]
    fn test_fatal_classification() {
        assert!(ForecastError::ModelLoad("missing weights".into()).is_fatal());
        assert!(ForecastError::Config("bad size".into()).is_fatal());
        assert!(!ForecastError::Oracle("timeout".into()).is_fatal());
        assert!(!ForecastError::Renderer("disk full".into()).is_fatal());
        assert!(!ForecastError::EmptyReport.is_fatal());
        assert!(!ForecastError::provider("eastmoney", "404").is_fatal());
    }

    #[test]
    fn test_config_error_conversion() {
        let err: ForecastError = config::ConfigError::NotFound("common.pred_horizon".into()).into();
        assert!(matches!(err, ForecastError::Config(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: ForecastError = io.into();
        assert!(err.to_string().contains("gone"));
    }
}
