//! Unit tests for data providers

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::config::Config;
    use serde_json::json;

    #[test]
    fn test_parse_binance_klines() {
        let rows: Vec<Vec<serde_json::Value>> = serde_json::from_value(json!([
            [1704067200000i64, "42000.1", "42500.0", "41800.5", "42300.2", "120.5", 1704070799999i64, "5090000.0", 1000, "60.0", "2500000.0", "0"],
            [1704070800000i64, "42300.2", "42400.0", "42100.0", "42150.0", "98.25", 1704074399999i64, "4140000.0", 900, "50.0", "2100000.0", "0"]
        ]))
        .unwrap();

        let series = binance::parse_klines(&rows).unwrap();
        assert_eq!(series.len(), 2);
        let first = series.bars()[0];
        assert_eq!(first.timestamp.timestamp_millis(), 1704067200000);
        assert_eq!(first.open, 42000.1);
        assert_eq!(first.high, 42500.0);
        assert_eq!(first.low, 41800.5);
        assert_eq!(first.close, 42300.2);
        assert_eq!(first.volume, 120.5);
        assert_eq!(first.amount, 5090000.0);
    }

    #[test]
    fn test_parse_binance_empty_is_failure() {
        let err = binance::parse_klines(&[]).unwrap_err();
        assert!(matches!(err, crate::error::ForecastError::Provider { .. }));
    }

    #[test]
    fn test_parse_binance_short_row() {
        let rows: Vec<Vec<serde_json::Value>> =
            serde_json::from_value(json!([[1704067200000i64, "1", "1"]])).unwrap();
        assert!(binance::parse_klines(&rows).is_err());
    }

    #[test]
    fn test_parse_binance_out_of_order_rows() {
        let rows: Vec<Vec<serde_json::Value>> = serde_json::from_value(json!([
            [1704070800000i64, "1", "1", "1", "1", "1", 0, "1"],
            [1704067200000i64, "1", "1", "1", "1", "1", 0, "1"]
        ]))
        .unwrap();
        assert!(binance::parse_klines(&rows).is_err());
    }

    #[test]
    fn test_eastmoney_secid() {
        assert_eq!(eastmoney::secid("600519"), "1.600519");
        assert_eq!(eastmoney::secid("900901"), "1.900901");
        assert_eq!(eastmoney::secid("000001"), "0.000001");
        assert_eq!(eastmoney::secid("300750"), "0.300750");
    }

    #[test]
    fn test_eastmoney_daily_only() {
        assert!(eastmoney::check_interval("1d").is_ok());
        assert!(eastmoney::check_interval("daily").is_ok());

        // weekly/monthly bars would get a minute-spaced forecast axis
        for interval in ["1w", "1M", "monthly"] {
            let err = eastmoney::check_interval(interval).unwrap_err();
            assert!(err.is_fatal(), "{} should be rejected", interval);
        }
    }

    #[test]
    fn test_registry_rejects_non_daily_eastmoney_source() {
        let registry = ProviderRegistry::with_defaults().unwrap();
        let config = Config::from_toml_str(
            r#"
[sources.eastmoney]
symbols = ["600519"]
interval = "1w"
"#,
        )
        .unwrap();

        let err = registry.check_sources(&config).unwrap_err();
        assert!(matches!(err, crate::error::ForecastError::Config(_)));
        assert!(err.to_string().contains("1w"));
    }

    #[tokio::test]
    async fn test_eastmoney_fetch_rejects_non_daily_before_request() {
        // unroutable base url: the interval check must fail first
        let provider = eastmoney::EastMoneyProvider::with_base_url("http://127.0.0.1:9").unwrap();
        let err = provider.fetch("600519", "1w", 10).await.unwrap_err();
        assert!(err.to_string().contains("not daily"));
    }

    #[test]
    fn test_parse_eastmoney_response_keeps_most_recent() {
        let body: eastmoney::KlineResponse = serde_json::from_value(json!({
            "rc": 0,
            "data": {
                "code": "600519",
                "klines": [
                    "2024-01-02,1700.00,1685.00,1710.00,1680.00,30000,5100000000.00,1.2",
                    "2024-01-03,1685.00,1690.50,1695.00,1670.00,28000,4700000000.00,1.1",
                    "2024-01-04,1690.50,1702.00,1705.00,1688.00,25000,4250000000.00,1.0"
                ]
            }
        }))
        .unwrap();

        let series = eastmoney::parse_response(body, 2).unwrap();
        assert_eq!(series.len(), 2);
        let first = series.bars()[0];
        assert_eq!(first.timestamp.format("%Y-%m-%d").to_string(), "2024-01-03");
        assert_eq!(first.open, 1685.0);
        assert_eq!(first.close, 1690.5);
        assert_eq!(first.high, 1695.0);
        assert_eq!(first.low, 1670.0);
        assert_eq!(first.volume, 28000.0);
        assert_eq!(series.last_close(), Some(1702.0));
    }

    #[test]
    fn test_parse_eastmoney_missing_data() {
        let body: eastmoney::KlineResponse =
            serde_json::from_value(json!({"rc": 0, "data": null})).unwrap();
        assert!(eastmoney::parse_response(body, 10).is_err());
    }

    #[test]
    fn test_parse_eastmoney_bad_date() {
        let body: eastmoney::KlineResponse = serde_json::from_value(json!({
            "data": {"klines": ["yesterday,1,1,1,1,1,1"]}
        }))
        .unwrap();
        assert!(eastmoney::parse_response(body, 10).is_err());
    }

    #[test]
    fn test_registry_defaults() {
        let registry = ProviderRegistry::with_defaults().unwrap();
        assert!(registry.has("binance"));
        assert!(registry.has("eastmoney"));
        assert!(!registry.has("akshare"));
    }

    #[test]
    fn test_registry_rejects_unknown_source() {
        let registry = ProviderRegistry::with_defaults().unwrap();
        let config = Config::from_toml_str(
            r#"
[sources.yahoo]
symbols = ["AAPL"]
interval = "1d"
"#,
        )
        .unwrap();

        let err = registry.check_sources(&config).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("yahoo"));
    }

    #[tokio::test]
    async fn test_registry_routes_to_registered_provider() {
        let mut mock = MockDataProvider::new();
        mock.expect_fetch()
            .times(1)
            .returning(|_, _, _| Ok(crate::types::TimeSeries::default()));

        let mut registry = ProviderRegistry::new();
        registry.register("fake", std::sync::Arc::new(mock));

        let provider = registry.get("fake").unwrap();
        let series = provider.fetch("XYZ", "1h", 10).await.unwrap();
        assert!(series.is_empty());
        assert!(registry.get("other").is_none());
    }
}
