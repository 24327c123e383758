//! Binance spot klines

use super::DataProvider;
use crate::error::{ForecastError, Result};
use crate::types::{Bar, TimeSeries};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

pub const PROVIDER_NAME: &str = "binance";

const BASE_URL: &str = "https://api.binance.com";
/// Binance rejects larger `limit` values
const MAX_LIMIT: usize = 1000;

#[derive(Clone)]
pub struct BinanceProvider {
    http: Client,
    base_url: String,
}

impl BinanceProvider {
    pub fn new() -> Result<Self> {
        Self::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| ForecastError::provider(PROVIDER_NAME, e))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl DataProvider for BinanceProvider {
    async fn fetch(&self, symbol: &str, interval: &str, limit: usize) -> Result<TimeSeries> {
        let limit = if limit > MAX_LIMIT {
            warn!("Binance limit {} clamped to {}", limit, MAX_LIMIT);
            MAX_LIMIT
        } else {
            limit
        };
        debug!("Fetching {} bars of {} {} from Binance", limit, symbol, interval);

        let url = format!("{}/api/v3/klines", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[
                ("symbol", symbol),
                ("interval", interval),
                ("limit", &limit.to_string()),
            ])
            .send()
            .await
            .map_err(|e| ForecastError::provider(PROVIDER_NAME, e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ForecastError::provider(
                PROVIDER_NAME,
                format!("status {} for {}: {}", status, symbol, body),
            ));
        }

        let rows: Vec<Vec<Value>> = resp
            .json()
            .await
            .map_err(|e| ForecastError::provider(PROVIDER_NAME, e))?;
        parse_klines(&rows)
    }
}

/// Kline row layout: `[open_time_ms, open, high, low, close, volume,
/// close_time, quote_asset_volume, ...]`; numbers arrive as strings.
pub(crate) fn parse_klines(rows: &[Vec<Value>]) -> Result<TimeSeries> {
    if rows.is_empty() {
        return Err(ForecastError::provider(PROVIDER_NAME, "empty kline response"));
    }

    let bars = rows
        .iter()
        .map(|row| parse_row(row))
        .collect::<Result<Vec<_>>>()?;

    TimeSeries::new(bars).map_err(|e| ForecastError::provider(PROVIDER_NAME, e))
}

fn parse_row(row: &[Value]) -> Result<Bar> {
    if row.len() < 8 {
        return Err(ForecastError::provider(
            PROVIDER_NAME,
            format!("kline row has {} fields", row.len()),
        ));
    }

    let open_time = row[0]
        .as_i64()
        .ok_or_else(|| ForecastError::provider(PROVIDER_NAME, "open time is not an integer"))?;
    let timestamp = DateTime::<Utc>::from_timestamp_millis(open_time).ok_or_else(|| {
        ForecastError::provider(PROVIDER_NAME, format!("open time {} out of range", open_time))
    })?;

    Ok(Bar {
        timestamp,
        open: number(&row[1])?,
        high: number(&row[2])?,
        low: number(&row[3])?,
        close: number(&row[4])?,
        volume: number(&row[5])?,
        amount: number(&row[7])?,
    })
}

fn number(value: &Value) -> Result<f64> {
    match value {
        Value::String(s) => s
            .parse::<f64>()
            .map_err(|_| ForecastError::provider(PROVIDER_NAME, format!("bad number '{}'", s))),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| ForecastError::provider(PROVIDER_NAME, "bad number")),
        other => Err(ForecastError::provider(
            PROVIDER_NAME,
            format!("unexpected value {}", other),
        )),
    }
}
