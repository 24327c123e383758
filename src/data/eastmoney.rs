//! China A-share daily history from EastMoney
//!
//! Forward-adjusted prices. Each kline is a CSV string
//! `date,open,close,high,low,volume,amount`.

use super::DataProvider;
use crate::error::{ForecastError, Result};
use crate::forecast::StepUnit;
use crate::types::{Bar, TimeSeries};
use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

pub const PROVIDER_NAME: &str = "eastmoney";

const BASE_URL: &str = "https://push2his.eastmoney.com";
const DAILY_KLT: &str = "101";

#[derive(Clone)]
pub struct EastMoneyProvider {
    http: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct KlineResponse {
    data: Option<KlineData>,
}

#[derive(Debug, Deserialize)]
struct KlineData {
    #[serde(default)]
    klines: Vec<String>,
}

impl EastMoneyProvider {
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
impl DataProvider for EastMoneyProvider {
    async fn fetch(&self, symbol: &str, interval: &str, limit: usize) -> Result<TimeSeries> {
        debug!("Fetching {} bars of {} from EastMoney", limit, symbol);
        check_interval(interval).map_err(|e| ForecastError::provider(PROVIDER_NAME, e))?;

        let url = format!("{}/api/qt/stock/kline/get", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[
                ("secid", secid(symbol).as_str()),
                ("fields1", "f1,f2,f3,f4,f5,f6"),
                ("fields2", "f51,f52,f53,f54,f55,f56,f57"),
                ("klt", DAILY_KLT),
                ("fqt", "1"),
                ("end", "20500101"),
                ("lmt", &limit.to_string()),
            ])
            .send()
            .await
            .map_err(|e| ForecastError::provider(PROVIDER_NAME, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ForecastError::provider(
                PROVIDER_NAME,
                format!("status {} for {}", status, symbol),
            ));
        }

        let body: KlineResponse = resp
            .json()
            .await
            .map_err(|e| ForecastError::provider(PROVIDER_NAME, e))?;
        parse_response(body, limit)
    }
}

/// Shanghai listings (6xxxxx, 9xxxxx) use market 1, the rest market 0
pub(crate) fn secid(symbol: &str) -> String {
    let code = symbol.trim();
    let market = if code.starts_with('6') || code.starts_with('9') {
        1
    } else {
        0
    };
    format!("{}.{}", market, code)
}

/// Only daily bars are served; weekly or monthly klines would not line up
/// with the day-spaced forecast axis
pub fn check_interval(interval: &str) -> Result<()> {
    if StepUnit::from_interval(interval) != StepUnit::Day {
        return Err(ForecastError::Config(format!(
            "sources.{} interval '{}' is not daily",
            PROVIDER_NAME, interval
        )));
    }
    Ok(())
}

pub(crate) fn parse_response(body: KlineResponse, limit: usize) -> Result<TimeSeries> {
    let klines = body.data.map(|d| d.klines).unwrap_or_default();
    if klines.is_empty() {
        return Err(ForecastError::provider(PROVIDER_NAME, "no klines returned"));
    }

    let start = klines.len().saturating_sub(limit);
    let bars = klines[start..]
        .iter()
        .map(|line| parse_line(line))
        .collect::<Result<Vec<_>>>()?;

    TimeSeries::new(bars).map_err(|e| ForecastError::provider(PROVIDER_NAME, e))
}

fn parse_line(line: &str) -> Result<Bar> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() < 7 {
        return Err(ForecastError::provider(
            PROVIDER_NAME,
            format!("kline '{}' has {} fields", line, fields.len()),
        ));
    }

    let date = NaiveDate::parse_from_str(fields[0], "%Y-%m-%d")
        .map_err(|e| ForecastError::provider(PROVIDER_NAME, format!("bad date '{}': {}", fields[0], e)))?;
    let timestamp = Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN));

    let num = |i: usize| -> Result<f64> {
        fields[i].parse::<f64>().map_err(|_| {
            ForecastError::provider(PROVIDER_NAME, format!("bad number '{}'", fields[i]))
        })
    };

    // open, close, high, low ordering is the vendor's
    Ok(Bar {
        timestamp,
        open: num(1)?,
        close: num(2)?,
        high: num(3)?,
        low: num(4)?,
        volume: num(5)?,
        amount: num(6)?,
    })
}
