use crate::models::quote::{OracleQuote, PricePoint};
use crate::errors::{Result, PriceHubError};
use crate::oracles::base::PriceOracle;
use crate::config::Config;
use crate::util;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::Value;
use log::debug;

/// RedStone 价格预言机客户端
pub struct RedstoneOracle {
    client: Client,
    base_url: String,
    provider: String,
}

impl RedstoneOracle {
    /// 根据配置创建客户端
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(PriceHubError::RequestError)?;

        Ok(Self {
            client,
            base_url: config.oracle_base_url.clone(),
            provider: config.oracle_provider.clone(),
        })
    }

    async fn get_prices(&self, query: &[(&str, String)]) -> Result<Value> {
        let response = self.client
            .get(format!("{}/prices", self.base_url))
            .query(query)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PriceHubError::OracleError(format!(
                "HTTP status {}", response.status()
            )));
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl PriceOracle for RedstoneOracle {
    fn name(&self) -> &'static str {
        "redstone"
    }

    async fn fetch_price(&self, symbol: &str) -> Result<OracleQuote> {
        debug!("从 RedStone 获取 {} 最新价格", symbol);

        let json = self.get_prices(&[
            ("symbol", symbol.to_string()),
            ("provider", self.provider.clone()),
            ("limit", "1".to_string()),
        ]).await?;

        parse_latest(&json, symbol)
    }

    async fn fetch_history(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval_secs: u64,
    ) -> Result<Vec<PricePoint>> {
        debug!("从 RedStone 获取 {} 历史价格: {} ~ {}, 间隔 {}s", symbol, start, end, interval_secs);

        // 上游以毫秒为单位
        let interval_ms = interval_secs.checked_mul(1000).ok_or_else(|| {
            PriceHubError::ValidationError(format!("Interval {}s is too large", interval_secs))
        })?;

        let json = self.get_prices(&[
            ("symbol", symbol.to_string()),
            ("provider", self.provider.clone()),
            ("fromTimestamp", start.timestamp_millis().to_string()),
            ("toTimestamp", end.timestamp_millis().to_string()),
            ("interval", interval_ms.to_string()),
        ]).await?;

        let points = parse_history(&json)?;
        debug!("获取到 {} 个历史价格点", points.len());
        Ok(points)
    }
}

/// 解析最新报价；响应是数组，取第一条
fn parse_latest(json: &Value, symbol: &str) -> Result<OracleQuote> {
    let item = match json {
        Value::Array(items) => items.first(),
        Value::Object(_) => Some(json),
        _ => None,
    }
    .ok_or_else(|| PriceHubError::OracleError(format!("No price returned for {}", symbol)))?;

    let value = item.get("value")
        .and_then(|v| v.as_f64())
        .ok_or_else(|| PriceHubError::DataError(format!("Missing price value for {}", symbol)))?;

    if !value.is_finite() || value < 0.0 {
        return Err(PriceHubError::DataError(format!("Invalid price {} for {}", value, symbol)));
    }

    Ok(OracleQuote {
        value,
        timestamp: item.get("timestamp")
            .and_then(|t| t.as_i64())
            .and_then(util::millis_to_datetime),
        change_24h: optional_number(item, "change24h"),
        volume_24h: optional_number(item, "volume24h"),
        market_cap: optional_number(item, "marketCap"),
    })
}

/// 解析历史数据，按时间升序排列
fn parse_history(json: &Value) -> Result<Vec<PricePoint>> {
    let items = json.as_array()
        .ok_or_else(|| PriceHubError::OracleError("Historical response is not an array".to_string()))?;

    let mut points = Vec::with_capacity(items.len());
    for item in items {
        let timestamp = item.get("timestamp").and_then(|t| t.as_i64()).and_then(util::millis_to_datetime);
        let value = item.get("value").and_then(|v| v.as_f64());
        if let (Some(timestamp), Some(value)) = (timestamp, value) {
            points.push(PricePoint { timestamp, value });
        }
    }

    points.sort_by_key(|p| p.timestamp);
    Ok(points)
}

fn optional_number(item: &Value, key: &str) -> Option<f64> {
    item.get(key).and_then(|v| v.as_f64())
}
