use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// 上游预言机返回的原始报价
///
/// 可选字段缺失表示上游没有提供，而不是 0
#[derive(Debug, Clone, PartialEq)]
pub struct OracleQuote {
    pub value: f64,
    pub timestamp: Option<DateTime<Utc>>,
    pub change_24h: Option<f64>,
    pub volume_24h: Option<f64>,
    pub market_cap: Option<f64>,
}

impl OracleQuote {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            timestamp: None,
            change_24h: None,
            volume_24h: None,
            market_cap: None,
        }
    }
}

/// 单个币种的报价，既用于缓存也直接返回给调用方
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub symbol: String,
    /// 当 `error` 存在时 0 只是占位值
    pub price: f64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub fetched_at: DateTime<Utc>,
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub oracle_timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_24h: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_24h: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// 刷新失败后回退到旧缓存时为 true
    #[serde(default)]
    pub stale: bool,
}

impl PriceQuote {
    /// 由一次成功的上游读取构造报价
    pub fn from_oracle(symbol: &str, quote: OracleQuote, fetched_at: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.to_string(),
            price: quote.value,
            fetched_at,
            oracle_timestamp: quote.timestamp,
            change_24h: quote.change_24h,
            volume_24h: quote.volume_24h,
            market_cap: quote.market_cap,
            error: None,
            stale: false,
        }
    }

    /// 没有任何可用数据时返回的占位报价，不会写入缓存
    pub fn failed(symbol: &str, reason: &str, now: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.to_string(),
            price: 0.0,
            fetched_at: now,
            oracle_timestamp: None,
            change_24h: None,
            volume_24h: None,
            market_cap: None,
            error: Some(reason.to_string()),
            stale: false,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.fetched_at
    }
}

/// 缓存条目，仅由 QuoteCache 持有；对外只返回副本
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub quote: PriceQuote,
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(mut quote: PriceQuote, fetched_at: DateTime<Utc>) -> Self {
        quote.fetched_at = fetched_at;
        quote.stale = false;
        Self { quote, fetched_at }
    }
}

/// 历史价格点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}
