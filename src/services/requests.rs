use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, PriceHubError};
use crate::models::quote::{PricePoint, PriceQuote};
use crate::util;

/// 解析币种列表，支持逗号和空白分隔
pub fn parse_symbols(raw: &str) -> Result<Vec<String>> {
    let symbols: Vec<String> = raw
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(util::normalize_symbol)
        .collect();

    if symbols.is_empty() {
        return Err(PriceHubError::ValidationError("Symbol or symbols parameter is required".to_string()));
    }
    Ok(symbols)
}

/// 批量报价请求，`symbols` 优先于 `symbol`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PriceRequest {
    pub symbol: Option<String>,
    pub symbols: Option<String>,
}

impl PriceRequest {
    pub fn symbols(&self) -> Result<Vec<String>> {
        match (&self.symbols, &self.symbol) {
            (Some(list), _) => parse_symbols(list),
            (None, Some(one)) => parse_symbols(one),
            (None, None) => Err(PriceHubError::ValidationError(
                "Symbol or symbols parameter is required".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricesResponse {
    pub prices: Vec<PriceQuote>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

/// 历史价格请求；日期为 RFC 3339，间隔单位为秒
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRequest {
    pub symbol: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub interval: Option<u64>,
}

impl HistoryRequest {
    pub fn symbol(&self) -> Result<String> {
        self.symbol
            .as_deref()
            .map(util::normalize_symbol)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| PriceHubError::ValidationError("Symbol is required".to_string()))
    }

    pub fn start(&self) -> Result<Option<DateTime<Utc>>> {
        self.start_date.as_deref().map(util::parse_datetime).transpose()
    }

    pub fn end(&self) -> Result<Option<DateTime<Utc>>> {
        self.end_date.as_deref().map(util::parse_datetime).transpose()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub symbol: String,
    pub data: Vec<PricePoint>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

/// 请求级错误的响应体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    /// 返回 HTTP 状态码和响应体
    pub fn from_error(err: &PriceHubError) -> (u16, Self) {
        if err.is_validation() {
            (400, Self { error: err.to_string() })
        } else {
            (500, Self { error: err.to_string() })
        }
    }
}
