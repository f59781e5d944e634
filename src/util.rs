use chrono::{DateTime, Duration, TimeZone, Utc};
use crate::errors::{Result, PriceHubError};

// 币种代码统一为大写，作为缓存键
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

pub fn millis_to_datetime(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}

// 解析 RFC 3339 / ISO 8601 时间
pub fn parse_datetime(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value.trim())?.with_timezone(&Utc))
}

pub fn to_chrono_duration(duration: std::time::Duration) -> Result<Duration> {
    Duration::from_std(duration)
        .map_err(|e| PriceHubError::DataError(format!("Duration out of range: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_are_trimmed_and_uppercased() {
        assert_eq!(normalize_symbol(" eth "), "ETH");
        assert_eq!(normalize_symbol("Btc"), "BTC");
    }

    #[test]
    fn parses_offsets_into_utc() {
        let parsed = parse_datetime("2024-01-01T08:00:00+08:00").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn rejects_garbage_dates() {
        assert!(matches!(parse_datetime("yesterday"), Err(PriceHubError::DateError(_))));
    }
}
