use crate::models::quote::{OracleQuote, PricePoint};
use crate::errors::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Base trait for upstream price oracles
#[async_trait]
pub trait PriceOracle {
    /// Name of the oracle, used in log lines
    fn name(&self) -> &'static str;

    /// Fetch the latest quote for a symbol
    async fn fetch_price(&self, symbol: &str) -> Result<OracleQuote>;

    /// Fetch historical points for a symbol over `[start, end]`
    /// `interval_secs` is only a hint for the upstream
    async fn fetch_history(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval_secs: u64,
    ) -> Result<Vec<PricePoint>>;
}
