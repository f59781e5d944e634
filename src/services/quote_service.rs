use crate::cache::QuoteCache;
use crate::config::Config;
use crate::errors::{Result, PriceHubError};
use crate::models::quote::{PricePoint, PriceQuote};
use crate::oracles::base::PriceOracle;
use crate::services::requests::{HistoryRequest, HistoryResponse, PriceRequest, PricesResponse};
use crate::util;
use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;
use log::{debug, error, info, warn};
use std::sync::Arc;

/// 报价服务：缓存 + 批量聚合 + 历史数据查询
pub struct QuoteService {
    config: Config,
    oracle: Arc<dyn PriceOracle + Send + Sync>,
    cache: QuoteCache,
    ttl: Duration,
    history_window: Duration,
}

impl QuoteService {
    /// 创建服务实例；缓存随服务一起创建和销毁
    pub fn new(config: Config, oracle: Arc<dyn PriceOracle + Send + Sync>) -> Result<Self> {
        let ttl = util::to_chrono_duration(config.cache_ttl)?;
        let history_window = util::to_chrono_duration(config.default_history_window)?;
        let cache = QuoteCache::new(config.max_cache_entries);

        info!("Quote service using oracle {} with cache TTL {:?}", oracle.name(), config.cache_ttl);

        Ok(Self {
            config,
            oracle,
            cache,
            ttl,
            history_window,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> &QuoteCache {
        &self.cache
    }

    /// 批量解析报价，结果顺序与输入一致
    ///
    /// 每个币种独立处理并发执行，单个币种失败只体现在该报价的 `error` 字段上，
    /// 不影响其他币种。重复的币种各自独立解析。
    pub async fn resolve<S: AsRef<str>>(&self, symbols: &[S], now: DateTime<Utc>) -> Vec<PriceQuote> {
        join_all(symbols.iter().map(|symbol| self.resolve_one(symbol.as_ref(), now))).await
    }

    pub async fn resolve_now<S: AsRef<str>>(&self, symbols: &[S]) -> Vec<PriceQuote> {
        self.resolve(symbols, Utc::now()).await
    }

    async fn resolve_one(&self, symbol: &str, now: DateTime<Utc>) -> PriceQuote {
        let key = util::normalize_symbol(symbol);
        if key.is_empty() {
            warn!("Empty symbol reached the aggregator");
            return PriceQuote::failed(&key, "Symbol is required", now);
        }

        let cached = self.cache.get(&key);
        if let Some(entry) = &cached {
            if QuoteCache::is_fresh(entry, now, self.ttl) {
                debug!("Cache hit for {}", key);
                return entry.quote.clone();
            }
        }

        debug!("Refreshing {} from {}", key, self.oracle.name());
        match self.oracle.fetch_price(&key).await {
            Ok(oracle_quote) => {
                let quote = PriceQuote::from_oracle(&key, oracle_quote, now);
                self.cache.put(&key, quote.clone(), now);
                quote
            }
            Err(e) => {
                // 重新读取一次，可能已被并发的刷新写入
                match self.cache.get(&key).or(cached) {
                    Some(entry) => {
                        warn!("Error fetching price for {}: {}; serving cached quote from {}", key, e, entry.fetched_at);
                        let stale = !QuoteCache::is_fresh(&entry, now, self.ttl);
                        let mut quote = entry.quote;
                        quote.stale = stale;
                        quote
                    }
                    None => {
                        warn!("Error fetching price for {}: {}; no cached quote available", key, e);
                        PriceQuote::failed(&key, &format!("Failed to fetch price: {}", e), now)
                    }
                }
            }
        }
    }

    /// 查询历史价格；不缓存
    ///
    /// `end` 缺省为 `now`，`start` 缺省为 `end` 往前一个默认窗口（24 小时）。
    pub async fn history(
        &self,
        symbol: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        interval_secs: Option<u64>,
        now: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>> {
        let key = util::normalize_symbol(symbol);
        if key.is_empty() {
            return Err(PriceHubError::ValidationError("Symbol is required".to_string()));
        }

        let end = end.unwrap_or(now);
        let start = start.unwrap_or(end - self.history_window);
        if start > end {
            return Err(PriceHubError::ValidationError(format!(
                "Start {} is after end {}", start, end
            )));
        }

        let interval = interval_secs.unwrap_or(self.config.default_history_interval_secs);
        if interval == 0 {
            return Err(PriceHubError::ValidationError("Interval must be positive".to_string()));
        }
        // 上游以毫秒计，换算后必须能放进 u64
        if interval.checked_mul(1000).is_none() {
            return Err(PriceHubError::ValidationError(format!("Interval {}s is too large", interval)));
        }

        self.oracle
            .fetch_history(&key, start, end, interval)
            .await
            .map_err(|e| {
                error!("Error fetching historical data for {}: {}", key, e);
                e
            })
    }

    /// 处理批量报价请求
    pub async fn handle_prices(&self, request: &PriceRequest, now: DateTime<Utc>) -> Result<PricesResponse> {
        let symbols = request.symbols()?;
        let prices = self.resolve(symbols.as_slice(), now).await;

        let failed = prices.iter().filter(|q| q.is_error()).count();
        if failed > 0 {
            warn!("{} of {} symbols have no price", failed, prices.len());
        }

        Ok(PricesResponse { prices, timestamp: now })
    }

    /// 处理历史价格请求
    pub async fn handle_history(&self, request: &HistoryRequest, now: DateTime<Utc>) -> Result<HistoryResponse> {
        let symbol = request.symbol()?;
        let data = self
            .history(&symbol, request.start()?, request.end()?, request.interval, now)
            .await?;

        Ok(HistoryResponse { symbol, data, timestamp: now })
    }
}
