use chrono::{DateTime, Duration, Utc};
use log::debug;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::models::quote::{CacheEntry, PriceQuote};

struct Slot {
    entry: CacheEntry,
    // 写入序号，用于按写入先后淘汰
    written: u64,
}

struct Inner {
    slots: HashMap<String, Slot>,
    next_write: u64,
}

/// 报价缓存：币种 -> 最近一次成功获取的报价
///
/// 只保存成功的报价，错误结果不会进入缓存。所有读写都在同一把锁内完成，
/// 并发刷新同一币种时以最后一次写入为准。键应当是已经规范化的大写代码。
pub struct QuoteCache {
    inner: Mutex<Inner>,
    max_entries: Option<usize>,
}

impl QuoteCache {
    /// 创建缓存；`max_entries` 为 None 时不限制条目数
    pub fn new(max_entries: Option<usize>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                slots: HashMap::new(),
                next_write: 0,
            }),
            max_entries,
        }
    }

    /// 创建不限制大小的缓存
    pub fn unbounded() -> Self {
        Self::new(None)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 纯查找，不触发上游请求；返回副本
    pub fn get(&self, symbol: &str) -> Option<CacheEntry> {
        self.lock().slots.get(symbol).map(|slot| slot.entry.clone())
    }

    /// 无条件覆盖该币种的条目
    pub fn put(&self, symbol: &str, quote: PriceQuote, fetched_at: DateTime<Utc>) {
        debug_assert!(quote.error.is_none(), "error quote for {} must not be cached", symbol);
        let mut inner = self.lock();
        let written = inner.next_write;
        inner.next_write += 1;

        if let Some(max) = self.max_entries {
            if !inner.slots.contains_key(symbol) && inner.slots.len() >= max {
                let oldest = inner.slots.iter()
                    .min_by_key(|(_, slot)| slot.written)
                    .map(|(key, _)| key.clone());
                if let Some(oldest) = oldest {
                    debug!("Cache full ({} entries), evicting {}", max, oldest);
                    inner.slots.remove(&oldest);
                }
            }
        }

        inner.slots.insert(symbol.to_string(), Slot {
            entry: CacheEntry::new(quote, fetched_at),
            written,
        });
    }

    /// `now - fetched_at < ttl`
    pub fn is_fresh(entry: &CacheEntry, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - entry.fetched_at < ttl
    }

    pub fn len(&self) -> usize {
        self.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 当前缓存的所有币种，按字母排序
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.lock().slots.keys().cloned().collect();
        symbols.sort();
        symbols
    }
}

impl Default for QuoteCache {
    fn default() -> Self {
        Self::unbounded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::quote::OracleQuote;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn quote(symbol: &str, price: f64, secs: i64) -> PriceQuote {
        PriceQuote::from_oracle(symbol, OracleQuote::new(price), at(secs))
    }

    #[test]
    fn get_on_empty_cache_is_none() {
        let cache = QuoteCache::unbounded();
        assert!(cache.get("BTC").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn put_overwrites_without_merging() {
        let cache = QuoteCache::unbounded();
        let mut first = quote("BTC", 50_000.0, 0);
        first.change_24h = Some(2.0);
        cache.put("BTC", first, at(0));
        cache.put("BTC", quote("BTC", 51_000.0, 40), at(40));

        let entry = cache.get("BTC").unwrap();
        assert_eq!(entry.quote.price, 51_000.0);
        assert_eq!(entry.fetched_at, at(40));
        assert_eq!(entry.quote.change_24h, None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn freshness_boundary_is_exclusive() {
        let cache = QuoteCache::unbounded();
        cache.put("ETH", quote("ETH", 3_000.0, 0), at(0));
        let entry = cache.get("ETH").unwrap();
        let ttl = Duration::seconds(30);

        assert!(QuoteCache::is_fresh(&entry, at(29), ttl));
        assert!(!QuoteCache::is_fresh(&entry, at(30), ttl));
    }

    #[test]
    fn returned_entries_are_copies() {
        let cache = QuoteCache::unbounded();
        cache.put("SOL", quote("SOL", 100.0, 0), at(0));

        let mut copy = cache.get("SOL").unwrap();
        copy.quote.price = 1.0;
        assert_eq!(cache.get("SOL").unwrap().quote.price, 100.0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "must not be cached")]
    fn error_quotes_are_refused() {
        let cache = QuoteCache::unbounded();
        cache.put("BTC", PriceQuote::failed("BTC", "Failed to fetch price", at(0)), at(0));
    }

    #[test]
    fn capped_cache_evicts_oldest_write() {
        let cache = QuoteCache::new(Some(2));
        cache.put("BTC", quote("BTC", 1.0, 0), at(0));
        cache.put("ETH", quote("ETH", 2.0, 1), at(1));
        // 重写 BTC 使 ETH 成为最早写入
        cache.put("BTC", quote("BTC", 1.5, 2), at(2));
        cache.put("SOL", quote("SOL", 3.0, 3), at(3));

        assert_eq!(cache.symbols(), vec!["BTC".to_string(), "SOL".to_string()]);
    }
}
