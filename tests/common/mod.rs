#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use pricehub::errors::{PriceHubError, Result};
use pricehub::{Config, OracleQuote, PriceOracle, PricePoint, QuoteService};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::Barrier;

#[derive(Debug, Clone)]
pub enum Outcome {
    Price(f64),
    Fail(&'static str),
    /// Fails only after sleeping, so a faster fetch can land first.
    SlowFail(&'static str, std::time::Duration),
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryCall {
    pub symbol: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub interval_secs: u64,
}

/// In-memory oracle that replays scripted outcomes and counts calls.
///
/// Each symbol has a queue of outcomes; the last one repeats once the
/// queue is drained. Unscripted symbols fail.
#[derive(Default)]
pub struct ScriptedOracle {
    outcomes: Mutex<HashMap<String, VecDeque<Outcome>>>,
    calls: Mutex<HashMap<String, usize>>,
    history: Mutex<Option<std::result::Result<Vec<PricePoint>, &'static str>>>,
    history_calls: Mutex<Vec<HistoryCall>>,
    barrier: Option<Barrier>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `fetch_price` waits until `n` fetches are in flight at once.
    pub fn with_barrier(n: usize) -> Self {
        Self {
            barrier: Some(Barrier::new(n)),
            ..Self::default()
        }
    }

    pub fn script(&self, symbol: &str, outcomes: Vec<Outcome>) {
        self.outcomes
            .lock()
            .unwrap()
            .insert(symbol.to_string(), outcomes.into_iter().collect());
    }

    pub fn set_history(&self, result: std::result::Result<Vec<PricePoint>, &'static str>) {
        *self.history.lock().unwrap() = Some(result);
    }

    pub fn calls(&self, symbol: &str) -> usize {
        self.calls.lock().unwrap().get(symbol).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    pub fn history_calls(&self) -> Vec<HistoryCall> {
        self.history_calls.lock().unwrap().clone()
    }

    fn next_outcome(&self, symbol: &str) -> Option<Outcome> {
        let mut outcomes = self.outcomes.lock().unwrap();
        let queue = outcomes.get_mut(symbol)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl PriceOracle for ScriptedOracle {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn fetch_price(&self, symbol: &str) -> Result<OracleQuote> {
        *self.calls.lock().unwrap().entry(symbol.to_string()).or_insert(0) += 1;
        // Outcomes are handed out in call order.
        let outcome = self.next_outcome(symbol);

        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }

        match outcome {
            Some(Outcome::Price(value)) => Ok(OracleQuote::new(value)),
            Some(Outcome::Fail(reason)) => Err(PriceHubError::OracleError(reason.to_string())),
            Some(Outcome::SlowFail(reason, delay)) => {
                tokio::time::sleep(delay).await;
                Err(PriceHubError::OracleError(reason.to_string()))
            }
            None => Err(PriceHubError::OracleError(format!("unknown symbol {}", symbol))),
        }
    }

    async fn fetch_history(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval_secs: u64,
    ) -> Result<Vec<PricePoint>> {
        self.history_calls.lock().unwrap().push(HistoryCall {
            symbol: symbol.to_string(),
            start,
            end,
            interval_secs,
        });

        match self.history.lock().unwrap().clone() {
            Some(Ok(points)) => Ok(points),
            Some(Err(reason)) => Err(PriceHubError::OracleError(reason.to_string())),
            None => Ok(Vec::new()),
        }
    }
}

/// Fixed origin so tests can talk about `t=0`, `t=10`, ...
pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::seconds(secs)
}

pub fn service_with(oracle: &Arc<ScriptedOracle>, config: Config) -> QuoteService {
    let oracle: Arc<dyn PriceOracle + Send + Sync> = oracle.clone();
    QuoteService::new(config, oracle).expect("service")
}

pub fn service(oracle: &Arc<ScriptedOracle>) -> QuoteService {
    service_with(oracle, Config::new())
}
