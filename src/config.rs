use std::time::Duration;

pub const DEFAULT_ORACLE_URL: &str = "https://api.redstone.finance";
pub const DEFAULT_ORACLE_PROVIDER: &str = "redstone";

#[derive(Debug, Clone)]
pub struct Config {
    pub cache_ttl: Duration,
    pub request_timeout: Duration,
    pub oracle_base_url: String,
    pub oracle_provider: String,
    pub max_cache_entries: Option<usize>,  // None 表示不限制缓存条目数
    pub default_history_window: Duration,
    pub default_history_interval_secs: u64,
    pub poll_interval: Duration,
}

impl Config {
    pub fn new() -> Self {
        Self {
            cache_ttl: Duration::from_secs(30),
            request_timeout: Duration::from_secs(30),
            oracle_base_url: DEFAULT_ORACLE_URL.to_string(),
            oracle_provider: DEFAULT_ORACLE_PROVIDER.to_string(),
            max_cache_entries: None,
            default_history_window: Duration::from_secs(24 * 60 * 60),
            default_history_interval_secs: 3600,
            poll_interval: Duration::from_secs(30),
        }
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_oracle_base_url(mut self, url: &str) -> Self {
        self.oracle_base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_oracle_provider(mut self, provider: &str) -> Self {
        self.oracle_provider = provider.to_string();
        self
    }

    /// 为缓存设置上限；超出时淘汰最久未写入的条目
    pub fn with_max_cache_entries(mut self, max: Option<usize>) -> Self {
        self.max_cache_entries = max;
        self
    }

    pub fn with_default_history_window(mut self, window: Duration) -> Self {
        self.default_history_window = window;
        self
    }

    pub fn with_default_history_interval_secs(mut self, secs: u64) -> Self {
        self.default_history_interval_secs = secs;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
