// 公开导出的模块，供外部使用
pub mod models;
pub mod oracles;
pub mod cache;
pub mod services;
pub mod errors;
pub mod config;

#[doc(hidden)]
pub mod util;

// 重新导出常用类型，方便使用
pub use models::quote::{PriceQuote, PricePoint, CacheEntry, OracleQuote};
pub use oracles::base::PriceOracle;
pub use cache::QuoteCache;
pub use services::quote_service::QuoteService;
pub use config::Config;
pub use errors::{Result, PriceHubError};
