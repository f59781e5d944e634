use pricehub::config::Config;
use pricehub::oracles::redstone::RedstoneOracle;
use pricehub::QuoteService;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = Config::new();
    let oracle = Arc::new(RedstoneOracle::new(&config)?);
    let service = QuoteService::new(config, oracle)?;

    let watchlist = ["BTC", "ETH", "SOL", "eth"];

    // 第一次请求会访问上游，第二次在 TTL 内直接命中缓存
    for round in 1..=2 {
        println!("\n第 {} 轮:", round);
        println!("{:<8} {:>14} {:>10} {:<6}", "币种", "价格", "24h涨跌", "状态");
        println!("{:-<44}", "");

        for quote in service.resolve_now(&watchlist[..]).await {
            let change = quote.change_24h
                .map(|c| format!("{:+.2}%", c))
                .unwrap_or_else(|| "-".to_string());
            let status = match (&quote.error, quote.stale) {
                (Some(_), _) => "错误",
                (None, true) => "过期",
                (None, false) => "正常",
            };
            println!("{:<8} {:>14.4} {:>10} {:<6}", quote.symbol, quote.price, change, status);
        }
    }

    println!("\n缓存币种: {:?}", service.cache().symbols());
    Ok(())
}
