use pricehub::config::Config;
use pricehub::oracles::redstone::RedstoneOracle;
use pricehub::services::quote_service::QuoteService;
use pricehub::services::requests::{parse_symbols, ErrorResponse, HistoryRequest};
use pricehub::PriceQuote;

use anyhow::Context;
use clap::{App, Arg, ArgMatches, SubCommand};
use chrono::Utc;
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::init();

    let app = App::new("PriceHub")
        .version("1.0.0")
        .about("Cached crypto price quotes backed by the RedStone oracle")
        .arg(
            Arg::with_name("ttl")
                .long("ttl")
                .value_name("SECONDS")
                .help("Seconds a cached quote is served without refreshing")
                .takes_value(true)
                .global(true)
                .default_value("30"),
        )
        .arg(
            Arg::with_name("timeout")
                .long("timeout")
                .value_name("SECONDS")
                .help("HTTP timeout for oracle requests")
                .takes_value(true)
                .global(true)
                .default_value("30"),
        )
        .arg(
            Arg::with_name("oracle-url")
                .long("oracle-url")
                .value_name("URL")
                .help("Base URL of the price oracle API")
                .takes_value(true)
                .global(true),
        )
        .arg(
            Arg::with_name("provider")
                .long("provider")
                .value_name("PROVIDER")
                .help("Oracle data provider name")
                .takes_value(true)
                .global(true),
        )
        .arg(
            Arg::with_name("max-entries")
                .long("max-entries")
                .value_name("COUNT")
                .help("Cap the number of cached symbols (unbounded by default)")
                .takes_value(true)
                .global(true),
        );

    let app = app.subcommand(
        SubCommand::with_name("quotes")
            .about("Fetch the latest quote for each symbol")
            .arg(
                Arg::with_name("symbols")
                    .short('s')
                    .long("symbols")
                    .value_name("SYMBOLS")
                    .help("Symbols separated by commas or spaces, e.g. BTC,ETH,SOL")
                    .required(true)
                    .takes_value(true),
            ),
    ).subcommand(
        SubCommand::with_name("watch")
            .about("Poll quotes on a fixed interval until interrupted")
            .arg(
                Arg::with_name("symbols")
                    .short('s')
                    .long("symbols")
                    .value_name("SYMBOLS")
                    .help("Symbols to watch")
                    .takes_value(true)
                    .default_value("BTC,ETH,SOL"),
            )
            .arg(
                Arg::with_name("interval")
                    .short('i')
                    .long("interval")
                    .value_name("SECONDS")
                    .help("Polling interval in seconds")
                    .takes_value(true)
                    .default_value("30"),
            ),
    ).subcommand(
        SubCommand::with_name("history")
            .about("Fetch historical prices for a symbol")
            .arg(
                Arg::with_name("symbol")
                    .short('s')
                    .long("symbol")
                    .value_name("SYMBOL")
                    .help("Symbol to fetch history for")
                    .required(true)
                    .takes_value(true),
            )
            .arg(
                Arg::with_name("start")
                    .long("start")
                    .value_name("RFC3339")
                    .help("Range start (defaults to 24h before end)")
                    .takes_value(true),
            )
            .arg(
                Arg::with_name("end")
                    .long("end")
                    .value_name("RFC3339")
                    .help("Range end (defaults to now)")
                    .takes_value(true),
            )
            .arg(
                Arg::with_name("interval")
                    .short('i')
                    .long("interval")
                    .value_name("SECONDS")
                    .help("Interval between points in seconds")
                    .takes_value(true),
            ),
    );

    let matches = app.get_matches();
    let config = build_config(&matches)?;

    let oracle = Arc::new(RedstoneOracle::new(&config)?);
    let service = QuoteService::new(config, oracle)?;

    if let Some(matches) = matches.subcommand_matches("quotes") {
        let symbols = parse_symbols(matches.value_of("symbols").unwrap_or_default())?;
        let quotes = service.resolve_now(symbols.as_slice()).await;
        println!("{}", serde_json::to_string_pretty(&quotes)?);
    } else if let Some(matches) = matches.subcommand_matches("watch") {
        let symbols = parse_symbols(matches.value_of("symbols").unwrap_or("BTC,ETH,SOL"))?;
        let interval = parse_positive_seconds(matches.value_of("interval"), service.config().poll_interval)?;
        watch(&service, &symbols, interval).await;
    } else if let Some(matches) = matches.subcommand_matches("history") {
        let request = HistoryRequest {
            symbol: matches.value_of("symbol").map(str::to_string),
            start_date: matches.value_of("start").map(str::to_string),
            end_date: matches.value_of("end").map(str::to_string),
            interval: matches.value_of("interval")
                .map(|v| v.parse::<u64>())
                .transpose()
                .context("interval must be a whole number of seconds")?,
        };

        match service.handle_history(&request, Utc::now()).await {
            Ok(response) => println!("{}", serde_json::to_string_pretty(&response)?),
            Err(e) => {
                let (status, body) = ErrorResponse::from_error(&e);
                println!("{}", serde_json::to_string_pretty(&body)?);
                anyhow::bail!("history request failed with status {}", status);
            }
        }
    } else {
        info!("No command specified. Use --help for usage information.");
    }

    Ok(())
}

fn build_config(matches: &ArgMatches) -> anyhow::Result<Config> {
    let mut config = Config::new()
        .with_cache_ttl(parse_seconds(matches.value_of("ttl"), Duration::from_secs(30))?)
        .with_request_timeout(parse_positive_seconds(matches.value_of("timeout"), Duration::from_secs(30))?);

    if let Some(url) = matches.value_of("oracle-url") {
        config = config.with_oracle_base_url(url);
    }
    if let Some(provider) = matches.value_of("provider") {
        config = config.with_oracle_provider(provider);
    }
    if let Some(max) = matches.value_of("max-entries") {
        config = config.with_max_cache_entries(Some(parse_max_entries(max)?));
    }

    info!("Using cache TTL {:?}", config.cache_ttl);
    Ok(config)
}

fn parse_seconds(value: Option<&str>, default: Duration) -> anyhow::Result<Duration> {
    match value {
        Some(v) => {
            let secs = v.parse::<u64>().with_context(|| format!("invalid number of seconds: {}", v))?;
            Ok(Duration::from_secs(secs))
        }
        None => Ok(default),
    }
}

// 轮询间隔和超时不能为 0
fn parse_positive_seconds(value: Option<&str>, default: Duration) -> anyhow::Result<Duration> {
    let duration = parse_seconds(value, default)?;
    if duration.is_zero() {
        anyhow::bail!("number of seconds must be positive, got 0");
    }
    Ok(duration)
}

fn parse_max_entries(value: &str) -> anyhow::Result<usize> {
    let max = value.parse::<usize>().context("max-entries must be a positive integer")?;
    if max == 0 {
        anyhow::bail!("max-entries must be a positive integer, got 0");
    }
    Ok(max)
}

// 按固定间隔轮询，直到收到 Ctrl-C
async fn watch(service: &QuoteService, symbols: &[String], interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    info!("Watching {} symbols every {:?}", symbols.len(), interval);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = Utc::now();
                for quote in service.resolve(symbols, now).await {
                    print_quote(&quote, now);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping watch");
                break;
            }
        }
    }
}

fn print_quote(quote: &PriceQuote, now: chrono::DateTime<Utc>) {
    match &quote.error {
        Some(error) => warn!("{:<8} {}", quote.symbol, error),
        None => {
            let change = quote.change_24h
                .map(|c| format!("{:+.2}%", c))
                .unwrap_or_else(|| "-".to_string());
            let marker = if quote.stale { " (stale)" } else { "" };
            info!("{:<8} {:>14.4} {:>9} age {}s{}",
                  quote.symbol, quote.price, change, quote.age(now).num_seconds(), marker);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_interval_is_rejected() {
        let err = parse_positive_seconds(Some("0"), Duration::from_secs(30)).unwrap_err();
        assert!(err.to_string().contains("positive"));
        assert_eq!(
            parse_positive_seconds(Some("15"), Duration::from_secs(30)).unwrap(),
            Duration::from_secs(15)
        );
        assert_eq!(
            parse_positive_seconds(None, Duration::from_secs(30)).unwrap(),
            Duration::from_secs(30)
        );
    }

    #[test]
    fn zero_ttl_is_allowed() {
        assert_eq!(parse_seconds(Some("0"), Duration::from_secs(30)).unwrap(), Duration::ZERO);
    }

    #[test]
    fn max_entries_must_be_positive() {
        assert!(parse_max_entries("0").is_err());
        assert!(parse_max_entries("-3").is_err());
        assert_eq!(parse_max_entries("64").unwrap(), 64);
    }
}
