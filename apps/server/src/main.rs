//! Price Watch Bot - Telegram server
//!
//! Tracks the price of a crypto pair and sends each subscribed chat periodic
//! updates and one-shot threshold alerts.

mod config;
mod price_logger;

use clap::Parser;
use config::{bot_token_from_env, AppConfig};
use pricewatch_alerts::{CommandRouter, TelegramBot, TelegramTransport};
use pricewatch_engine::PriceWatch;
use pricewatch_feeds::{build_price_source, PriceSourceKind};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use teloxide::Bot;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Price Watch Bot CLI
#[derive(Parser, Debug)]
#[command(name = "pricewatch-bot")]
#[command(about = "Telegram bot for periodic crypto price updates and alerts", long_about = None)]
struct Args {
    /// Configuration file path (JSON, optional)
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Price source: binance, coingecko
    #[arg(short, long)]
    source: Option<String>,

    /// Tracked pair, e.g. BTC/USDT
    #[arg(short, long)]
    pair: Option<String>,

    /// Default notification interval in seconds
    #[arg(short, long)]
    interval: Option<u64>,

    /// Log the price every N seconds (0 disables)
    #[arg(long)]
    price_log_interval: Option<u64>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short, long)]
    log_level: Option<String>,
}

impl Args {
    /// Overlay command-line flags onto the loaded configuration.
    fn apply(&self, config: &mut AppConfig) -> Result<(), String> {
        if let Some(source) = &self.source {
            config.price_source = PriceSourceKind::parse(source)
                .ok_or_else(|| format!("unknown price source '{}'", source))?;
        }
        if let Some(pair) = &self.pair {
            config.pair = pair.clone();
        }
        if let Some(interval) = self.interval {
            config.default_interval_secs = interval;
        }
        if let Some(period) = self.price_log_interval {
            config.price_log_interval_secs = period;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        Ok(())
    }
}

fn init_logging(level: &str) {
    let level = match level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let loaded = AppConfig::load(&args.config);
    let mut config = loaded.as_ref().cloned().unwrap_or_default();
    let overlay = args.apply(&mut config);

    init_logging(&config.log_level);

    if let Err(e) = loaded {
        error!("Failed to load {}: {}", args.config.display(), e);
        return ExitCode::FAILURE;
    }
    if let Err(e) = overlay {
        error!("Invalid arguments: {}", e);
        return ExitCode::FAILURE;
    }
    if let Err(e) = config.validate() {
        error!("{}", e);
        return ExitCode::FAILURE;
    }

    let token = match bot_token_from_env() {
        Ok(token) => token,
        Err(e) => {
            error!("{} (set it in the environment or in .env)", e);
            return ExitCode::FAILURE;
        }
    };

    let pair = match config.pair() {
        Ok(pair) => pair,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("🚀 Price Watch Bot starting...");
    info!("  Source: {:?}", config.price_source);
    info!("  Pair: {}", pair);
    info!("  Default interval: {}s", config.default_interval_secs);
    info!("  Retention cap: {} messages", config.retention_cap);

    let source = match build_price_source(config.price_source, pair, config.request_timeout()) {
        Ok(source) => source,
        Err(e) => {
            error!("Failed to create price source: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match source.fetch_price().await {
        Ok(price) => info!("Initial {} price: {}", source.pair(), price),
        Err(e) => warn!("Initial price fetch failed: {}", e),
    }

    let bot = Bot::new(token);
    let transport = Arc::new(TelegramTransport::new(bot.clone()));
    let watch = Arc::new(PriceWatch::new(
        config.engine_config(),
        Arc::clone(&source),
        transport,
    ));
    let telegram = Arc::new(TelegramBot::new(bot, CommandRouter::new(Arc::clone(&watch))));

    let logger_handle = (config.price_log_interval_secs > 0).then(|| {
        let period = Duration::from_secs(config.price_log_interval_secs);
        tokio::spawn(price_logger::run_price_logger(Arc::clone(&source), period))
    });

    info!("Press Ctrl+C to stop...");

    // Returns once the dispatcher's Ctrl+C handler fires.
    telegram.run().await;

    warn!("Shutdown signal received");
    watch.shutdown();
    if let Some(handle) = logger_handle {
        handle.abort();
    }

    info!("👋 Price Watch Bot stopped");
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(argv: &[&str]) -> Args {
        Args::parse_from(std::iter::once("pricewatch-bot").chain(argv.iter().copied()))
    }

    #[test]
    fn test_args_defaults_leave_config_untouched() {
        let mut config = AppConfig::default();
        args(&[]).apply(&mut config).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_args_override_config() {
        let mut config = AppConfig::default();
        args(&[
            "--source",
            "coingecko",
            "--pair",
            "ETH/USDT",
            "--interval",
            "120",
            "--log-level",
            "debug",
        ])
        .apply(&mut config)
        .unwrap();

        assert_eq!(config.price_source, PriceSourceKind::CoinGecko);
        assert_eq!(config.pair, "ETH/USDT");
        assert_eq!(config.default_interval_secs, 120);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_args_reject_unknown_source() {
        let mut config = AppConfig::default();
        assert!(args(&["--source", "kraken"]).apply(&mut config).is_err());
    }
}
