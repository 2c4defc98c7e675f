//! Bitcoin price ticker CLI
//!
//! Subcommands:
//!   - `price`   — Print the current fiat price
//!   - `history` — Print the fetched price history
//!   - `ohlc`    — Print OHLC candles
//!   - `ohlcv`   — Print OHLC candles with a volume column

use anyhow::Result;
use clap::{Parser, Subcommand};
use ticker_core::{Interval, ProviderKind};
use ticker_services::{PriceService, PriceServiceConfig};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(
    name = "btc-ticker",
    version,
    about = "Bitcoin price ticker for CoinGecko, Bit2Me and mempool.space",
    propagate_version = true
)]
struct Cli {
    /// Log verbosity, 0 (errors only) to 4 (debug)
    #[arg(long, global = true, default_value_t = 3)]
    verbose: u8,

    /// Price data provider to query first
    #[arg(long, global = true, default_value = "mempool")]
    service: ProviderKind,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the current price in the given fiat currency
    Price { currency: String },
    /// Fetch history and print the stored time series
    History { currency: String, interval: Interval },
    /// Fetch history and print OHLC candles
    Ohlc { currency: String, interval: Interval },
    /// Fetch history and print OHLC candles with a volume column
    Ohlcv { currency: String, interval: Interval },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 | 1 => LevelFilter::ERROR,
        2 => LevelFilter::WARN,
        3 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(level.to_string())),
        )
        .init();
}

fn service_config(cli: &Cli) -> PriceServiceConfig {
    PriceServiceConfig {
        service: cli.service,
        ..PriceServiceConfig::default()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Optional .env for provider credentials
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Price { currency } => {
            let config = PriceServiceConfig {
                fiat: currency.clone(),
                enable_ohlc: false,
                enable_timeseries: false,
                ..service_config(&cli)
            };
            let mut service = PriceService::from_config(config)?;
            println!("{}", service.get_price_now().await);
        }
        Commands::History { currency, interval } => {
            let config = PriceServiceConfig {
                fiat: currency.clone(),
                interval: *interval,
                enable_ohlc: false,
                enable_timeseries: true,
                ..service_config(&cli)
            };
            let mut service = PriceService::from_config(config)?;
            service.refresh_with_fallback().await;
            for sample in service.series().samples() {
                println!("{}\t{}", sample.timestamp.to_rfc3339(), sample.price);
            }
        }
        Commands::Ohlc { currency, interval } => {
            let mut service = ohlc_service(&cli, currency, *interval)?;
            service.refresh_with_fallback().await;
            for candle in service.ohlc() {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    candle.timestamp.to_rfc3339(),
                    candle.open,
                    candle.high,
                    candle.low,
                    candle.close
                );
            }
        }
        Commands::Ohlcv { currency, interval } => {
            let mut service = ohlc_service(&cli, currency, *interval)?;
            service.refresh_with_fallback().await;
            for candle in service.ohlcv() {
                println!(
                    "{}\t{}\t{}\t{}\t{}\t{}",
                    candle.timestamp.to_rfc3339(),
                    candle.open,
                    candle.high,
                    candle.low,
                    candle.close,
                    candle.volume.unwrap_or(0.0)
                );
            }
        }
    }

    Ok(())
}

fn ohlc_service(cli: &Cli, currency: &str, interval: Interval) -> Result<PriceService> {
    let config = PriceServiceConfig {
        fiat: currency.to_string(),
        interval,
        ohlc_interval: interval,
        enable_ohlc: true,
        enable_timeseries: true,
        ..service_config(cli)
    };
    Ok(PriceService::from_config(config)?)
}
