//! EXMO Sniper - Arbitrage Route Detection
//!
//! Run with: cargo run -- top
//!
//! Pulls the EXMO order books, runs a max-product Floyd-Warshall over
//! every currency and ranks each loop `i -> … -> j -> i` by how much the
//! best chain beats the direct quote.

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod brain;
mod cartographer;
mod config;
mod error;
mod model;
mod report;
mod service;

use cartographer::{ExmoClient, MarketData};
use config::{Config, OutputFormat};
use service::{ArbitrageService, CurrencyFilter};

#[derive(Debug, Parser)]
#[command(name = "exmo-sniper", version, about = "Find currency arbitrage loops on EXMO")]
struct Cli {
    /// TOML config file (environment is used when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print JSON instead of a table
    #[arg(long, global = true)]
    json: bool,

    /// Hide loops below this profit percent
    #[arg(long, global = true, allow_hyphen_values = true)]
    min_profit: Option<f64>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Best loops only (default)
    Top {
        /// Rows to show
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Every ranked loop
    All,
    /// Currencies the scan works with
    Currencies,
    /// Rescan on an interval until Ctrl-C
    Watch {
        /// Seconds between scans
        #[arg(short, long)]
        interval: Option<u64>,
        /// Rows to show per scan
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Write the effective configuration to a TOML file
    SaveConfig { path: PathBuf },
}

fn print_banner() {
    println!();
    println!(
        "{}",
        style("═══════════════════════════════════════════════════════════════").cyan()
    );
    println!(
        "{}",
        style(" 🎯 EXMO SNIPER - Arbitrage Route Detection").cyan().bold()
    );
    println!(
        "{}",
        style("    Max-product Floyd-Warshall | Bid/Ask aware").cyan()
    );
    println!(
        "{}",
        style("═══════════════════════════════════════════════════════════════").cyan()
    );
    println!();
}

fn spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

/// One scan, printed according to `config`
async fn run_scan<M: MarketData>(
    service: &ArbitrageService<M>,
    config: &Config,
    limit: Option<usize>,
) -> Result<()> {
    let bar = (config.output == OutputFormat::Table).then(|| spinner("Fetching order books..."));
    let result = service.scan().await;
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    let scan = result?;
    let rows = report::select(&scan.opportunities, config.min_profit_pct, limit);

    match config.output {
        OutputFormat::Table => report::print_table(&scan, &rows),
        OutputFormat::Json => println!("{}", report::render_json(&scan, &rows)?),
    }

    Ok(())
}

async fn watch<M: MarketData>(
    service: &ArbitrageService<M>,
    config: &Config,
    limit: Option<usize>,
) -> Result<()> {
    let mut ticker = tokio::time::interval(Duration::from_secs(config.scan_interval_secs));
    info!("Watching every {}s (Ctrl-C to stop)", config.scan_interval_secs);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // A failed scan is reported and the next tick tries again
                if let Err(e) = run_scan(service, config, limit).await {
                    warn!("Scan failed: {}", e);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping watch");
                return Ok(());
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("exmo_sniper=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    if cli.json {
        config.output = OutputFormat::Json;
    }
    if cli.min_profit.is_some() {
        config.min_profit_pct = cli.min_profit;
    }

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        return Err(e);
    }

    if config.output == OutputFormat::Table {
        print_banner();
        config.print_summary();
    }

    let client = ExmoClient::new(
        config.api_url.clone(),
        Duration::from_secs(config.http_timeout_secs),
        Duration::from_secs(config.cache_ttl_secs),
    )?;
    let filter = CurrencyFilter::new(&config.whitelisted_currencies, &config.blacklisted_currencies);
    let service = ArbitrageService::with_filter(client, filter);

    match cli.command.unwrap_or(Command::Top { limit: None }) {
        Command::Top { limit } => {
            run_scan(&service, &config, Some(limit.unwrap_or(config.top_results))).await?
        }
        Command::All => run_scan(&service, &config, None).await?,
        Command::Currencies => {
            let currencies = service.currency_list().await?;
            match config.output {
                OutputFormat::Table => report::print_currencies(&currencies),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&currencies)?),
            }
        }
        Command::Watch { interval, limit } => {
            if let Some(secs) = interval {
                config.scan_interval_secs = secs.max(1);
            }
            watch(&service, &config, Some(limit.unwrap_or(config.top_results))).await?
        }
        Command::SaveConfig { path } => {
            config.save_to_file(&path)?;
            println!("{} Configuration written to {}", style("✓").green(), path.display());
        }
    }

    Ok(())
}
