//! rusty-portfolio CLI - Command-line interface for the portfolio tracker
//!
//! Manages the transaction ledger and prints the dashboard, dividend income
//! and asset scores.
//!
//! ## Example Usage
//!
//! ```bash
//! # Record a purchase
//! rusty-portfolio add PETR4.SA 2023-01-10 100 25.30 --type Ação
//!
//! # Bulk import
//! rusty-portfolio import transactions.csv
//!
//! # Dashboard as JSON
//! rusty-portfolio --json dashboard
//!
//! # Score a ticker
//! rusty-portfolio analyze vale3
//! ```

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use rusty_portfolio::config::PortfolioConfig;
use rusty_portfolio::data::sources::YahooProvider;
use rusty_portfolio::data::MarketDataProvider;
use rusty_portfolio::finance::scoring::{AssetScore, Status, Verdict};
use rusty_portfolio::finance::transaction::{display_symbol, NewTransaction};
use rusty_portfolio::finance::{DividendReport, Transaction};
use rusty_portfolio::service::{Dashboard, PortfolioService};
use rusty_portfolio::store::import;
use rusty_portfolio::store::{LedgerStore, SqliteLedger};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

/// Timeout for each market-data request
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// rusty-portfolio: personal investment portfolio tracker
#[derive(Parser)]
#[command(name = "rusty-portfolio")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "Robert Fall")]
#[command(about = "Personal investment portfolio tracker", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a transaction (negative quantity for a sale)
    Add {
        #[command(flatten)]
        txn: TransactionArgs,
    },

    /// Bulk import transactions from a .json or .csv file
    Import {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// List transactions, most recent first
    List,

    /// Replace a transaction
    Update {
        id: i64,

        #[command(flatten)]
        txn: TransactionArgs,
    },

    /// Delete a transaction
    Delete { id: i64 },

    /// Delete every transaction
    Clear {
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },

    /// Portfolio valuation, evolution chart and asset table
    Dashboard {
        /// Valuation date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Dividend income received by the portfolio
    Earnings,

    /// Score a ticker on listing age, profitability, leverage and governance
    Analyze {
        ticker: String,

        /// Reference date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Latest price of a ticker
    Price { ticker: String },
}

#[derive(clap::Args)]
struct TransactionArgs {
    /// Ticker, e.g. PETR4.SA
    ticker: String,

    /// Trade date (YYYY-MM-DD)
    date: String,

    /// Units (negative for a sale)
    #[arg(allow_hyphen_values = true)]
    quantity: f64,

    /// Price per unit
    price: f64,

    /// Asset class
    #[arg(short = 't', long = "type", default_value = "Ação")]
    asset_type: String,
}

impl TransactionArgs {
    fn to_new(&self) -> anyhow::Result<NewTransaction> {
        Ok(NewTransaction::new(
            &self.ticker,
            parse_date(&self.date)?,
            self.quantity,
            self.price,
            &self.asset_type,
        ))
    }
}

fn home_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".rusty-portfolio")
}

fn default_config() -> PortfolioConfig {
    PortfolioConfig {
        database_path: home_dir().join("portfolio.db"),
        ..PortfolioConfig::default()
    }
}

fn load_config(path: Option<&Path>) -> PortfolioConfig {
    if let Some(config_path) = path {
        if config_path.exists() {
            match fs::read_to_string(config_path) {
                Ok(contents) => match toml::from_str(&contents) {
                    Ok(config) => return config,
                    Err(e) => {
                        eprintln!("{} Failed to parse config: {}", "Warning:".yellow(), e);
                    }
                },
                Err(e) => {
                    eprintln!("{} Failed to read config: {}", "Warning:".yellow(), e);
                }
            }
        }
    } else {
        // Try default location
        let default_path = home_dir().join("config.toml");
        if default_path.exists() {
            if let Ok(contents) = fs::read_to_string(&default_path) {
                if let Ok(config) = toml::from_str(&contents) {
                    return config;
                }
            }
        }
    }

    default_config()
}

fn ensure_dirs(config: &PortfolioConfig) -> std::io::Result<()> {
    if let Some(parent) = config.database_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn parse_date(raw: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", raw))
}

fn today_or(raw: Option<&str>) -> anyhow::Result<NaiveDate> {
    match raw {
        Some(raw) => parse_date(raw),
        None => Ok(Local::now().date_naive()),
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref());
    if let Err(e) = config.validate() {
        eprintln!("{} {}", "Error:".red().bold(), e);
        process::exit(1);
    }
    if let Err(e) = ensure_dirs(&config) {
        eprintln!(
            "{} Failed to create directories: {}",
            "Error:".red().bold(),
            e
        );
        process::exit(1);
    }

    if cli.verbose {
        println!(
            "{} v{}",
            "rusty-portfolio".cyan().bold(),
            env!("CARGO_PKG_VERSION")
        );
        println!(
            "Ledger: {}",
            config.database_path.display().to_string().dimmed()
        );
    }

    if let Err(e) = run(cli, config) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

fn run(cli: Cli, config: PortfolioConfig) -> anyhow::Result<()> {
    let ledger = SqliteLedger::open(&config.database_path)
        .with_context(|| format!("Opening ledger {}", config.database_path.display()))?;
    let provider = YahooProvider::new(REQUEST_TIMEOUT).context("Starting market data provider")?;
    let mut service = PortfolioService::new(ledger, provider, config);
    let json = cli.json;

    match cli.command {
        Commands::Add { txn } => {
            let id = service.store_mut().insert(txn.to_new()?)?;
            println!("{} transaction {}", "Added".green().bold(), id);
        }
        Commands::Import { file } => import_file(&mut service, &file)?,
        Commands::List => {
            let txns = service.store().list()?;
            if json {
                return print_json(&txns);
            }
            print_transactions(&txns, &service.config().exchange_suffix);
        }
        Commands::Update { id, txn } => {
            if service.store_mut().update(id, txn.to_new()?)? {
                println!("{} transaction {}", "Updated".green().bold(), id);
            } else {
                println!("{} no transaction with id {}", "Note:".yellow(), id);
            }
        }
        Commands::Delete { id } => {
            if service.store_mut().delete(id)? {
                println!("{} transaction {}", "Deleted".green().bold(), id);
            } else {
                println!("{} no transaction with id {}", "Note:".yellow(), id);
            }
        }
        Commands::Clear { force } => {
            if !force {
                println!("{}", "This will delete every transaction.".yellow());
                println!("Use {} to confirm.", "--force".bright_yellow());
                return Ok(());
            }
            let removed = service.store_mut().clear()?;
            println!("{} {} transactions", "Removed".green().bold(), removed);
        }
        Commands::Dashboard { date } => {
            let today = today_or(date.as_deref())?;
            let dashboard = with_spinner("Fetching prices...", || service.dashboard(today))?;
            if json {
                return print_json(&dashboard);
            }
            print_dashboard(&dashboard);
        }
        Commands::Earnings => {
            let report = with_spinner("Fetching dividends...", || service.earnings())?;
            if json {
                return print_json(&report);
            }
            print_earnings(&report);
        }
        Commands::Analyze { ticker, date } => {
            let today = today_or(date.as_deref())?;
            let score = with_spinner("Fetching fundamentals...", || service.analyze(&ticker, today));
            if json {
                return print_json(&score);
            }
            print_score(&score);
        }
        Commands::Price { ticker } => {
            let price = service.price_check(&ticker);
            if json {
                return print_json(&serde_json::json!({ "price": price }));
            }
            println!("{} {:.2}", ticker.to_uppercase().bold(), price);
        }
    }

    Ok(())
}

fn import_file<S: LedgerStore, P: MarketDataProvider>(
    service: &mut PortfolioService<S, P>,
    file: &Path,
) -> anyhow::Result<()> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")?
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.enable_steady_tick(Duration::from_millis(100));

    pb.set_message(format!("Reading {}...", file.display()));
    let txns = import::read_file(file)
        .with_context(|| format!("Reading {}", file.display()))?;

    pb.set_message(format!("Storing {} transactions...", txns.len()));
    let ids = service.store_mut().insert_bulk(txns)?;
    pb.finish_and_clear();

    println!("{}", "Import Summary".green().bold());
    println!("{}", "==============".green());
    println!("  {} {}", "File:".bold(), file.display());
    println!("  {} {}", "Transactions:".bold(), ids.len());
    Ok(())
}

fn with_spinner<T>(message: &str, work: impl FnOnce() -> T) -> T {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    let result = work();
    pb.finish_and_clear();
    result
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn colored_pct(value: f64) -> colored::ColoredString {
    let text = format!("{:+.2}%", value);
    if value > 0.0 {
        text.green()
    } else if value < 0.0 {
        text.red()
    } else {
        text.normal()
    }
}

fn print_transactions(txns: &[Transaction], suffix: &str) {
    if txns.is_empty() {
        println!("{}", "No transactions recorded.".dimmed());
        return;
    }

    println!(
        "{:>6}  {:<10}  {:<10}  {:>12}  {:>12}  {}",
        "ID".bold(),
        "Date".bold(),
        "Ticker".bold(),
        "Quantity".bold(),
        "Price".bold(),
        "Type".bold()
    );
    for txn in txns {
        let quantity = format!("{:>12.2}", txn.quantity);
        println!(
            "{:>6}  {:<10}  {:<10}  {}  {:>12.2}  {}",
            txn.id,
            txn.date,
            display_symbol(&txn.symbol, suffix),
            if txn.is_sell() { quantity.red() } else { quantity.normal() },
            txn.price,
            txn.asset_type.dimmed()
        );
    }
}

fn print_dashboard(dashboard: &Dashboard) {
    println!("{}", "Portfolio".cyan().bold());
    println!("{}", "=========".cyan());
    println!("  {} {:.2}", "Market value:".bold(), dashboard.market_value);
    println!("  {} {:.2}", "Invested:".bold(), dashboard.invested);
    println!(
        "  {} {:.2} ({})",
        "Profit:".bold(),
        dashboard.profit,
        colored_pct(dashboard.profit_pct)
    );
    println!("  {} {}", "Today:".bold(), colored_pct(dashboard.daily_variation));
    println!();

    if !dashboard.assets.is_empty() {
        println!(
            "{:<10}  {:>10}  {:>10}  {:>10}  {:>12}  {:>9}  {:>9}",
            "Ticker".bold(),
            "Qty".bold(),
            "Avg cost".bold(),
            "Price".bold(),
            "Total".bold(),
            "Return".bold(),
            "Day".bold()
        );
        for asset in &dashboard.assets {
            println!(
                "{:<10}  {:>10.2}  {:>10.2}  {:>10.2}  {:>12.2}  {:>9}  {:>9}",
                asset.symbol,
                asset.quantity,
                asset.average_cost,
                asset.current_price,
                asset.market_value,
                colored_pct(asset.return_pct),
                colored_pct(asset.daily_variation_pct)
            );
        }
        println!();
    }

    if let Some(last) = dashboard.chart.last() {
        println!(
            "{} {} points, last {} (invested {:.2}, value {:.2})",
            "Evolution:".bold(),
            dashboard.chart.len(),
            last.label,
            last.invested,
            last.market_value
        );
    }
}

fn print_earnings(report: &DividendReport) {
    println!("{}", "Dividend Income".cyan().bold());
    println!("{}", "===============".cyan());
    println!("  {} {:.2}", "Total received:".bold(), report.total);
    println!();

    if !report.monthly.is_empty() {
        println!("{}", "By month:".bold());
        for month in &report.monthly {
            println!("  {:<8} {:>12.2}", month.label, month.total);
        }
        println!();
    }

    if !report.by_symbol.is_empty() {
        println!("{}", "By asset:".bold());
        for row in &report.by_symbol {
            println!("  {:<10} {:>12.2}", row.name, row.value);
        }
        println!();
    }

    if !report.by_class.is_empty() {
        println!("{}", "By class:".bold());
        for row in &report.by_class {
            println!("  {:<10} {:>12.2}", row.name, row.value);
        }
    }
}

fn status_label(status: Status) -> colored::ColoredString {
    match status {
        Status::Green => "GREEN".green(),
        Status::Yellow => "YELLOW".yellow(),
        Status::Red => "RED".red(),
        Status::Gray => "GRAY".dimmed(),
    }
}

fn print_score(score: &AssetScore) {
    let verdict = score.verdict.to_string();
    let verdict = match score.verdict {
        Verdict::Blue => verdict.blue().bold(),
        Verdict::Yellow => verdict.yellow().bold(),
        Verdict::Red => verdict.red().bold(),
        Verdict::Unavailable => verdict.dimmed(),
    };

    println!("{} {:.2}", score.ticker.cyan().bold(), score.price);
    println!("  {} {}/8  {}", "Score:".bold(), score.score, verdict);

    let criteria = &score.criteria;
    println!(
        "  {:<14} {:<8} {} of {} years profitable",
        "Profitability",
        status_label(criteria.profit.status),
        criteria.profit.profitable,
        criteria.profit.years
    );
    println!(
        "  {:<14} {:<8} {}",
        "Governance",
        status_label(criteria.governance.status),
        criteria.governance.share_class
    );
    println!(
        "  {:<14} {:<8} debt/EBITDA {:.2}",
        "Leverage",
        status_label(criteria.debt.status),
        criteria.debt.current_ratio
    );
    println!(
        "  {:<14} {:<8} {:.1} years listed",
        "Listing age",
        status_label(criteria.ipo.status),
        criteria.ipo.years
    );
}
