//! stockcard CLI: analyze A-share codes and optionally push a Feishu card.
//!
//! Examples:
//! - `stockcard 002405 600519` prints a short summary per code
//! - `stockcard 002405 --minute --json` prints the full analysis as JSON
//! - `stockcard 002405 -m --send ou_xxx` also sends the card to a Feishu user

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use stockcard_core::{Config, SessionBucket};
use stockcard_features::{StockAnalysis, StockAnalyzer, StockReport};
use stockcard_ingestion::SinaProvider;
use stockcard_report::{build_stock_card, card::bucket_label, FeishuClient};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "warn,stockcard=info";
const VERBOSE_LOG_FILTER: &str = "debug";

#[derive(Parser)]
#[command(name = "stockcard", about = "A-share analysis with Feishu card delivery")]
struct Cli {
    /// Six-digit security codes (e.g. 002405 600519).
    #[arg(required = true)]
    codes: Vec<String>,

    /// Include intraday volume distribution analysis.
    #[arg(short, long, default_value_t = false)]
    minute: bool,

    /// Print the analyses as JSON.
    #[arg(short, long, default_value_t = false)]
    json: bool,

    /// Send a card for the first successful analysis to this Feishu open id.
    #[arg(short, long, value_name = "OPEN_ID")]
    send: Option<String>,

    /// Path to a TOML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Debug logging.
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    let provider = SinaProvider::new(&config.provider)?;
    let analyzer = StockAnalyzer::new(&provider, &config);

    let analyses: Vec<StockAnalysis> = cli
        .codes
        .iter()
        .map(|code| analyzer.analyze(code, cli.minute))
        .collect();
    info!(
        requested = analyses.len(),
        succeeded = analyses.iter().filter(|a| a.report().is_some()).count(),
        "analysis finished"
    );

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&analyses)?);
    } else {
        for analysis in &analyses {
            print_summary(analysis, cli.minute);
        }
    }

    if let Some(open_id) = cli.send.as_deref() {
        send_first(&config, &analyses, open_id)?;
    }

    Ok(())
}

/// Logs go to stderr so `--json` output stays clean. `RUST_LOG` wins over
/// both defaults.
fn init_logging(verbose: bool) {
    let fallback = if verbose { VERBOSE_LOG_FILTER } else { DEFAULT_LOG_FILTER };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };
    config.apply_env();
    debug!(
        thresholds = ?config.thresholds,
        bypass_proxy = config.provider.bypass_proxy,
        feishu = config.feishu.app_id.is_some(),
        "configuration loaded"
    );
    Ok(config)
}

fn print_summary(analysis: &StockAnalysis, with_minute: bool) {
    let report = match analysis {
        StockAnalysis::Ok(report) => report,
        StockAnalysis::Failed { code, error } => {
            eprintln!("{code}: {error}");
            return;
        }
    };

    let rt = &report.realtime;
    println!("{} {}", report.code, report.name);
    println!("  price   {:.2} ({:+.2}%)", rt.price, rt.change_pct);
    println!("  volume  {} lots", rt.volume);

    if with_minute {
        print_volume(report);
    }
    println!();
}

fn print_volume(report: &StockReport) {
    let Some(analysis) = report.minute_analysis.as_ref() else {
        println!("  intraday volume unavailable");
        return;
    };
    if let Some(reason) = analysis.empty_reason() {
        println!("  intraday volume: {reason}");
        return;
    }
    let Some(volume) = analysis.report() else {
        return;
    };

    println!("  intraday volume {} lots", volume.total_volume);
    for bucket in SessionBucket::ALL {
        let stat = volume.bucket(bucket);
        println!(
            "    {:<14} {:>10} lots {:>5.1}%",
            bucket_label(bucket),
            stat.volume,
            stat.percent
        );
    }
    for signal in &volume.signals {
        println!("  * {signal}");
    }
}

fn send_first(config: &Config, analyses: &[StockAnalysis], open_id: &str) -> Result<()> {
    let Some(report) = analyses.iter().find_map(StockAnalysis::report) else {
        bail!("no successful analysis to send");
    };

    let client = FeishuClient::new(&config.feishu)?;
    let card = build_stock_card(report);
    let message_id = client
        .send_card(open_id, &card)
        .with_context(|| format!("sending card for {}", report.code))?;
    println!("card sent for {}: {message_id}", report.code);
    Ok(())
}
