//! ColdSim - device simulator for the ColdTrack pipeline
//!
//! Generates realistic refrigerated-transport telemetry and feeds it through
//! the full validation/persistence/scoring pipeline in-process, against an
//! in-memory or SQLite store. Useful for demos, threshold tuning, and
//! watching the freeze-damage score react to injected excursions.

mod config;
mod simulator;

use crate::config::SimConfig;
use crate::simulator::Simulator;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{Local, TimeZone};
use clap::Parser;
use coldtrack_model::{AlertEvent, SystemTimeProvider, TimeProvider};
use coldtrack_pipeline::{Pipeline, ProcessingReport};
use coldtrack_rules::Notifier;
use coldtrack_store::{MemoryStore, SqliteStore, TelemetryStore, WriteOutcome};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "coldsim")]
#[command(about = "ColdTrack device simulator")]
#[command(long_about = "ColdTrack device simulator

Feeds generated telemetry through the processing pipeline and prints every
sample and alert. Configuration comes from an optional YAML/JSON file merged
with COLDSIM_-prefixed environment variables.

Examples:
  coldsim --count 20 --fast                 # 20 samples, no sleeping
  coldsim --config coldsim.yaml             # run until interrupted
  coldsim --database sqlite:points.db?mode=rwc --count 100 --fast")]
struct Args {
    /// Path to configuration file (YAML or JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override publish interval in seconds
    #[arg(long)]
    interval: Option<u64>,

    /// Number of samples to process (0 = run until interrupted)
    #[arg(long, default_value_t = 0)]
    count: u64,

    /// SQLite database URL; uses the in-memory store when omitted
    #[arg(long)]
    database: Option<String>,

    /// Process samples back-to-back with synthetic timestamps instead of
    /// sleeping between samples (requires --count)
    #[arg(long)]
    fast: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let args = Args::parse();

    let mut cfg = SimConfig::load(args.config.as_deref())?;
    if let Some(interval) = args.interval {
        cfg.publish_interval_secs = interval;
    }
    if args.fast && args.count == 0 {
        anyhow::bail!("--fast requires --count");
    }

    print_banner(&cfg, args.database.as_deref());

    match args.database.as_deref() {
        Some(url) => {
            let store = Arc::new(SqliteStore::connect(url).await?);
            run(store, cfg, args.count, args.fast).await
        },
        None => {
            let store = Arc::new(MemoryStore::new());
            run(store, cfg, args.count, args.fast).await
        },
    }
}

async fn run<S: TelemetryStore>(
    store: Arc<S>,
    cfg: SimConfig,
    count: u64,
    fast: bool,
) -> Result<()> {
    let notifier = Arc::new(ConsoleNotifier);
    let pipeline = Pipeline::new(store, notifier, cfg.pipeline.clone());
    let mut sim = Simulator::new(cfg.clone());

    let interval = cfg.publish_interval_secs;
    // Fast mode backfills: oldest sample first, stepping forward by the
    // publish interval so window scoring sees realistic spacing.
    let start = if fast {
        SystemTimeProvider.now_secs() - (count.saturating_sub(1) * interval) as i64
    } else {
        0
    };

    let mut processed = 0u64;
    let mut failed = 0u64;
    let mut alerted = 0u64;

    loop {
        let now = if fast {
            start + (processed * interval) as i64
        } else {
            SystemTimeProvider.now_secs()
        };

        let (payload, injected) = sim.generate(now);
        match pipeline.process(&payload).await {
            Ok(report) => {
                if !report.alerts.is_empty() {
                    alerted += 1;
                }
                print_sample(&payload, &report, injected);
            },
            Err(e) => {
                failed += 1;
                eprintln!("{} {}", "error:".red().bold(), e);
            },
        }

        processed += 1;
        if count > 0 && processed >= count {
            break;
        }
        if !fast {
            tokio::time::sleep(Duration::from_secs(interval)).await;
        }
    }

    println!(
        "\n{} {} samples, {} with alerts, {} failed",
        "done:".green().bold(),
        processed,
        alerted,
        failed
    );
    Ok(())
}

fn print_banner(cfg: &SimConfig, database: Option<&str>) {
    println!("{}", "ColdTrack Device Simulator".bold());
    println!("  device:   {}", cfg.device_id);
    println!("  interval: {}s", cfg.publish_interval_secs);
    println!(
        "  band:     {:.1}C to {:.1}C (freeze at {:.1}C)",
        cfg.pipeline.temp_min, cfg.pipeline.temp_max, cfg.pipeline.freeze_alert_threshold
    );
    println!("  store:    {}\n", database.unwrap_or("memory"));
}

fn print_sample(payload: &serde_json::Value, report: &ProcessingReport, injected: bool) {
    let temperature = payload["temperature"].as_f64().unwrap_or(f64::NAN);
    let humidity = payload["humidity"].as_f64().unwrap_or(f64::NAN);
    let battery = payload["battery"].as_f64().unwrap_or(f64::NAN);

    let temp_str = format!("{:+6.2}C", temperature);
    let temp_colored = if !report.alerts.is_empty() {
        temp_str.red()
    } else {
        temp_str.green()
    };

    let clock = Local
        .timestamp_opt(report.timestamp, 0)
        .single()
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| report.timestamp.to_string());

    let mut line = format!(
        "[{}] {} {}  hum {:5.1}%  bat {:5.1}%",
        clock, report.device_id, temp_colored, humidity, battery
    );
    if report.outcome == WriteOutcome::DuplicateIgnored {
        line.push_str(&format!("  {}", "(duplicate)".dimmed()));
    }
    if injected {
        line.push_str(&format!("  {}", "[injected freeze]".blue()));
    }
    if report.scoring_skipped {
        line.push_str(&format!("  {}", "[scoring skipped]".yellow()));
    }
    println!("{}", line);

    for alert in &report.alerts {
        println!(
            "         {} {} severity {:.2}",
            "ALERT".red().bold(),
            alert.kind,
            alert.severity
        );
    }
}

/// Notifier that prints alerts to the terminal
struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn send(&self, event: &AlertEvent) -> Result<()> {
        tracing::debug!(
            device_id = %event.device_id,
            kind = %event.kind,
            severity = event.severity,
            "Alert forwarded"
        );
        Ok(())
    }
}
