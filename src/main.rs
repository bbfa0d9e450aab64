mod config;
mod diff;
mod error;
mod index;
mod models;
mod period;
mod report;
mod uptime;

use chrono::Utc;
use clap::{Parser, Subcommand};
use config::{ensure_initialized, load_config, resolve_report_dir, resolve_snapshot_dir};
use error::AppError;
use report::RunOutcome;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "provider-meter")]
#[command(about = "Weekly snapshot diff and uptime reports for LLM inference providers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Init,
    Report {
        /// ISO week to report on (YYYY-Wnn); defaults to the previous
        /// complete week.
        #[arg(long)]
        week: Option<String>,
        #[arg(long)]
        snapshot_dir: Option<PathBuf>,
        #[arg(long)]
        report_dir: Option<PathBuf>,
    },
}

fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            ensure_initialized()?;
            println!("Initialized provider-meter config and data directories.");
        }
        Commands::Report {
            week,
            snapshot_dir,
            report_dir,
        } => {
            ensure_initialized()?;
            let cfg = load_config()?;
            let snapshot_dir = resolve_snapshot_dir(&cfg, snapshot_dir)?;
            let report_dir = resolve_report_dir(&cfg, report_dir, &snapshot_dir)?;

            match report::generate(&snapshot_dir, &report_dir, week.as_deref(), Utc::now())? {
                RunOutcome::Written { path, report } => {
                    println!("Generated report for {}", report.week);
                    println!(
                        "  Period: {} to {}",
                        report.period.from.date_naive(),
                        report.period.to.date_naive()
                    );
                    println!("  Snapshots: {}", report.snapshots_used);
                    println!(
                        "  Summary: +{} models, -{} models, {} price changes, {} speed changes",
                        report.summary.models_added,
                        report.summary.models_removed,
                        report.summary.price_changes,
                        report.summary.speed_changes,
                    );
                    println!("  Wrote {}", path.display());
                }
                RunOutcome::AlreadyExists(path) => {
                    println!("Report already exists: {} -- skipping.", path.display());
                }
            }
        }
    }

    Ok(())
}
