mod cli;
mod config;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use costpoint::domain::{Outcome, RunReport, Subject};
use costpoint::page::{GridPage, GridSnapshot};
use costpoint::{Automation, EntrySource, HttpEntrySource};
use tracing::info;

use crate::cli::{Cli, Commands};
use crate::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "costpoint=info,costpoint_helper=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let settings = crate::config::read_config().context("Failed to read configuration")?;
    let source = entry_source(&settings)?;

    match cli.command {
        Commands::Run { grid, out } => {
            let automation = Automation::new(
                source,
                GridPage::new(load_grid(&grid)?),
                settings.automation.to_config(),
            );
            let report = automation.run().await?;
            print_report(&report);

            let out = out.unwrap_or(grid);
            save_grid(&out, &automation.page().snapshot())?;
            info!(path = %out.display(), "Wrote filled grid");
        }
        Commands::Plan { grid } => {
            let automation = Automation::new(
                source,
                GridPage::new(load_grid(&grid)?),
                settings.automation.to_config(),
            );
            let planned = automation.plan().await?;

            println!(
                "{} entries, {} dates visible (offset {}), {} charge codes",
                planned.entries.len(),
                planned.layout.dates.len(),
                planned.layout.dates.offset(),
                planned.layout.charge_codes.len()
            );
            for instruction in &planned.plan.instructions {
                if instruction.is_clear() {
                    println!("clear {}", instruction.cell);
                } else {
                    println!(
                        "write {} hours={} note={:?}",
                        instruction.cell, instruction.hours, instruction.note
                    );
                }
            }
            for item in &planned.plan.skipped {
                println!("{}", describe(&item.subject, &item.outcome));
            }
        }
        Commands::Fetch => {
            let entries = source.fetch_entries().await?;
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
    }

    Ok(())
}

fn entry_source(settings: &Settings) -> Result<HttpEntrySource> {
    match settings.request_timeout_secs {
        Some(secs) => HttpEntrySource::with_timeout(&settings.entries_url, Duration::from_secs(secs))
            .context("Failed to build HTTP client"),
        None => Ok(HttpEntrySource::new(&settings.entries_url)),
    }
}

fn load_grid(path: &Path) -> Result<GridSnapshot> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read grid at {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse grid at {}", path.display()))
}

fn save_grid(path: &Path, grid: &GridSnapshot) -> Result<()> {
    let raw = serde_json::to_string_pretty(grid)?;
    std::fs::write(path, raw).with_context(|| format!("Failed to write grid to {}", path.display()))
}

fn print_report(report: &RunReport) {
    println!(
        "fetched {}, applied {}, skipped {}, failed {}",
        report.fetched,
        report.applied(),
        report.skipped(),
        report.failed()
    );
    for item in &report.items {
        if item.outcome != Outcome::Applied {
            println!("  {}", describe(&item.subject, &item.outcome));
        }
    }
}

fn describe(subject: &Subject, outcome: &Outcome) -> String {
    let subject = match subject {
        Subject::Entry { date, charge_code } => format!("entry {} {}", date, charge_code),
        Subject::Write { cell } => format!("write {}", cell),
        Subject::Clear { cell } => format!("clear {}", cell),
    };
    match outcome {
        Outcome::Applied => format!("{}: applied", subject),
        Outcome::Skipped { skipped } => format!("{}: skipped, {}", subject, skipped),
        Outcome::Failed { failed } => format!("{}: failed, {}", subject, failed),
    }
}
