use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "costpoint-helper")]
#[command(about = "Fills the Costpoint timesheet from tracked time entries")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Fill a captured timesheet grid and write the result
    Run {
        /// Grid snapshot (JSON) to fill
        #[arg(long)]
        grid: PathBuf,
        /// Where to write the filled grid, defaults to overwriting the input
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Show what a run would write and clear, without touching the grid
    Plan {
        #[arg(long)]
        grid: PathBuf,
    },
    /// Print the entries the server currently reports
    Fetch,
}
