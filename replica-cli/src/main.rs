//! Replica — one-way periodic folder mirroring.
//!
//! # Usage
//!
//! ```text
//! replica <source_folder> <replica_folder> <interval> <log_file>
//! ```
//!
//! Every `interval` seconds the replica folder is deleted and recreated as a
//! copy of the source folder. Runs until killed.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use replica_core::SyncPair;
use replica_daemon::{start_blocking, Logger};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "replica",
    version,
    about = "One-way periodic synchronization of a folder into a replica",
    long_about = None,
)]
struct Cli {
    /// Path to the source folder.
    source_folder: PathBuf,

    /// Path to the replica folder; its contents are replaced every cycle.
    replica_folder: PathBuf,

    /// Synchronization interval in seconds.
    interval: u64,

    /// Path to the log file; missing parent folders are created.
    log_file: PathBuf,
}

impl Cli {
    fn run(self) -> Result<()> {
        let pair = SyncPair::resolve(&self.source_folder, &self.replica_folder)?;

        println!("Source Folder: {}", pair.source().display());
        println!("Replica Folder: {}", pair.replica().display());

        // Checked before the logger exists so a bad launch leaves no log file behind.
        pair.validate()?;
        pair.ensure_log_outside(&self.log_file)?;

        let logger = Logger::open(&self.log_file)
            .with_context(|| format!("cannot open log file {}", self.log_file.display()))?;

        start_blocking(pair, Duration::from_secs(self.interval), logger)
            .context("synchronization runtime failed")
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            println!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
