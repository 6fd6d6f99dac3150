//! mossrun: process queued MOSS analysis jobs.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use log::info;

use mossrun::config::load_config;
use mossrun::db::{default_database_path, job_repo, Database};
use mossrun::error::{ConfigError, MossrunError};
use mossrun::jobs::{JobProcessor, JobStatus, ProcessorConfig};
use mossrun::worker::WorkerPool;

#[derive(Parser)]
#[command(name = "mossrun")]
#[command(about = "Submit queued jobs to MOSS and store the parsed results")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "mossrun.json")]
    config: PathBuf,

    /// Database file (overrides the configuration)
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Enable debug logging and per-job statistics
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process jobs to completion
    Process {
        /// Job identifiers
        job_ids: Vec<String>,

        /// Also process every job currently queued
        #[arg(long)]
        queued: bool,
    },

    /// Show job counts per status
    Status,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, MossrunError> {
    let mut config = load_config(&cli.config)?;
    config.debug |= cli.debug;
    mossrun::logging::init(config.debug, config.json_logs)?;

    let db_path = cli
        .database
        .or_else(|| config.database_path.as_ref().map(PathBuf::from))
        .or_else(default_database_path)
        .ok_or_else(|| ConfigError::Validation {
            message: "no database path configured and no home directory".to_string(),
        })?;
    let db = Database::open(&db_path)?;

    match cli.command {
        Commands::Status => {
            for status in [
                JobStatus::Queued,
                JobStatus::Processing,
                JobStatus::Completed,
                JobStatus::Failed,
            ] {
                println!("{:<11} {}", status, job_repo::count_by_status(&db, status)?);
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Process { job_ids, queued } => {
            let mut ids = job_ids;
            if queued {
                ids.extend(job_repo::list_ids_by_status(&db, JobStatus::Queued)?);
            }
            let mut seen = std::collections::HashSet::new();
            ids.retain(|id| seen.insert(id.clone()));

            if ids.is_empty() {
                info!("Nothing to process");
                return Ok(ExitCode::SUCCESS);
            }

            let processor_config = Arc::new(ProcessorConfig::from_config(&config));
            let processor = JobProcessor::from_config(processor_config, db, &config.moss)?;
            process(processor, config.worker_count.min(ids.len()), &ids)
        }
    }
}

fn process(
    processor: JobProcessor,
    worker_count: usize,
    ids: &[String],
) -> Result<ExitCode, MossrunError> {
    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))?;

    let pool = WorkerPool::new(processor, worker_count)?;
    let summary = pool.process_batch(ids, &interrupted, |outcome| {
        match &outcome.report_url {
            Some(url) => println!("{}\t{}", outcome.job_id, url),
            None => println!("{}\t-", outcome.job_id),
        }
    });

    pool.shutdown();
    pool.wait();

    info!(
        "{} completed, {} failed, {} not processed",
        summary.completed, summary.failed, summary.unprocessed
    );
    if summary.all_completed() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
