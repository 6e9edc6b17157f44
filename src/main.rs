//! tamark - concurrent TA exam-marking simulation
//!
//! Main entry point for the command line.
//!
//! # Execution Flow
//!
//! 1. Parse arguments and validate the TA count (fatal usage error below 2)
//! 2. Initialize logging → logs/tamark.<date>
//! 3. Load `marking.yaml` from the data directory (defaults if absent)
//! 4. Build the shared state: rubric, exam list, first exam
//! 5. Run the TA pool on a multi-threaded tokio runtime
//! 6. Print the run summary
//!
//! # Data Directory
//!
//! - `rubric.txt`: five `"<n>, <c>"` lines, rewritten on every correction
//! - `exams/`: one file per exam, first token is the student id
//! - `marking.yaml`: optional timing and protocol settings

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::Parser;
use std::sync::Arc;
use tamark::services::{DirExamSource, FileRubricStore, MarkingPool};
use tamark::{APP_NAME, ConfigManager, SharedState, VERSION, WorkerCount};

#[derive(Parser, Debug)]
#[command(name = "tamark")]
#[command(version)]
#[command(about = "Simulate a pool of TAs marking exams against a shared rubric")]
struct Args {
    /// Number of TAs (at least 2)
    num_tas: usize,

    /// Directory holding rubric.txt, exams/ and marking.yaml
    #[arg(long, default_value = "data")]
    data_dir: Utf8PathBuf,

    /// Explicit configuration file (overrides <data-dir>/marking.yaml)
    #[arg(long)]
    config: Option<Utf8PathBuf>,

    /// Directory for rotating log files
    #[arg(long, default_value = "logs")]
    log_dir: String,

    /// Base seed for the TAs' random generators
    #[arg(long)]
    seed: Option<u64>,

    /// Log at debug level
    #[arg(long)]
    debug: bool,

    /// Only log to the log file
    #[arg(long)]
    no_console: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Usage errors come before any shared state exists
    let workers = WorkerCount::new(args.num_tas)?;

    let _log_guard = tamark::logging::setup_logging_with_console(
        &args.log_dir,
        "tamark",
        args.debug,
        !args.no_console,
    )?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let mut config_manager = ConfigManager::new(&args.data_dir);
    if let Some(path) = &args.config {
        config_manager = config_manager.with_config_path(path);
    }

    let mut config = config_manager.load_marking_config()?;
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let rubric_store = Arc::new(FileRubricStore::new(config_manager.rubric_path(&config)));
    let exam_source = Arc::new(DirExamSource::new(config_manager.exams_dir(&config)));

    let state = SharedState::initialize(config, rubric_store, exam_source)
        .context("Failed to initialize shared marking state")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("tamark-worker")
        .build()
        .context("Failed to build tokio runtime")?;

    let summary = runtime
        .block_on(MarkingPool::new(workers, Arc::new(state)).run())
        .context("Marking run failed")?;

    println!("{}", summary);
    tracing::info!("Run complete");

    Ok(())
}
