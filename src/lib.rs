// tamark - concurrent TA exam-marking simulation
//
// This is the library crate containing the shared state, the critical sections and
// the worker pool. The binary crate (main.rs) provides the command line entry point.

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use error::{MarkingError, Result};
pub use models::{
    ExamList, ExamState, MarkingConfig, NUM_QUESTIONS, Rubric, RubricEntry, SENTINEL_STUDENT_ID,
};
pub use services::{MarkingPool, RunSummary, WorkerCount, run_marking};
pub use state::{MarkingEvent, SharedState};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
