//! Services module - the marking workers and their backing stores.
//!
//! # Components
//!
//! - [`RubricStore`]: loads and persists the rubric. [`FileRubricStore`] keeps the
//!   `"<n>, <c>"` text format; [`MemoryRubricStore`] records every save.
//! - [`ExamSource`]: enumerates exam records and reads their student ids.
//!   [`DirExamSource`] reads one file per exam; [`MemoryExamSource`] is in-memory.
//! - [`Worker`]: one TA running the marking state machine against
//!   [`SharedState`](crate::state::SharedState).
//! - [`MarkingPool`] / [`run_marking`]: validates the worker count, spawns the
//!   workers as tokio tasks and collects a [`RunSummary`].
//!
//! # Usage Example
//!
//! ```ignore
//! use tamark::services::{run_marking, DirExamSource, FileRubricStore};
//!
//! let summary = run_marking(
//!     4,
//!     config,
//!     Arc::new(FileRubricStore::new("data/rubric.txt")),
//!     Arc::new(DirExamSource::new("data/exams")),
//! )
//! .await?;
//! println!("{}", summary);
//! ```

pub mod exam_source;
pub mod pool;
pub mod rubric_store;
pub mod worker;

pub use exam_source::{DirExamSource, ExamSource, MemoryExamSource, parse_student_id};
pub use pool::{MIN_WORKERS, MarkingPool, RunSummary, WorkerCount, run_marking};
pub use rubric_store::{FileRubricStore, MemoryRubricStore, RubricStore, parse_rubric};
pub use worker::{Worker, WorkerPhase, WorkerReport, WorkerRole};
