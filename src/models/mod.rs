//! Data models for the marking simulation.
//!
//! - [`Rubric`] / [`RubricEntry`]: the shared, mutable answer key (one entry per question)
//! - [`ExamState`]: snapshot of the exam currently being marked
//! - [`ExamList`]: the ordered exam records, fixed before any worker starts
//! - [`MarkingConfig`]: timing, paths and protocol switches loaded from `marking.yaml`
//!
//! # Architecture Note
//!
//! None of these types synchronize anything themselves. The live copies sit behind the
//! guards owned by [`SharedState`](crate::state::SharedState); the types here are what
//! those guards protect and what snapshots hand back.

pub mod config;
pub mod exam;
pub mod rubric;

pub use config::MarkingConfig;
pub use exam::{ExamList, ExamState, MAX_EXAMS, SENTINEL_STUDENT_ID, format_student_id};
pub use rubric::{NUM_QUESTIONS, Rubric, RubricEntry};
