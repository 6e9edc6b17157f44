// Shared state store
//
// One SharedState exists per run. Workers get it as an Arc and never touch the
// guarded data except through the critical sections in rubric.rs, questions.rs and
// advance.rs. Each guard protects a disjoint subset of the state; none is nested.

mod advance;
pub mod guard;
mod questions;
mod rubric;

pub use advance::AdvanceOutcome;
pub use guard::{TrackedGuard, TrackedMutex};
pub use questions::{ClaimOutcome, QuestionBoard};
pub use rubric::RubricOutcome;

use crate::error::Result;
use crate::metrics::MarkingMetrics;
use crate::models::{ExamList, ExamState, MarkingConfig, Rubric, SENTINEL_STUDENT_ID};
use crate::services::{ExamSource, RubricStore};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::{broadcast, watch};

/// Events emitted while the pool runs.
///
/// Nothing in the marking protocol depends on them; they exist for logging
/// consumers and tests.
#[derive(Clone, Debug, PartialEq)]
pub enum MarkingEvent {
    RubricCorrected {
        worker: usize,
        question: u32,
        from: char,
        to: char,
    },

    RubricUnchanged {
        worker: usize,
        question: u32,
        current: char,
    },

    QuestionClaimed {
        worker: usize,
        student_id: u32,
        question: usize,
    },

    QuestionMarked {
        worker: usize,
        student_id: u32,
        question: usize,
    },

    ExamFinished {
        worker: usize,
        student_id: u32,
    },

    ExamLoaded {
        index: usize,
        student_id: u32,
    },

    /// Advance ran past the end of the exam list
    ExamsExhausted {
        last_index: usize,
    },

    SentinelReached {
        worker: usize,
    },

    WorkerFailed {
        worker: usize,
        reason: String,
    },
}

/// Position in the exam list, protected by the loader guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExamCursor {
    pub current_exam_index: usize,
}

/// Everything the workers share.
///
/// # Guards
///
/// - `rubric`: every rubric read/write and every rubric save
/// - `questions`: the completion set of the current exam
/// - `loader`: the exam cursor and loading the next record
///
/// The current student id is additionally mirrored in an atomic so the
/// sentinel check needs no guard. It is written only by the initializer and
/// by [`advance`](Self::advance).
pub struct SharedState {
    rubric: TrackedMutex<Rubric>,
    questions: TrackedMutex<QuestionBoard>,
    loader: TrackedMutex<ExamCursor>,
    student_id: AtomicU32,
    exam_list: ExamList,
    rubric_store: Arc<dyn RubricStore>,
    exam_source: Arc<dyn ExamSource>,
    config: MarkingConfig,
    metrics: MarkingMetrics,
    event_tx: broadcast::Sender<MarkingEvent>,
    shutdown_tx: watch::Sender<bool>,
}

impl SharedState {
    /// Build the shared state: load the rubric, build the exam list and load the first exam.
    ///
    /// Must complete before any worker starts. An empty exam list installs the
    /// sentinel straight away.
    pub fn initialize(
        config: MarkingConfig,
        rubric_store: Arc<dyn RubricStore>,
        exam_source: Arc<dyn ExamSource>,
    ) -> Result<Self> {
        config.validate()?;

        let rubric = rubric_store.load()?;
        let exam_list = exam_source.list_exams(config.max_exams)?;

        let student_id = match exam_list.get(0) {
            Some(first) => {
                let student_id = exam_source.load_student_id(first)?;
                tracing::info!(
                    "Loaded exam {} (student {:04})",
                    first,
                    student_id
                );
                student_id
            }
            None => {
                tracing::warn!("No exams found, starting at the sentinel");
                SENTINEL_STUDENT_ID
            }
        };

        let (event_tx, _) = broadcast::channel(config.event_capacity);
        let (shutdown_tx, _) = watch::channel(false);

        Ok(Self {
            rubric: TrackedMutex::new("rubric_guard", rubric),
            questions: TrackedMutex::new("question_guard", QuestionBoard::new()),
            loader: TrackedMutex::new(
                "loader_guard",
                ExamCursor {
                    current_exam_index: 0,
                },
            ),
            student_id: AtomicU32::new(student_id),
            exam_list,
            rubric_store,
            exam_source,
            config,
            metrics: MarkingMetrics::new(),
            event_tx,
            shutdown_tx,
        })
    }

    /// Unguarded read of the current student id, used for the sentinel check.
    pub fn current_student_id(&self) -> u32 {
        self.student_id.load(Ordering::Acquire)
    }

    pub fn is_sentinel(&self) -> bool {
        self.current_student_id() == SENTINEL_STUDENT_ID
    }

    pub fn exam_list(&self) -> &ExamList {
        &self.exam_list
    }

    pub fn config(&self) -> &MarkingConfig {
        &self.config
    }

    pub fn metrics(&self) -> &MarkingMetrics {
        &self.metrics
    }

    /// Copy of the rubric, taken under the rubric guard
    pub async fn rubric_snapshot(&self) -> Rubric {
        self.rubric.lock().await.clone()
    }

    /// Copy of the exam state. Takes the loader and question guards one after the other.
    pub async fn exam_snapshot(&self) -> ExamState {
        let current_exam_index = self.loader.lock().await.current_exam_index;
        let question_done = self.questions.lock().await.done();
        ExamState {
            student_id: self.current_student_id(),
            current_exam_index,
            question_done,
        }
    }

    /// Peak simultaneous holders for the rubric, question and loader guards
    pub fn guard_peaks(&self) -> [usize; 3] {
        [
            self.rubric.peak_holders(),
            self.questions.peak_holders(),
            self.loader.peak_holders(),
        ]
    }

    /// Subscribe to marking events
    pub fn subscribe(&self) -> broadcast::Receiver<MarkingEvent> {
        self.event_tx.subscribe()
    }

    pub(crate) fn emit(&self, event: MarkingEvent) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }

    /// Receiver that flips to `true` once any worker hits a fatal error
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// Bring the whole pool down
    pub fn trigger_shutdown(&self) {
        if !self.shutdown_tx.send_replace(true) {
            tracing::warn!("Shutdown requested, cancelling all workers");
        }
    }

    pub fn is_shutdown(&self) -> bool {
        *self.shutdown_tx.borrow()
    }
}

impl std::fmt::Debug for SharedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedState")
            .field("student_id", &self.current_student_id())
            .field("exam_list", &self.exam_list)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
