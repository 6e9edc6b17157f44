use super::worker::{Worker, WorkerReport, WorkerRole, worker_seed};
use super::{ExamSource, RubricStore};
use crate::error::{MarkingError, Result};
use crate::models::{ExamState, MarkingConfig, Rubric, format_student_id};
use crate::state::SharedState;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Barrier;
use tokio::task::JoinSet;

/// Smallest pool that can run.
pub const MIN_WORKERS: usize = 2;

/// Validated number of workers (at least [`MIN_WORKERS`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerCount(usize);

impl WorkerCount {
    pub fn new(count: usize) -> Result<Self> {
        if count < MIN_WORKERS {
            return Err(MarkingError::InvalidWorkerCount {
                got: count,
                min: MIN_WORKERS,
            });
        }
        Ok(Self(count))
    }

    pub fn get(self) -> usize {
        self.0
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub workers: Vec<WorkerReport>,
    pub exams_marked: usize,
    pub final_rubric: Rubric,
    pub final_exam: ExamState,
    /// Peak simultaneous holders of the rubric, question and loader guards
    pub guard_peaks: [usize; 3],
}

impl RunSummary {
    pub fn questions_marked(&self) -> usize {
        self.workers.iter().map(|w| w.questions_marked).sum()
    }

    pub fn rubric_corrections(&self) -> usize {
        self.workers.iter().map(|w| w.rubric_corrections).sum()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "All {} TAs finished: {} exams, {} questions marked, {} rubric corrections",
            self.workers.len(),
            self.exams_marked,
            self.questions_marked(),
            self.rubric_corrections()
        )?;
        for worker in &self.workers {
            writeln!(
                f,
                "  TA {} ({:?}): {} exams, {} questions, {} corrections",
                worker.id,
                worker.role,
                worker.exams_marked,
                worker.questions_marked,
                worker.rubric_corrections
            )?;
        }
        writeln!(f, "Final rubric:")?;
        for entry in self.final_rubric.entries() {
            writeln!(f, "  {}", entry)?;
        }
        write!(
            f,
            "Final student id: {}",
            format_student_id(self.final_exam.student_id)
        )
    }
}

/// The TA pool.
///
/// Worker 0 is the designated advancer; every other worker is a marker.
pub struct MarkingPool {
    state: Arc<SharedState>,
    workers: WorkerCount,
}

impl MarkingPool {
    pub fn new(workers: WorkerCount, state: Arc<SharedState>) -> Self {
        Self { state, workers }
    }

    pub fn state(&self) -> &Arc<SharedState> {
        &self.state
    }

    /// Spawn all workers and wait for them.
    ///
    /// If any worker fails, the shutdown signal brings the rest down and the
    /// first non-cancellation error is returned.
    pub async fn run(self) -> Result<RunSummary> {
        let count = self.workers.get();
        let config = self.state.config();

        let barrier = config
            .synchronized_advance
            .then(|| Arc::new(Barrier::new(count)));
        let base_seed = config.seed.unwrap_or_else(rand::random);

        tracing::info!(
            "Starting {} TAs over {} exams (synchronized advance: {}, seed: {})",
            count,
            self.state.exam_list().count(),
            barrier.is_some(),
            base_seed
        );

        let mut tasks = JoinSet::new();
        for id in 0..count {
            let role = if id == 0 {
                WorkerRole::Advancer
            } else {
                WorkerRole::Marker
            };
            let worker = Worker::new(
                id,
                role,
                self.state.clone(),
                worker_seed(base_seed, id),
                barrier.clone(),
            );
            tasks.spawn(worker.run());
        }

        let mut reports = Vec::with_capacity(count);
        let mut failure: Option<MarkingError> = None;

        while let Some(joined) = tasks.join_next().await {
            let error = match joined {
                Ok(Ok(report)) => {
                    reports.push(report);
                    continue;
                }
                Ok(Err(e)) => e,
                Err(join_error) => {
                    tracing::error!("Worker task join error: {}", join_error);
                    MarkingError::WorkerPanicked(join_error.to_string())
                }
            };

            self.state.trigger_shutdown();
            let replace = match &failure {
                None => true,
                Some(existing) => existing.is_cancellation() && !error.is_cancellation(),
            };
            if replace {
                failure = Some(error);
            }
        }

        if let Some(error) = failure {
            tracing::error!("Marking run aborted: {}", error);
            return Err(error);
        }

        reports.sort_by_key(|report| report.id);
        let exams_marked = reports
            .iter()
            .find(|report| report.role == WorkerRole::Advancer)
            .map_or(0, |report| report.exams_marked);

        self.state.metrics().log_summary();
        tracing::info!("All TAs finished. Cleaning up.");

        Ok(RunSummary {
            workers: reports,
            exams_marked,
            final_rubric: self.state.rubric_snapshot().await,
            final_exam: self.state.exam_snapshot().await,
            guard_peaks: self.state.guard_peaks(),
        })
    }
}

/// Validate the worker count, build the shared state and run the pool.
///
/// The worker count is checked before anything is loaded.
pub async fn run_marking(
    workers: usize,
    config: MarkingConfig,
    rubric_store: Arc<dyn RubricStore>,
    exam_source: Arc<dyn ExamSource>,
) -> Result<RunSummary> {
    let workers = WorkerCount::new(workers)?;
    let state = Arc::new(SharedState::initialize(config, rubric_store, exam_source)?);
    MarkingPool::new(workers, state).run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NUM_QUESTIONS;
    use crate::services::{MemoryExamSource, MemoryRubricStore};

    #[test]
    fn test_worker_count_validation() {
        assert!(matches!(
            WorkerCount::new(1),
            Err(MarkingError::InvalidWorkerCount { got: 1, min: 2 })
        ));
        assert!(WorkerCount::new(0).is_err());
        assert_eq!(WorkerCount::new(2).unwrap().get(), 2);
    }

    #[tokio::test]
    async fn test_run_marking_small_pool() {
        let summary = run_marking(
            3,
            MarkingConfig {
                seed: Some(1),
                ..MarkingConfig::instant()
            },
            Arc::new(MemoryRubricStore::new(Rubric::uniform('A'))),
            Arc::new(MemoryExamSource::from_student_ids(&[42, 43])),
        )
        .await
        .unwrap();

        assert_eq!(summary.workers.len(), 3);
        assert_eq!(summary.workers[0].role, WorkerRole::Advancer);
        assert_eq!(summary.exams_marked, 2);
        assert_eq!(summary.questions_marked(), 2 * NUM_QUESTIONS);
        assert!(summary.final_exam.is_sentinel());
        assert_eq!(summary.guard_peaks, [1, 1, 1]);
    }

    #[test]
    fn test_summary_display() {
        let summary = RunSummary {
            workers: vec![WorkerReport {
                id: 0,
                role: WorkerRole::Advancer,
                exams_marked: 1,
                questions_marked: 5,
                rubric_corrections: 2,
            }],
            exams_marked: 1,
            final_rubric: Rubric::uniform('B'),
            final_exam: ExamState {
                student_id: 9999,
                current_exam_index: 0,
                question_done: [true; NUM_QUESTIONS],
            },
            guard_peaks: [1, 1, 1],
        };

        let text = summary.to_string();
        assert!(text.contains("1 exams, 5 questions marked, 2 rubric corrections"));
        assert!(text.contains("  3, B"));
        assert!(text.ends_with("Final student id: 9999"));
    }
}
