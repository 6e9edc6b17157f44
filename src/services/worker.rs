use crate::error::{MarkingError, Result};
use crate::models::{NUM_QUESTIONS, format_student_id};
use crate::state::{ClaimOutcome, MarkingEvent, RubricOutcome, SharedState};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Barrier, watch};

/// Role assigned to a worker when the pool is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerRole {
    /// The one worker allowed to advance to the next exam
    Advancer,
    Marker,
}

/// States of the worker loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerPhase {
    CheckSentinel,
    MarkRubric,
    ClaimLoop,
    MaybeAdvance,
    Done,
}

/// What one worker did over the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    pub id: usize,
    pub role: WorkerRole,
    pub exams_marked: usize,
    pub questions_marked: usize,
    pub rubric_corrections: usize,
}

/// Derive a worker's generator seed from the run's base seed.
pub fn worker_seed(base_seed: u64, worker_id: usize) -> u64 {
    base_seed ^ (worker_id as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Uniform duration in `[min, max)`, or `min` when the range is empty.
pub fn random_delay<R: Rng + ?Sized>(rng: &mut R, (min, max): (Duration, Duration)) -> Duration {
    if max <= min {
        min
    } else {
        rng.gen_range(min..max)
    }
}

/// One TA.
///
/// Runs `CHECK_SENTINEL -> MARK_RUBRIC -> CLAIM_LOOP -> MAYBE_ADVANCE` until the
/// sentinel student id shows up. All random delays happen outside the guards and
/// race the pool's shutdown signal.
pub struct Worker {
    id: usize,
    role: WorkerRole,
    state: Arc<SharedState>,
    rng: StdRng,
    barrier: Option<Arc<Barrier>>,
    shutdown: watch::Receiver<bool>,
    report: WorkerReport,
}

impl Worker {
    /// # Arguments
    /// * `barrier` - shared by every worker of the pool when advances are synchronized
    pub fn new(
        id: usize,
        role: WorkerRole,
        state: Arc<SharedState>,
        seed: u64,
        barrier: Option<Arc<Barrier>>,
    ) -> Self {
        let shutdown = state.shutdown_signal();
        Self {
            id,
            role,
            state,
            rng: StdRng::seed_from_u64(seed),
            barrier,
            shutdown,
            report: WorkerReport {
                id,
                role,
                exams_marked: 0,
                questions_marked: 0,
                rubric_corrections: 0,
            },
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn role(&self) -> WorkerRole {
        self.role
    }

    /// Run to completion.
    ///
    /// A fatal error raises the pool's shutdown signal before it is returned, so
    /// sibling workers stop instead of waiting forever.
    pub async fn run(mut self) -> Result<WorkerReport> {
        let result = self.run_loop().await;
        match result {
            Ok(()) => Ok(self.report),
            Err(e) if e.is_cancellation() => {
                tracing::warn!("[TA {}] Cancelled", self.id);
                Err(e)
            }
            Err(e) => {
                tracing::error!("[TA {}] Fatal error: {}", self.id, e);
                self.state.emit(MarkingEvent::WorkerFailed {
                    worker: self.id,
                    reason: e.to_string(),
                });
                self.state.trigger_shutdown();
                Err(e)
            }
        }
    }

    async fn run_loop(&mut self) -> Result<()> {
        let mut phase = WorkerPhase::CheckSentinel;
        let mut student_id = 0;

        loop {
            phase = match phase {
                WorkerPhase::CheckSentinel => {
                    self.check_shutdown()?;
                    if self.state.is_sentinel() {
                        WorkerPhase::Done
                    } else {
                        student_id = self.state.current_student_id();
                        tracing::info!(
                            "[TA {}] Starting exam for student {}",
                            self.id,
                            format_student_id(student_id)
                        );
                        WorkerPhase::MarkRubric
                    }
                }
                WorkerPhase::MarkRubric => {
                    self.mark_rubric().await?;
                    WorkerPhase::ClaimLoop
                }
                WorkerPhase::ClaimLoop => {
                    self.claim_loop(student_id).await?;
                    WorkerPhase::MaybeAdvance
                }
                WorkerPhase::MaybeAdvance => {
                    self.maybe_advance().await?;
                    WorkerPhase::CheckSentinel
                }
                WorkerPhase::Done => break,
            };
        }

        tracing::info!("[TA {}] Sentinel exam reached. Exiting.", self.id);
        self.state.emit(MarkingEvent::SentinelReached { worker: self.id });
        Ok(())
    }

    async fn mark_rubric(&mut self) -> Result<()> {
        let range = self.state.config().rubric_delay();
        for question in 0..NUM_QUESTIONS {
            let delay = random_delay(&mut self.rng, range);
            self.pause(delay).await?;

            let outcome = self
                .state
                .correct_or_skip(self.id, question, &mut self.rng)
                .await?;
            if matches!(outcome, RubricOutcome::Corrected { .. }) {
                self.report.rubric_corrections += 1;
            }
        }
        Ok(())
    }

    async fn claim_loop(&mut self, student_id: u32) -> Result<()> {
        let marking = self.state.config().marking_delay();
        let backoff = self.state.config().retry_backoff();

        loop {
            match self.state.try_claim_or_finish(self.id, &mut self.rng).await {
                ClaimOutcome::Claimed(question) => {
                    let delay = random_delay(&mut self.rng, marking);
                    self.pause(delay).await?;

                    tracing::info!(
                        "[TA {}] Marked question {} for student {}",
                        self.id,
                        question + 1,
                        format_student_id(student_id)
                    );
                    self.state.metrics().record_question_marked();
                    self.state.emit(MarkingEvent::QuestionMarked {
                        worker: self.id,
                        student_id,
                        question,
                    });
                    self.report.questions_marked += 1;
                }
                ClaimOutcome::Retry => self.pause(backoff).await?,
                ClaimOutcome::Finished => break,
            }
        }

        tracing::info!(
            "[TA {}] Finished all questions for student {}",
            self.id,
            format_student_id(student_id)
        );
        self.report.exams_marked += 1;
        self.state.emit(MarkingEvent::ExamFinished {
            worker: self.id,
            student_id,
        });
        Ok(())
    }

    async fn maybe_advance(&mut self) -> Result<()> {
        // Everyone has seen FINISHED before the advancer touches the exam state
        self.rendezvous().await?;

        if self.role == WorkerRole::Advancer {
            let outcome = self.state.advance().await?;
            tracing::debug!("[TA {}] Advance: {:?}", self.id, outcome);
        }

        // Nobody re-checks the sentinel before the advance is published
        self.rendezvous().await
    }

    async fn rendezvous(&mut self) -> Result<()> {
        let Some(barrier) = self.barrier.clone() else {
            return Ok(());
        };

        tokio::select! {
            _ = barrier.wait() => Ok(()),
            _ = self.shutdown.wait_for(|stop| *stop) => Err(MarkingError::Cancelled),
        }
    }

    /// Sleep outside any guard, bailing out if the pool shuts down.
    async fn pause(&mut self, delay: Duration) -> Result<()> {
        if delay.is_zero() {
            tokio::task::yield_now().await;
            return self.check_shutdown();
        }

        tokio::select! {
            _ = tokio::time::sleep(delay) => Ok(()),
            _ = self.shutdown.wait_for(|stop| *stop) => Err(MarkingError::Cancelled),
        }
    }

    fn check_shutdown(&self) -> Result<()> {
        if *self.shutdown.borrow() {
            Err(MarkingError::Cancelled)
        } else {
            Ok(())
        }
    }
}
