// Question-claim critical section

use super::{MarkingEvent, SharedState};
use crate::models::NUM_QUESTIONS;
use rand::Rng;

/// Result of one claim attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The caller now owns this question index and must mark it
    Claimed(usize),
    /// The probed question was already taken; back off and try again
    Retry,
    /// Every question of the current exam has been claimed
    Finished,
}

/// Completion set of the current exam.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionBoard {
    done: [bool; NUM_QUESTIONS],
}

impl QuestionBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all_done(&self) -> bool {
        self.done.iter().all(|done| *done)
    }

    /// Check-and-set for one probed index.
    pub fn probe(&mut self, index: usize) -> ClaimOutcome {
        if self.all_done() {
            return ClaimOutcome::Finished;
        }
        match self.done.get_mut(index) {
            Some(done) if !*done => {
                *done = true;
                ClaimOutcome::Claimed(index)
            }
            _ => ClaimOutcome::Retry,
        }
    }

    pub fn reset(&mut self) {
        self.done = [false; NUM_QUESTIONS];
    }

    pub fn done(&self) -> [bool; NUM_QUESTIONS] {
        self.done
    }
}

impl SharedState {
    /// Claim a random question of the current exam, or report that the exam is finished.
    ///
    /// The all-done check and the claim happen under one hold of the question guard,
    /// so no two workers ever get the same question.
    pub async fn try_claim_or_finish<R: Rng + ?Sized>(&self, worker: usize, rng: &mut R) -> ClaimOutcome {
        let mut board = self.questions.lock().await;
        let outcome = if board.all_done() {
            ClaimOutcome::Finished
        } else {
            board.probe(rng.gen_range(0..NUM_QUESTIONS))
        };
        drop(board);

        match outcome {
            ClaimOutcome::Claimed(question) => {
                self.metrics.record_claim();
                self.emit(MarkingEvent::QuestionClaimed {
                    worker,
                    student_id: self.current_student_id(),
                    question,
                });
            }
            ClaimOutcome::Retry => self.metrics.record_claim_retry(),
            ClaimOutcome::Finished => {}
        }
        outcome
    }

    /// Clear the completion set for a freshly loaded exam
    pub(crate) async fn reset_questions(&self) {
        self.questions.lock().await.reset();
    }
}
