// Rubric critical section

use super::{MarkingEvent, SharedState};
use crate::error::{MarkingError, Result};
use rand::Rng;

/// What a worker did with one rubric entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RubricOutcome {
    Corrected { question: u32, from: char, to: char },
    Unchanged { question: u32, current: char },
}

impl SharedState {
    /// Possibly correct one rubric entry.
    ///
    /// Under the rubric guard: read the entry, and with the configured probability
    /// advance its character and persist the whole rubric before releasing. Callers
    /// do their random pre-delay before calling, never while holding the guard.
    pub async fn correct_or_skip<R: Rng + ?Sized>(
        &self,
        worker: usize,
        question_index: usize,
        rng: &mut R,
    ) -> Result<RubricOutcome> {
        let mut rubric = self.rubric.lock().await;
        self.metrics.record_rubric_check();

        let probability = self.config.correction_probability;
        let entry = rubric.entry_mut(question_index).ok_or_else(|| {
            MarkingError::InvalidConfig(format!("question index {} out of range", question_index))
        })?;
        let question = entry.question_number;

        if rng.gen_bool(probability) {
            if let Some(from) = entry.advance() {
                let to = entry.rubric_char;
                tracing::info!(
                    "[TA {}] Correcting rubric for Q{}: {} -> {}",
                    worker,
                    question,
                    from,
                    to
                );
                self.rubric_store.save(&rubric)?;
                self.metrics.record_rubric_correction();
                self.emit(MarkingEvent::RubricCorrected {
                    worker,
                    question,
                    from,
                    to,
                });
                return Ok(RubricOutcome::Corrected { question, from, to });
            }
            tracing::warn!(
                "[TA {}] Rubric for Q{} has no successor character, leaving it",
                worker,
                question
            );
        }

        let current = entry.rubric_char;
        tracing::info!(
            "[TA {}] No change to rubric for Q{} ({})",
            worker,
            question,
            current
        );
        self.emit(MarkingEvent::RubricUnchanged {
            worker,
            question,
            current,
        });
        Ok(RubricOutcome::Unchanged { question, current })
    }
}
