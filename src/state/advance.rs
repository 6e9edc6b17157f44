// Exam-advance critical section

use super::{MarkingEvent, SharedState};
use crate::error::Result;
use crate::models::SENTINEL_STUDENT_ID;
use std::sync::atomic::Ordering;

/// Result of one advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// The next exam is now current
    Loaded { index: usize, student_id: u32 },
    /// No exam left; the sentinel has been published
    Exhausted { last_index: usize },
}

impl AdvanceOutcome {
    pub fn is_terminal(&self) -> bool {
        match self {
            Self::Loaded { student_id, .. } => *student_id == SENTINEL_STUDENT_ID,
            Self::Exhausted { .. } => true,
        }
    }
}

impl SharedState {
    /// Move the run to the next exam.
    ///
    /// Only the designated advancer may call this, after it has itself seen the
    /// current exam finish. The cursor is read, the record loaded and the cursor
    /// bumped under the loader guard. The completion set is then cleared under the
    /// question guard, and only after that is the new student id published, so a
    /// worker that sees the new id never sees the previous exam's flags.
    ///
    /// A malformed record is fatal for the whole run.
    pub async fn advance(&self) -> Result<AdvanceOutcome> {
        let mut cursor = self.loader.lock().await;
        let next = cursor.current_exam_index + 1;

        let Some(exam) = self.exam_list.get(next) else {
            let last_index = cursor.current_exam_index;
            drop(cursor);

            tracing::info!("No more exams (index {}), publishing sentinel", next);
            self.student_id.store(SENTINEL_STUDENT_ID, Ordering::Release);
            self.emit(MarkingEvent::ExamsExhausted { last_index });
            return Ok(AdvanceOutcome::Exhausted { last_index });
        };

        let student_id = self.exam_source.load_student_id(exam)?;
        cursor.current_exam_index = next;
        drop(cursor);

        self.reset_questions().await;
        self.student_id.store(student_id, Ordering::Release);

        self.metrics.record_exam_advanced();
        tracing::info!("Loaded exam {} (student {:04})", exam, student_id);
        if student_id == SENTINEL_STUDENT_ID {
            tracing::info!("Exam {} carries the sentinel student id", exam);
        }
        self.emit(MarkingEvent::ExamLoaded {
            index: next,
            student_id,
        });

        Ok(AdvanceOutcome::Loaded {
            index: next,
            student_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MarkingError;
    use crate::models::{MarkingConfig, NUM_QUESTIONS, Rubric};
    use crate::services::{MemoryExamSource, MemoryRubricStore};
    use crate::state::ClaimOutcome;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::sync::Arc;

    fn state_with_source(source: MemoryExamSource) -> SharedState {
        SharedState::initialize(
            MarkingConfig::instant(),
            Arc::new(MemoryRubricStore::new(Rubric::uniform('A'))),
            Arc::new(source),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_advance_walks_list_then_exhausts() {
        let state = state_with_source(MemoryExamSource::from_student_ids(&[10, 20, 30]));

        assert_eq!(
            state.advance().await.unwrap(),
            AdvanceOutcome::Loaded {
                index: 1,
                student_id: 20
            }
        );
        assert_eq!(state.current_student_id(), 20);

        let outcome = state.advance().await.unwrap();
        assert_eq!(
            outcome,
            AdvanceOutcome::Loaded {
                index: 2,
                student_id: 30
            }
        );
        assert!(!outcome.is_terminal());

        let outcome = state.advance().await.unwrap();
        assert_eq!(outcome, AdvanceOutcome::Exhausted { last_index: 2 });
        assert!(outcome.is_terminal());
        assert!(state.is_sentinel());
        assert_eq!(state.exam_snapshot().await.current_exam_index, 2);
        assert_eq!(state.metrics().exams_advanced(), 2);
    }

    #[tokio::test]
    async fn test_advance_resets_completion_set() {
        let state = state_with_source(MemoryExamSource::from_student_ids(&[10, 20]));
        let mut rng = StdRng::seed_from_u64(5);

        while state.try_claim_or_finish(0, &mut rng).await != ClaimOutcome::Finished {}
        assert!(state.exam_snapshot().await.all_done());

        state.advance().await.unwrap();

        let exam = state.exam_snapshot().await;
        assert_eq!(exam.student_id, 20);
        assert_eq!(exam.current_exam_index, 1);
        assert_eq!(exam.question_done, [false; NUM_QUESTIONS]);
    }

    #[tokio::test]
    async fn test_stored_sentinel_is_terminal() {
        let state = state_with_source(MemoryExamSource::from_student_ids(&[10, 9999, 30]));

        let outcome = state.advance().await.unwrap();

        assert!(outcome.is_terminal());
        assert!(state.is_sentinel());
    }

    #[tokio::test]
    async fn test_malformed_record_is_fatal() {
        let source = MemoryExamSource::new(vec![
            ("good".to_string(), "0010".to_string()),
            ("bad".to_string(), "student?".to_string()),
        ]);
        let state = state_with_source(source);

        let result = state.advance().await;

        assert!(matches!(result, Err(MarkingError::MalformedExam { .. })));
        assert_eq!(state.current_student_id(), 10);
        assert_eq!(state.exam_snapshot().await.current_exam_index, 0);
    }

    #[tokio::test]
    async fn test_events_for_advance() {
        let state = state_with_source(MemoryExamSource::from_student_ids(&[10, 20]));
        let mut rx = state.subscribe();

        state.advance().await.unwrap();
        state.advance().await.unwrap();

        assert_eq!(
            rx.try_recv().unwrap(),
            MarkingEvent::ExamLoaded {
                index: 1,
                student_id: 20
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            MarkingEvent::ExamsExhausted { last_index: 1 }
        );
    }
}
