// Marking metrics
//
// Lock-free counters updated from inside and around the critical sections

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Counters for one marking run.
///
/// Uses atomic operations so workers can record without taking any guard.
#[derive(Debug)]
pub struct MarkingMetrics {
    /// Rubric entries inspected
    rubric_checks: AtomicU64,

    /// Rubric entries advanced (and persisted)
    rubric_corrections: AtomicU64,

    /// Successful question claims
    questions_claimed: AtomicU64,

    /// Claim attempts that hit an already-taken question
    claim_retries: AtomicU64,

    /// Questions whose marking delay completed
    questions_marked: AtomicU64,

    /// Successful advances to a next exam record
    exams_advanced: AtomicU64,

    start_time: Instant,
}

impl MarkingMetrics {
    pub fn new() -> Self {
        Self {
            rubric_checks: AtomicU64::new(0),
            rubric_corrections: AtomicU64::new(0),
            questions_claimed: AtomicU64::new(0),
            claim_retries: AtomicU64::new(0),
            questions_marked: AtomicU64::new(0),
            exams_advanced: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_rubric_check(&self) {
        self.rubric_checks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rubric_correction(&self) {
        self.rubric_corrections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_claim(&self) {
        self.questions_claimed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_claim_retry(&self) {
        self.claim_retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_question_marked(&self) {
        self.questions_marked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_exam_advanced(&self) {
        self.exams_advanced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn rubric_checks(&self) -> u64 {
        self.rubric_checks.load(Ordering::Relaxed)
    }

    pub fn rubric_corrections(&self) -> u64 {
        self.rubric_corrections.load(Ordering::Relaxed)
    }

    pub fn questions_claimed(&self) -> u64 {
        self.questions_claimed.load(Ordering::Relaxed)
    }

    pub fn claim_retries(&self) -> u64 {
        self.claim_retries.load(Ordering::Relaxed)
    }

    pub fn questions_marked(&self) -> u64 {
        self.questions_marked.load(Ordering::Relaxed)
    }

    pub fn exams_advanced(&self) -> u64 {
        self.exams_advanced.load(Ordering::Relaxed)
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Fraction of claim attempts that had to retry
    pub fn retry_ratio(&self) -> f64 {
        let retries = self.claim_retries();
        let attempts = retries + self.questions_claimed();
        if attempts > 0 {
            retries as f64 / attempts as f64
        } else {
            0.0
        }
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Marking Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Rubric: {} checks, {} corrections",
            self.rubric_checks(),
            self.rubric_corrections()
        );
        tracing::info!(
            "Questions: {} claimed, {} marked, {} retries ({:.1}% of attempts)",
            self.questions_claimed(),
            self.questions_marked(),
            self.claim_retries(),
            self.retry_ratio() * 100.0
        );
        tracing::info!("Exams advanced: {}", self.exams_advanced());
    }
}

impl Default for MarkingMetrics {
    fn default() -> Self {
        Self::new()
    }
}
