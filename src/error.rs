use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can abort a marking run
///
/// Everything except [`MarkingError::Cancelled`] is fatal for the whole pool.
/// `Cancelled` is what sibling workers report after another worker raised the
/// shutdown signal.
#[derive(Error, Debug)]
pub enum MarkingError {
    #[error("Worker count must be at least {min}, got {got}")]
    InvalidWorkerCount { got: usize, min: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Malformed rubric record on line {line}: {content:?}")]
    MalformedRubric { line: usize, content: String },

    #[error("Rubric must contain exactly {expected} entries, found {found}")]
    RubricEntryCount { expected: usize, found: usize },

    #[error("Malformed exam record {exam}: {reason}")]
    MalformedExam { exam: String, reason: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Run cancelled after a fatal error in another worker")]
    Cancelled,

    #[error("Worker task failed: {0}")]
    WorkerPanicked(String),
}

impl MarkingError {
    pub(crate) fn io(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for errors that were caused by another worker's failure
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, MarkingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = MarkingError::InvalidWorkerCount { got: 1, min: 2 };
        assert_eq!(err.to_string(), "Worker count must be at least 2, got 1");

        let err = MarkingError::RubricEntryCount {
            expected: 5,
            found: 3,
        };
        assert!(err.to_string().contains("exactly 5"));
    }

    #[test]
    fn test_cancellation_detection() {
        assert!(MarkingError::Cancelled.is_cancellation());
        assert!(!MarkingError::InvalidConfig("x".into()).is_cancellation());
    }
}
