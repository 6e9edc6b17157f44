use crate::error::{MarkingError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::exam::MAX_EXAMS;

/// Run configuration from `marking.yaml`
///
/// Every field has a default, so a partial file (or no file at all) is valid.
/// Paths are relative to the data directory unless absolute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkingConfig {
    #[serde(default = "default_rubric_file")]
    pub rubric_file: String,

    #[serde(default = "default_exams_dir")]
    pub exams_dir: String,

    #[serde(default = "default_max_exams")]
    pub max_exams: usize,

    #[serde(default = "default_rubric_delay_min_ms")]
    pub rubric_delay_min_ms: u64,

    #[serde(default = "default_rubric_delay_max_ms")]
    pub rubric_delay_max_ms: u64,

    #[serde(default = "default_marking_min_ms")]
    pub marking_min_ms: u64,

    #[serde(default = "default_marking_max_ms")]
    pub marking_max_ms: u64,

    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    #[serde(default = "default_correction_probability")]
    pub correction_probability: f64,

    #[serde(default)]
    pub seed: Option<u64>,

    /// Barrier all workers before and after each exam advance
    #[serde(default = "default_synchronized_advance")]
    pub synchronized_advance: bool,

    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for MarkingConfig {
    fn default() -> Self {
        Self {
            rubric_file: default_rubric_file(),
            exams_dir: default_exams_dir(),
            max_exams: default_max_exams(),
            rubric_delay_min_ms: default_rubric_delay_min_ms(),
            rubric_delay_max_ms: default_rubric_delay_max_ms(),
            marking_min_ms: default_marking_min_ms(),
            marking_max_ms: default_marking_max_ms(),
            retry_backoff_ms: default_retry_backoff_ms(),
            correction_probability: default_correction_probability(),
            seed: None,
            synchronized_advance: default_synchronized_advance(),
            event_capacity: default_event_capacity(),
        }
    }
}

fn default_rubric_file() -> String {
    "rubric.txt".to_string()
}

fn default_exams_dir() -> String {
    "exams".to_string()
}

fn default_max_exams() -> usize {
    MAX_EXAMS
}

fn default_rubric_delay_min_ms() -> u64 {
    500
}

fn default_rubric_delay_max_ms() -> u64 {
    1000
}

fn default_marking_min_ms() -> u64 {
    1000
}

fn default_marking_max_ms() -> u64 {
    2000
}

fn default_retry_backoff_ms() -> u64 {
    100
}

fn default_correction_probability() -> f64 {
    0.5
}

fn default_synchronized_advance() -> bool {
    true
}

fn default_event_capacity() -> usize {
    1024
}

impl MarkingConfig {
    /// Configuration with every delay set to zero. Intended for tests and dry runs.
    pub fn instant() -> Self {
        Self {
            rubric_delay_min_ms: 0,
            rubric_delay_max_ms: 0,
            marking_min_ms: 0,
            marking_max_ms: 0,
            retry_backoff_ms: 0,
            ..Self::default()
        }
    }

    /// Reject settings the workers cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.rubric_delay_min_ms > self.rubric_delay_max_ms {
            return Err(MarkingError::InvalidConfig(format!(
                "rubric_delay_min_ms ({}) exceeds rubric_delay_max_ms ({})",
                self.rubric_delay_min_ms, self.rubric_delay_max_ms
            )));
        }
        if self.marking_min_ms > self.marking_max_ms {
            return Err(MarkingError::InvalidConfig(format!(
                "marking_min_ms ({}) exceeds marking_max_ms ({})",
                self.marking_min_ms, self.marking_max_ms
            )));
        }
        if !(0.0..=1.0).contains(&self.correction_probability) {
            return Err(MarkingError::InvalidConfig(format!(
                "correction_probability must be within [0, 1], got {}",
                self.correction_probability
            )));
        }
        if self.max_exams == 0 {
            return Err(MarkingError::InvalidConfig(
                "max_exams must be at least 1".to_string(),
            ));
        }
        if self.event_capacity == 0 {
            return Err(MarkingError::InvalidConfig(
                "event_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn rubric_delay(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.rubric_delay_min_ms),
            Duration::from_millis(self.rubric_delay_max_ms),
        )
    }

    pub fn marking_delay(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.marking_min_ms),
            Duration::from_millis(self.marking_max_ms),
        )
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_timing() {
        let config = MarkingConfig::default();
        assert_eq!(config.rubric_delay(), (Duration::from_millis(500), Duration::from_secs(1)));
        assert_eq!(config.marking_delay(), (Duration::from_secs(1), Duration::from_secs(2)));
        assert_eq!(config.retry_backoff(), Duration::from_millis(100));
        assert_eq!(config.correction_probability, 0.5);
        assert_eq!(config.max_exams, 128);
        assert!(config.synchronized_advance);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let config = MarkingConfig {
            marking_min_ms: 10,
            marking_max_ms: 5,
            ..MarkingConfig::default()
        };
        assert!(matches!(config.validate(), Err(MarkingError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_bad_probability() {
        let config = MarkingConfig {
            correction_probability: 1.5,
            ..MarkingConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: MarkingConfig = serde_yaml_ng::from_str("retry_backoff_ms: 5\nseed: 7\n").unwrap();
        assert_eq!(config.retry_backoff_ms, 5);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.rubric_file, "rubric.txt");
        assert_eq!(config.exams_dir, "exams");
    }

    #[test]
    fn test_instant_is_valid() {
        let config = MarkingConfig::instant();
        assert!(config.validate().is_ok());
        assert_eq!(config.marking_delay(), (Duration::ZERO, Duration::ZERO));
    }
}
