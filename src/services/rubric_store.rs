use crate::error::{MarkingError, Result};
use crate::models::{NUM_QUESTIONS, Rubric, RubricEntry};
use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use std::fs;
use std::sync::{LazyLock, Mutex, PoisonError};

/// `"<question_number>, <rubric_char>"` with free whitespace around both fields
static RUBRIC_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)\s*,\s*(\S)\s*$").expect("Invalid rubric line regex"));

/// Backing store for the rubric.
///
/// `save` is only ever called while the rubric guard is held, so implementations
/// do not need their own write serialization.
#[cfg_attr(test, mockall::automock)]
pub trait RubricStore: Send + Sync {
    /// Load exactly [`NUM_QUESTIONS`] entries
    fn load(&self) -> Result<Rubric>;

    /// Overwrite the backing representation with `rubric`
    fn save(&self, rubric: &Rubric) -> Result<()>;
}

/// Parse rubric records, one entry per non-blank line.
pub fn parse_rubric(text: &str) -> Result<Rubric> {
    let mut entries = Vec::with_capacity(NUM_QUESTIONS);

    for (line_no, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let malformed = || MarkingError::MalformedRubric {
            line: line_no + 1,
            content: line.to_string(),
        };

        let caps = RUBRIC_LINE.captures(line).ok_or_else(malformed)?;
        let question_number = caps[1].parse::<u32>().map_err(|_| malformed())?;
        let rubric_char = caps[2].chars().next().ok_or_else(malformed)?;

        entries.push(RubricEntry::new(question_number, rubric_char));
    }

    let found = entries.len();
    let entries: [RubricEntry; NUM_QUESTIONS] =
        entries
            .try_into()
            .map_err(|_| MarkingError::RubricEntryCount {
                expected: NUM_QUESTIONS,
                found,
            })?;

    Ok(Rubric::new(entries))
}

/// Rubric kept in a text file, rewritten in full on every save.
#[derive(Debug, Clone)]
pub struct FileRubricStore {
    path: Utf8PathBuf,
}

impl FileRubricStore {
    pub fn new<P: AsRef<Utf8Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl RubricStore for FileRubricStore {
    fn load(&self) -> Result<Rubric> {
        let text = fs::read_to_string(&self.path).map_err(|e| MarkingError::io(&self.path, e))?;
        let rubric = parse_rubric(&text)?;
        tracing::info!("Loaded rubric from {}", self.path);
        Ok(rubric)
    }

    fn save(&self, rubric: &Rubric) -> Result<()> {
        fs::write(&self.path, rubric.to_records()).map_err(|e| MarkingError::io(&self.path, e))?;
        tracing::debug!("Saved rubric to {}", self.path);
        Ok(())
    }
}

/// In-memory rubric store that records every save.
#[derive(Debug)]
pub struct MemoryRubricStore {
    initial: Rubric,
    saves: Mutex<Vec<Rubric>>,
}

impl MemoryRubricStore {
    pub fn new(initial: Rubric) -> Self {
        Self {
            initial,
            saves: Mutex::new(Vec::new()),
        }
    }

    /// Every rubric passed to `save`, oldest first
    pub fn saves(&self) -> Vec<Rubric> {
        self.saves
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Last saved rubric, or the initial one if nothing was saved
    pub fn current(&self) -> Rubric {
        self.saves().pop().unwrap_or_else(|| self.initial.clone())
    }
}

impl RubricStore for MemoryRubricStore {
    fn load(&self) -> Result<Rubric> {
        Ok(self.current())
    }

    fn save(&self, rubric: &Rubric) -> Result<()> {
        self.saves
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(rubric.clone());
        Ok(())
    }
}
