use super::rubric::NUM_QUESTIONS;

/// Reserved student id meaning "no more exams".
pub const SENTINEL_STUDENT_ID: u32 = 9999;

/// Upper bound on the number of exam records picked up from the backing store.
pub const MAX_EXAMS: usize = 128;

/// Student ids are shown zero-padded to four digits (`0042`).
pub fn format_student_id(student_id: u32) -> String {
    format!("{:04}", student_id)
}

/// The ordered exam records, built once before any worker starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExamList {
    filenames: Vec<String>,
}

impl ExamList {
    pub fn new(filenames: Vec<String>) -> Self {
        Self { filenames }
    }

    pub fn count(&self) -> usize {
        self.filenames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filenames.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.filenames.get(index).map(String::as_str)
    }

    pub fn filenames(&self) -> &[String] {
        &self.filenames
    }
}

/// Snapshot of the exam being marked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamState {
    pub student_id: u32,
    pub current_exam_index: usize,
    pub question_done: [bool; NUM_QUESTIONS],
}

impl ExamState {
    pub fn is_sentinel(&self) -> bool {
        self.student_id == SENTINEL_STUDENT_ID
    }

    pub fn all_done(&self) -> bool {
        self.question_done.iter().all(|done| *done)
    }
}
