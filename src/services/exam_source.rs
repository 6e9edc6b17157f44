use crate::error::{MarkingError, Result};
use crate::models::ExamList;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// Source of exam records.
pub trait ExamSource: Send + Sync {
    /// Enumerate up to `max` exam identifiers, in the order they will be marked
    fn list_exams(&self, max: usize) -> Result<ExamList>;

    /// Read the student id out of the record identified by `exam`
    fn load_student_id(&self, exam: &str) -> Result<u32>;
}

/// Extract the student id: the first whitespace-delimited token, as an unsigned integer.
pub fn parse_student_id(exam: &str, text: &str) -> Result<u32> {
    let token = text
        .split_whitespace()
        .next()
        .ok_or_else(|| MarkingError::MalformedExam {
            exam: exam.to_string(),
            reason: "record is empty".to_string(),
        })?;

    token.parse::<u32>().map_err(|e| MarkingError::MalformedExam {
        exam: exam.to_string(),
        reason: format!("student id {:?}: {}", token, e),
    })
}

/// One file per exam inside a directory.
///
/// Files are marked in file-name order; sub-directories are ignored.
#[derive(Debug, Clone)]
pub struct DirExamSource {
    dir: Utf8PathBuf,
}

impl DirExamSource {
    pub fn new<P: AsRef<Utf8Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }
}

impl ExamSource for DirExamSource {
    fn list_exams(&self, max: usize) -> Result<ExamList> {
        let entries = self
            .dir
            .read_dir_utf8()
            .map_err(|e| MarkingError::io(&self.dir, e))?;

        let mut filenames = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| MarkingError::io(&self.dir, e))?;
            let file_type = entry
                .file_type()
                .map_err(|e| MarkingError::io(entry.path(), e))?;
            if !file_type.is_file() {
                tracing::debug!("Skipping non-file exam entry: {}", entry.path());
                continue;
            }
            filenames.push(entry.path().to_string());
        }

        filenames.sort();
        if filenames.len() > max {
            tracing::warn!(
                "Found {} exam records in {}, keeping the first {}",
                filenames.len(),
                self.dir,
                max
            );
            filenames.truncate(max);
        }

        tracing::info!("Found {} exams in {}", filenames.len(), self.dir);
        Ok(ExamList::new(filenames))
    }

    fn load_student_id(&self, exam: &str) -> Result<u32> {
        let text = fs::read_to_string(exam).map_err(|e| MarkingError::io(exam, e))?;
        parse_student_id(exam, &text)
    }
}

/// In-memory exam records as `(name, contents)` pairs, listed in the given order.
#[derive(Debug, Clone, Default)]
pub struct MemoryExamSource {
    records: Vec<(String, String)>,
}

impl MemoryExamSource {
    pub fn new(records: Vec<(String, String)>) -> Self {
        Self { records }
    }

    /// One well-formed record per student id, named `exam_<n>`
    pub fn from_student_ids(ids: &[u32]) -> Self {
        Self::new(
            ids.iter()
                .enumerate()
                .map(|(i, id)| (format!("exam_{}", i), format!("{:04}\n", id)))
                .collect(),
        )
    }
}

impl ExamSource for MemoryExamSource {
    fn list_exams(&self, max: usize) -> Result<ExamList> {
        Ok(ExamList::new(
            self.records
                .iter()
                .take(max)
                .map(|(name, _)| name.clone())
                .collect(),
        ))
    }

    fn load_student_id(&self, exam: &str) -> Result<u32> {
        let (_, text) = self
            .records
            .iter()
            .find(|(name, _)| name == exam)
            .ok_or_else(|| MarkingError::MalformedExam {
                exam: exam.to_string(),
                reason: "no such record".to_string(),
            })?;
        parse_student_id(exam, text)
    }
}
