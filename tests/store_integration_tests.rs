//! Integration tests for the rubric and exam backing stores
//!
//! These tests verify:
//! - The `"<n>, <c>"` rubric format on disk
//! - Fatal errors for malformed rubric and exam records
//! - Exam list building from a directory

use camino::Utf8PathBuf;
use std::fs;
use tamark::services::{DirExamSource, ExamSource, FileRubricStore, RubricStore};
use tamark::{MarkingError, Rubric, RubricEntry};
use tempfile::TempDir;

fn temp_root() -> (TempDir, Utf8PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    (temp_dir, root)
}

#[test]
fn test_load_reference_rubric() {
    let (_temp_dir, root) = temp_root();
    let path = root.join("rubric.txt");
    fs::write(&path, "1, A\n2, B\n3, C\n4, D\n5, E\n").unwrap();

    let rubric = FileRubricStore::new(&path).load().unwrap();

    let chars: String = rubric.entries().iter().map(|e| e.rubric_char).collect();
    assert_eq!(chars, "ABCDE");
    assert_eq!(rubric.entries()[3], RubricEntry::new(4, 'D'));
}

#[test]
fn test_save_overwrites_whole_file() {
    let (_temp_dir, root) = temp_root();
    let path = root.join("rubric.txt");
    fs::write(&path, "stale contents that are much longer than a rubric\n").unwrap();

    FileRubricStore::new(&path).save(&Rubric::uniform('Q')).unwrap();

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "1, Q\n2, Q\n3, Q\n4, Q\n5, Q\n"
    );
}

#[test]
fn test_short_rubric_is_fatal() {
    let (_temp_dir, root) = temp_root();
    let path = root.join("rubric.txt");
    fs::write(&path, "1, A\n2, A\n3, A\n4, A\n").unwrap();

    let err = FileRubricStore::new(&path).load().unwrap_err();

    assert!(matches!(
        err,
        MarkingError::RubricEntryCount {
            expected: 5,
            found: 4
        }
    ));
}

#[test]
fn test_garbled_rubric_is_fatal() {
    let (_temp_dir, root) = temp_root();
    let path = root.join("rubric.txt");
    fs::write(&path, "1, A\n2, A\nthree, A\n4, A\n5, A\n").unwrap();

    let err = FileRubricStore::new(&path).load().unwrap_err();

    assert!(matches!(err, MarkingError::MalformedRubric { line: 3, .. }));
}

#[test]
fn test_exam_directory_listing() {
    let (_temp_dir, root) = temp_root();
    for (name, id) in [("b.txt", "0002"), ("a.txt", "0001"), ("c.txt", "0003")] {
        fs::write(root.join(name), format!("{}\nanswers\n", id)).unwrap();
    }

    let source = DirExamSource::new(&root);
    let list = source.list_exams(128).unwrap();

    assert_eq!(list.count(), 3);
    let ids: Vec<u32> = list
        .filenames()
        .iter()
        .map(|exam| source.load_student_id(exam).unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[test]
fn test_malformed_exam_record() {
    let (_temp_dir, root) = temp_root();
    fs::write(root.join("bad.txt"), "Student: Bob\n").unwrap();

    let source = DirExamSource::new(&root);
    let list = source.list_exams(128).unwrap();
    let err = source.load_student_id(list.get(0).unwrap()).unwrap_err();

    assert!(matches!(err, MarkingError::MalformedExam { .. }));
    assert!(err.to_string().contains("bad.txt"));
}

#[test]
fn test_empty_exam_directory() {
    let (_temp_dir, root) = temp_root();

    let list = DirExamSource::new(&root).list_exams(128).unwrap();

    assert!(list.is_empty());
}
