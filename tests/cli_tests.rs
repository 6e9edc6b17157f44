//! End-to-end tests for the `tamark` binary
//!
//! These tests verify:
//! - Usage errors exit non-zero without touching the data directory
//! - A full run over a small data directory exits zero and prints the summary
//! - Fatal configuration errors exit non-zero

use camino::Utf8PathBuf;
use std::fs;
use std::process::{Command, Output};
use tamark::{ConfigManager, MarkingConfig};
use tempfile::TempDir;

const RUBRIC: &str = "1, A\n2, A\n3, A\n4, A\n5, A\n";

fn create_data_dir(student_ids: &[&str]) -> (TempDir, Utf8PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();

    let data = root.join("data");
    fs::create_dir_all(data.join("exams")).unwrap();
    fs::write(data.join("rubric.txt"), RUBRIC).unwrap();
    for (i, id) in student_ids.iter().enumerate() {
        fs::write(data.join("exams").join(format!("exam{:02}.txt", i)), *id).unwrap();
    }

    let config = MarkingConfig {
        seed: Some(17),
        ..MarkingConfig::instant()
    };
    ConfigManager::new(&data).save_marking_config(&config).unwrap();

    (temp_dir, root)
}

fn run_tamark(root: &Utf8PathBuf, num_tas: &str) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tamark"))
        .arg(num_tas)
        .arg("--data-dir")
        .arg(root.join("data"))
        .arg("--log-dir")
        .arg(root.join("logs"))
        .arg("--no-console")
        .output()
        .expect("failed to launch tamark")
}

#[test]
fn test_one_ta_is_usage_error() {
    let (_temp_dir, root) = create_data_dir(&["0042"]);

    let output = run_tamark(&root, "1");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("at least 2"), "stderr: {}", stderr);
    assert!(!root.join("logs").exists());
    assert_eq!(fs::read_to_string(root.join("data/rubric.txt")).unwrap(), RUBRIC);
}

#[test]
fn test_non_numeric_count_is_usage_error() {
    let (_temp_dir, root) = create_data_dir(&["0042"]);

    let output = run_tamark(&root, "many");

    assert!(!output.status.success());
}

#[test]
fn test_full_run_succeeds() {
    let (_temp_dir, root) = create_data_dir(&["0042", "0043"]);

    let output = run_tamark(&root, "3");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("All 3 TAs finished: 2 exams, 10 questions marked"));
    assert!(stdout.contains("Final student id: 9999"));

    let rubric = fs::read_to_string(root.join("data/rubric.txt")).unwrap();
    assert_eq!(rubric.lines().count(), 5);
}

#[test]
fn test_malformed_rubric_exits_non_zero() {
    let (_temp_dir, root) = create_data_dir(&["0042"]);
    fs::write(root.join("data/rubric.txt"), "1, A\n").unwrap();

    let output = run_tamark(&root, "2");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("exactly 5 entries"), "stderr: {}", stderr);
}
