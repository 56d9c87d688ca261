//! CLI integration tests using assert_cmd.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const WRITTEN: &str = r#"[
  {"id": 1, "day": 1, "seat_no": 1, "session_key": "MATH-1", "exam_code": "MATH101", "exam_name": "Calculus",
   "curriculum_language": "en", "student_id": 501, "student_name": "Ada", "student_surname": "Lovelace",
   "exam_date": "2025-06-02", "day_name": "Monday", "start_time": "09:00:00", "end_time": "11:00:00",
   "room": "A101", "room_type": "aud", "building": "B1"},
  {"id": 2, "day": 1, "seat_no": 2, "session_key": "MATH-1", "exam_code": "MATH101", "exam_name": "Calculus",
   "curriculum_language": "en", "student_id": 502, "exam_date": "2025-06-02", "start_time": "09:00:00",
   "end_time": "11:00:00", "room": "A101", "room_type": "aud", "building": "B1"},
  {"id": 3, "day": 1, "seat_no": 3, "session_key": "MATH-1", "exam_code": "MATH101", "exam_name": "Calculus",
   "curriculum_language": "en", "student_id": 503, "exam_date": "2025-06-02", "start_time": "09:00:00",
   "end_time": "11:00:00", "room": "A101", "room_type": "aud", "building": "B1"},
  {"id": 4, "day": 1, "seat_no": 4, "session_key": "MATH-1", "exam_code": "MATH101", "exam_name": "Calculus",
   "curriculum_language": "en", "student_id": 504, "exam_date": "2025-06-02", "start_time": "09:00:00",
   "end_time": "11:00:00", "room": "A101", "room_type": "aud", "building": "B1"},
  {"id": 5, "day": 2, "seat_no": 1, "session_key": "PHYS-2", "exam_code": "PHYS201", "exam_name": "Mechanics",
   "curriculum_language": "en", "student_id": 505, "exam_date": "2025-06-03", "start_time": "13:00:00",
   "end_time": "15:00:00", "room": "B202", "room_type": "pclab", "building": "B2"},
  {"id": 6, "day": 2, "seat_no": 2, "session_key": "PHYS-2", "exam_code": "PHYS201", "exam_name": "Mechanics",
   "curriculum_language": "en", "student_id": 506, "exam_date": "2025-06-03", "start_time": "13:00:00",
   "end_time": "15:00:00", "room": "B202", "room_type": "pclab", "building": "B2"}
]"#;

const ORAL: &str = r#"[
  {"id": 100, "day": 1, "exam_code": "LANG101", "room": "C3", "student_id": 601, "student_surname": "Hopper"}
]"#;

const QUESTIONS: &str = r#"[
  {"id": "q1", "exam_code": "MATH101", "language": "en", "image_path": "exam-1\\q1.jpg"},
  {"id": "q2", "exam_code": "MATH101", "language": "en", "image_path": "exam-1\\q2.jpg"},
  {"id": "q3", "exam_code": "MATH101", "language": "en", "image_path": "exam-1\\q3.jpg"}
]"#;

fn examprint() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("examprint").unwrap();
    for var in [
        "EXAMPRINT_DATA_DIR",
        "EXAMPRINT_IMAGES_DIR",
        "EXAMPRINT_OUTPUT_DIR",
        "EXAMPRINT_RESERVE",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

/// Data, images and a config file pointing at them. Returns the config path.
fn fixture(dir: &Path) -> PathBuf {
    let data = dir.join("data");
    let images = dir.join("images");
    std::fs::create_dir_all(&data).unwrap();
    std::fs::create_dir_all(&images).unwrap();
    std::fs::write(data.join("written.json"), WRITTEN).unwrap();
    std::fs::write(data.join("oral.json"), ORAL).unwrap();
    std::fs::write(data.join("questions.json"), QUESTIONS).unwrap();
    for name in ["q1.jpg", "q2.jpg", "q3.jpg"] {
        std::fs::write(images.join(name), b"\xff\xd8image").unwrap();
    }
    write_config(dir, &data)
}

fn write_config(dir: &Path, data: &Path) -> PathBuf {
    let config = format!(
        "data_dir = {:?}\nimages_dir = {:?}\noutput_dir = {:?}\nreserve_count = 1\n",
        data.display().to_string(),
        dir.join("images").display().to_string(),
        dir.join("output").display().to_string(),
    );
    let path = dir.join("examprint.toml");
    std::fs::write(&path, config).unwrap();
    path
}

fn stored_assignments(dir: &Path) -> Vec<serde_json::Value> {
    let content = std::fs::read_to_string(dir.join("data/assignments.json")).unwrap();
    serde_json::from_str(&content).unwrap()
}

#[test]
fn assign_writes_assignments_and_reports() {
    let dir = TempDir::new().unwrap();
    let config = fixture(dir.path());

    examprint()
        .arg("assign")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("READY FOR PRINTING"))
        .stdout(predicate::str::contains("Assignment summary"))
        .stdout(predicate::str::contains("1 course-language combinations are missing questions"));

    assert_eq!(stored_assignments(dir.path()).len(), 4);
    let output = dir.path().join("output");
    let summary = std::fs::read_to_string(output.join("assignment_summary.txt")).unwrap();
    assert!(summary.contains("Day 2:\n  Total students: 2\n  Questions assigned: 0\n  Missing questions: 2"));
    let missing = std::fs::read_to_string(output.join("missing_questions.txt")).unwrap();
    assert!(missing.contains("Course: PHYS201 | Language: en"));
    assert!(!output.join("missing_image_files.txt").exists());
}

#[test]
fn reserve_keeps_third_question_unused() {
    let dir = TempDir::new().unwrap();
    let config = fixture(dir.path());

    examprint()
        .arg("assign")
        .arg("--config")
        .arg(&config)
        .assert()
        .success();

    let questions: Vec<String> = stored_assignments(dir.path())
        .iter()
        .map(|a| a["question_id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(questions, vec!["q1", "q2", "q1", "q2"]);
}

#[test]
fn second_assign_changes_nothing() {
    let dir = TempDir::new().unwrap();
    let config = fixture(dir.path());

    examprint()
        .arg("assign")
        .arg("--config")
        .arg(&config)
        .assert()
        .success();
    let first = std::fs::read_to_string(dir.path().join("data/assignments.json")).unwrap();

    // Day 2 still has no questions, so only its two students are pending.
    examprint()
        .arg("assign")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Assigned 0 questions, 2 students still missing"));
    let second = std::fs::read_to_string(dir.path().join("data/assignments.json")).unwrap();
    assert_eq!(first, second);
}

#[test]
fn print_before_assign_fails() {
    let dir = TempDir::new().unwrap();
    let config = fixture(dir.path());

    examprint()
        .arg("print")
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("run `examprint assign` first"));
}

#[test]
fn print_renders_valid_day_only() {
    let dir = TempDir::new().unwrap();
    let config = fixture(dir.path());

    examprint()
        .arg("assign")
        .arg("--config")
        .arg(&config)
        .assert()
        .success();

    examprint()
        .arg("print")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("printed"))
        .stdout(predicate::str::contains("skipped"))
        .stdout(predicate::str::contains("Printed days [1]"));

    let output = dir.path().join("output");
    let paper = output.join("day-1/0900-1100/A101/exam_papers/seat-001.json");
    let paper: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(paper).unwrap()).unwrap();
    assert_eq!(paper["question_id"], "q1");
    assert_eq!(paper["image_files"][0], "q1.jpg");
    assert!(output
        .join("day-1/0900-1100/A101/signature_forms/signature_form.json")
        .exists());
    assert!(output
        .join("day-1/oral/C3/signature_forms/signature_form.json")
        .exists());
    assert!(!output.join("day-2").exists());
    assert!(output.join("validation_report.txt").exists());
}

#[test]
fn print_selected_days() {
    let dir = TempDir::new().unwrap();
    let config = fixture(dir.path());

    examprint()
        .arg("assign")
        .arg("--config")
        .arg(&config)
        .assert()
        .success();

    examprint()
        .arg("print")
        .arg("--days")
        .arg("1")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("skipped").not());
}

#[test]
fn print_rejects_bad_day_list() {
    let dir = TempDir::new().unwrap();
    let config = fixture(dir.path());

    examprint()
        .arg("print")
        .arg("--days")
        .arg("1,monday")
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid day number"));
}

#[test]
fn validate_reports_missing_questions() {
    let dir = TempDir::new().unwrap();
    let config = fixture(dir.path());

    examprint()
        .arg("validate")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Status: FAILED"))
        .stdout(predicate::str::contains("MISSING_QUESTIONS_SUMMARY: 1"));

    let report =
        std::fs::read_to_string(dir.path().join("output/validation_report.txt")).unwrap();
    assert!(report.contains("=== MISSING_QUESTIONS_DETAIL (1 errors) ==="));
    assert!(report.contains("  • Course: PHYS201, Language: en"));
    assert!(!dir.path().join("data/assignments.json").exists());
}

#[test]
fn validate_reports_missing_images() {
    let dir = TempDir::new().unwrap();
    let config = fixture(dir.path());
    std::fs::remove_file(dir.path().join("images/q2.jpg")).unwrap();
    std::fs::write(dir.path().join("images/q3.jpg"), b"").unwrap();

    examprint()
        .arg("validate")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Image file not found: q2.jpg"))
        .stdout(predicate::str::contains("Image file is empty: q3.jpg"));
}

#[test]
fn unreachable_store_fails() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), &dir.path().join("no-such-dir"));

    examprint()
        .arg("assign")
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unreachable"));
}

#[test]
fn missing_config_file_fails() {
    examprint()
        .arg("validate")
        .arg("--config")
        .arg("nonexistent.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}

#[test]
fn clear_requires_confirmation() {
    let dir = TempDir::new().unwrap();
    let config = fixture(dir.path());

    examprint()
        .arg("clear")
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));
}

#[test]
fn clear_then_assign_starts_over() {
    let dir = TempDir::new().unwrap();
    let config = fixture(dir.path());

    examprint()
        .arg("assign")
        .arg("--config")
        .arg(&config)
        .assert()
        .success();

    examprint()
        .arg("clear")
        .arg("--yes")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 4 assignments"));
    assert!(stored_assignments(dir.path()).is_empty());

    examprint()
        .arg("assign")
        .arg("--config")
        .arg(&config)
        .assert()
        .success();
    assert_eq!(stored_assignments(dir.path()).len(), 4);
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    examprint()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created examprint.toml"))
        .stdout(predicate::str::contains("written.json"));

    assert!(dir.path().join("examprint.toml").exists());
    assert!(dir.path().join("data/questions.json").exists());
    assert!(dir.path().join("exam-images").is_dir());
}

#[test]
fn init_skips_existing_config() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("examprint.toml"), "reserve_count = 2\n").unwrap();

    examprint()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn help_output() {
    examprint()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("assign"))
        .stdout(predicate::str::contains("print"))
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("clear"));
}

#[test]
fn version_output() {
    examprint()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("examprint"));
}
