//! `missing_questions.txt`: pools that could not be served.

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Local};

use examprint_core::missing::MissingQuestions;

use crate::text::{rule, thin_rule, write_text, TextReport};

pub const MISSING_QUESTIONS_FILE: &str = "missing_questions.txt";

/// Generate the missing questions report.
pub fn generate_missing_questions_report(
    missing: &MissingQuestions,
    generated: DateTime<Local>,
) -> String {
    let mut report = TextReport::default();
    report.title("MISSING QUESTIONS REPORT", generated);
    report.blank();
    report.line("This report lists all course-language combinations that are missing questions.");
    report.line("Students in these sessions could not be assigned questions.");
    report.blank();
    report.line(format!(
        "Total course-language combinations missing: {}",
        missing.len()
    ));
    report.blank();
    report.line(rule());
    report.blank();

    for (i, info) in missing.iter().enumerate() {
        report.line(format!(
            "[{}] Course: {} | Language: {}",
            i + 1,
            info.exam_code,
            info.language
        ));
        report.line(thin_rule());
        report.line(format!("  Available questions: {}", info.available_questions));
        report.line(format!("  Total students affected: {}", info.total_students));
        report.line(format!("  Sessions affected: {}", info.sessions_affected));
        let days = info
            .days
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        report.line(format!("  Days affected: {days}"));
        report.blank();

        report.line("  SESSION DETAILS:");
        for session in &info.sessions {
            let day = session
                .day
                .map(|d| d.to_string())
                .unwrap_or_else(|| "?".into());
            report.line(format!(
                "    • Day {day} | Session: {} | Students: {}",
                session.session_key, session.students
            ));
        }
        report.blank();

        report.line("  RECOMMENDATION:");
        report.line(format!("    {}", info.recommendation()));
        report.line(
            "    With reserve logic: 3 questions → 2 usable, 2 questions → 2 usable, 1 question → warning",
        );
        report.blank();
        report.line(rule());
        report.blank();
    }

    report.line("NEXT STEPS:");
    report.line(thin_rule());
    report.line("1. Add missing questions to questions.json in the data directory");
    report.line("2. Ensure questions have correct exam_code and language values");
    report.line("3. Run assignment mode again: examprint assign");
    report.line("4. Application will automatically assign only to unassigned students");
    report.blank();
    report.line(rule());
    report.finish()
}

/// Write `missing_questions.txt` into `dir`.
pub fn write_missing_questions_report(missing: &MissingQuestions, dir: &Path) -> Result<PathBuf> {
    let text = generate_missing_questions_report(missing, Local::now());
    write_text(dir, MISSING_QUESTIONS_FILE, &text)
}

#[cfg(test)]
mod tests {
    use examprint_core::model::{PoolKey, SessionKey};

    use super::*;

    #[test]
    fn lists_each_pool_with_sessions() {
        let mut missing = MissingQuestions::new();
        let pool = PoolKey::new("MATH101", "en");
        missing.register(&pool, 0, &SessionKey::from("S1"), 3, Some(1));
        missing.register(&pool, 0, &SessionKey::from("S2"), 2, Some(2));
        missing.register(
            &PoolKey::new("PHYS201", "tr"),
            1,
            &SessionKey::from("S9"),
            4,
            None,
        );

        let text = generate_missing_questions_report(&missing, Local::now());
        assert!(text.contains("Total course-language combinations missing: 2"));
        assert!(text.contains("[1] Course: MATH101 | Language: en"));
        assert!(text.contains("  Total students affected: 5"));
        assert!(text.contains("  Sessions affected: 2"));
        assert!(text.contains("  Days affected: 1, 2"));
        assert!(text.contains("    • Day 2 | Session: S2 | Students: 2"));
        assert!(text.contains("    • Day ? | Session: S9 | Students: 4"));
        assert!(text.contains("    Add at least 3 questions to database for PHYS201 (tr)"));
        assert!(text.contains("[2] Course: PHYS201 | Language: tr\n"));
    }

    #[test]
    fn empty_report_still_has_next_steps() {
        let text = generate_missing_questions_report(&MissingQuestions::new(), Local::now());
        assert!(text.contains("Total course-language combinations missing: 0"));
        assert!(text.contains("NEXT STEPS:"));
        assert!(!text.contains("RECOMMENDATION"));
    }
}
