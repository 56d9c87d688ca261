//! `assignment_summary.txt`: outcome of an assign run, per day.

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Local};

use examprint_core::engine::AssignOutcome;

use crate::text::{bracketed, write_text, TextReport};

pub const ASSIGNMENT_SUMMARY_FILE: &str = "assignment_summary.txt";

/// Generate the assignment summary text.
pub fn generate_assignment_summary(outcome: &AssignOutcome, generated: DateTime<Local>) -> String {
    let mut report = TextReport::default();
    report.title("EXAM QUESTION ASSIGNMENT SUMMARY", generated);
    report.blank();

    report.heading("OVERALL SUMMARY:");
    report.line(format!(
        "Total written announcements: {}",
        outcome.counts.written
    ));
    report.line(format!("Total oral announcements: {}", outcome.counts.oral));
    report.line(format!(
        "Total questions in database: {}",
        outcome.total_in_store()
    ));
    report.line(format!(
        "Students with missing questions: {}",
        outcome.total_skipped()
    ));
    if !outcome.undated.is_empty() {
        report.line(format!(
            "Sign-ups without a day (not assigned): {}",
            outcome.undated.len()
        ));
    }
    report.blank();

    report.heading("BY DAY:");
    if outcome.all_assigned() {
        report.blank();
        report.line("All students already have question assignments.");
    }
    for day in &outcome.days {
        report.blank();
        report.line(format!("Day {}:", day.day));
        report.line(format!("  Total students: {}", day.total_students));
        report.line(format!("  Questions assigned: {}", day.total_assigned));
        report.line(format!("  Missing questions: {}", day.skipped));
        report.line(format!("  Status: {}", day.status()));
    }
    report.blank();

    report.banner("NEXT STEPS:");
    if outcome.total_skipped() > 0 {
        report.line("• Some students are still missing question assignments");
        report.line("• Add missing questions to the database and run assignment again");
        report.line("• The application will only assign questions to unassigned students");
        report.blank();
    }

    let ready = outcome.ready_days();
    if !ready.is_empty() {
        let days = ready
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        report.line(format!("• Days ready for printing: {}", bracketed(&ready)));
        report.line("• Set days_to_print in examprint.toml or pass --days");
        report.line(format!("• Run: examprint print --days {days}"));
    }
    report.blank();
    report.line(crate::text::rule());
    report.finish()
}

/// Write `assignment_summary.txt` into `dir`.
pub fn write_assignment_summary(outcome: &AssignOutcome, dir: &Path) -> Result<PathBuf> {
    let text = generate_assignment_summary(outcome, Local::now());
    write_text(dir, ASSIGNMENT_SUMMARY_FILE, &text)
}
