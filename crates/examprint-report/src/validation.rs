//! `validation_report.txt` and the console validation summary.

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Local};

use examprint_core::validation::{Category, ValidationResult};

use crate::text::{rule, write_text, TextReport};

pub const VALIDATION_REPORT_FILE: &str = "validation_report.txt";

const CONSOLE_ERRORS: usize = 5;
const CONSOLE_WARNINGS: usize = 3;

fn status(result: &ValidationResult) -> &'static str {
    if result.is_valid() {
        "PASSED"
    } else {
        "FAILED"
    }
}

/// Generate the full validation report.
pub fn generate_validation_report(result: &ValidationResult, generated: DateTime<Local>) -> String {
    let mut report = TextReport::default();
    report.title("EXAM PRINT VALIDATION REPORT", generated);
    report.blank();

    report.heading("SUMMARY:");
    report.line(format!("Status: {}", status(result)));
    report.line(format!("Errors: {}", result.error_count()));
    report.line(format!("Warnings: {}", result.warning_count()));
    report.blank();

    if result.has_errors() {
        report.heading("ERRORS:");
        let mut number = 1;
        for (category, issues) in result.errors_by_category() {
            report.blank();
            report.line(format!("=== {category} ({} errors) ===", issues.len()));
            if category == Category::MissingQuestionsDetail {
                report.heading("Missing questions by Course-Language:");
                for issue in issues {
                    if issue.context.is_empty() {
                        report.line(format!("  • {}", issue.message));
                    } else {
                        let context = issue
                            .context
                            .iter()
                            .map(|(k, v)| format!("{k}={v}"))
                            .collect::<Vec<_>>()
                            .join(", ");
                        report.line(format!("  • {} - {context}", issue.message));
                    }
                }
            } else {
                for issue in issues {
                    report.line(format!("{number}. {issue}"));
                    number += 1;
                }
            }
        }
        report.blank();
    }

    if result.has_warnings() {
        report.heading("WARNINGS:");
        for (i, issue) in result.warnings().iter().enumerate() {
            report.line(format!("{}. {issue}", i + 1));
        }
    }

    report.blank();
    report.line(rule());
    report.line("End of Report");
    report.line(rule());
    report.finish()
}

/// Write `validation_report.txt` into `dir`.
pub fn write_validation_report(result: &ValidationResult, dir: &Path) -> Result<PathBuf> {
    let text = generate_validation_report(result, Local::now());
    write_text(dir, VALIDATION_REPORT_FILE, &text)
}

/// Short console summary: counts, errors per category, the first few
/// errors and warnings.
pub fn console_summary(result: &ValidationResult) -> Vec<String> {
    let mut lines = vec![
        "=== Validation Summary ===".to_string(),
        format!("Status: {}", status(result)),
        format!("Total Errors: {}", result.error_count()),
        format!("Total Warnings: {}", result.warning_count()),
    ];

    if result.has_errors() {
        lines.push(String::new());
        lines.push("Errors by category:".into());
        for (category, issues) in result.errors_by_category() {
            lines.push(format!("  - {category}: {}", issues.len()));
        }
        lines.push(String::new());
        lines.push(format!("First {CONSOLE_ERRORS} errors:"));
        for issue in result.errors().iter().take(CONSOLE_ERRORS) {
            lines.push(format!("  - [{}] {}", issue.category, issue.message));
        }
        if result.error_count() > CONSOLE_ERRORS {
            lines.push(format!(
                "  ... and {} more errors",
                result.error_count() - CONSOLE_ERRORS
            ));
        }
    }

    if result.has_warnings() {
        lines.push(String::new());
        lines.push("Warnings:".into());
        for issue in result.warnings().iter().take(CONSOLE_WARNINGS) {
            lines.push(format!("  - {}", issue.message));
        }
        if result.warning_count() > CONSOLE_WARNINGS {
            lines.push(format!(
                "  ... and {} more warnings",
                result.warning_count() - CONSOLE_WARNINGS
            ));
        }
    }

    lines
}
