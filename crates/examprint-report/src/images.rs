//! `missing_image_files.txt`: problems with assigned question images.

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Local};

use examprint_core::validation::{Issue, ValidationResult};

use crate::text::{rule, write_text, TextReport};

pub const MISSING_IMAGES_FILE: &str = "missing_image_files.txt";

fn numbered(report: &mut TextReport, issues: &[Issue]) {
    for (i, issue) in issues.iter().enumerate() {
        report.line(format!("[{}] {}", i + 1, issue.message));
        for (key, value) in &issue.context {
            report.line(format!("    {key}: {value}"));
        }
        report.blank();
    }
}

/// Generate the missing image files report.
///
/// `checked` is the number of question rows inspected, `images_dir` where
/// the files are expected.
pub fn generate_missing_images_report(
    images: &ValidationResult,
    checked: usize,
    images_dir: &str,
    generated: DateTime<Local>,
) -> String {
    let mut report = TextReport::default();
    report.title("MISSING IMAGE FILES REPORT", generated);
    report.blank();
    report.line("This report lists all image files that are missing or unreadable for");
    report.line("questions that have been assigned to students.");
    report.blank();
    report.line(format!("Total questions checked: {checked}"));
    report.line(format!("Errors: {}", images.error_count()));
    report.line(format!("Warnings: {}", images.warning_count()));
    report.blank();

    if images.has_errors() {
        report.banner("ERRORS:");
        report.blank();
        numbered(&mut report, images.errors());
    }
    if images.has_warnings() {
        report.banner("WARNINGS:");
        report.blank();
        numbered(&mut report, images.warnings());
    }

    report.banner("NOTE:");
    report.line("When printing, exam papers with missing images will still be generated");
    report.line("but will show placeholder text instead of the question image.");
    report.blank();
    report.line("NEXT STEPS:");
    report.line("1. Locate the missing image files");
    report.line(format!("2. Copy them to: {images_dir}"));
    report.line("3. Ensure filenames match exactly (case-sensitive)");
    report.line("4. Re-run assignment mode to validate again");
    report.blank();
    report.line(rule());
    report.finish()
}

/// Write `missing_image_files.txt` into `dir`.
pub fn write_missing_images_report(
    images: &ValidationResult,
    checked: usize,
    images_dir: &str,
    dir: &Path,
) -> Result<PathBuf> {
    let text = generate_missing_images_report(images, checked, images_dir, Local::now());
    write_text(dir, MISSING_IMAGES_FILE, &text)
}

#[cfg(test)]
mod tests {
    use examprint_core::validation::Category;

    use super::*;

    #[test]
    fn errors_and_warnings_are_numbered_with_context() {
        let mut images = ValidationResult::new();
        images.push(
            Issue::error(Category::ImageFile, "Image file not found: a.jpg")
                .with("path", "/img/a.jpg"),
        );
        images.push(
            Issue::error(Category::ImageFile, "Image file not found: b.jpg")
                .with("path", "/img/b.jpg"),
        );
        images.push(
            Issue::warning(Category::ImageFile, "Image file is empty: c.jpg").with("path", "/img/c.jpg"),
        );

        let text = generate_missing_images_report(&images, 7, "/img", Local::now());
        assert!(text.contains("Total questions checked: 7"));
        assert!(text.contains("Errors: 2\nWarnings: 1"));
        assert!(text.contains("[2] Image file not found: b.jpg\n    path: /img/b.jpg"));
        assert!(text.contains("WARNINGS:"));
        assert!(text.contains("[1] Image file is empty: c.jpg"));
        assert!(text.contains("2. Copy them to: /img"));
    }

    #[test]
    fn clean_result_skips_sections() {
        let text = generate_missing_images_report(&ValidationResult::new(), 0, "/img", Local::now());
        assert!(!text.contains("ERRORS:"));
        assert!(!text.contains("WARNINGS:"));
    }
}
