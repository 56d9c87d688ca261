//! Shared layout for the plain-text reports.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};

pub(crate) fn rule() -> String {
    "=".repeat(80)
}

pub(crate) fn thin_rule() -> String {
    "-".repeat(80)
}

/// Line-oriented text buffer.
#[derive(Default)]
pub(crate) struct TextReport {
    buf: String,
}

impl TextReport {
    pub(crate) fn line(&mut self, text: impl AsRef<str>) {
        self.buf.push_str(text.as_ref());
        self.buf.push('\n');
    }

    pub(crate) fn blank(&mut self) {
        self.buf.push('\n');
    }

    /// Title between two rules, followed by the timestamp.
    pub(crate) fn title(&mut self, title: &str, generated: DateTime<Local>) {
        self.line(rule());
        self.line(format!("  {title}"));
        self.line(rule());
        self.line(format!("Generated: {}", generated.format("%Y-%m-%d %H:%M:%S")));
    }

    /// Section heading underlined with dashes of the same width.
    pub(crate) fn heading(&mut self, heading: &str) {
        self.line(heading);
        self.line("-".repeat(heading.chars().count()));
    }

    /// Section heading between two rules.
    pub(crate) fn banner(&mut self, heading: &str) {
        self.line(rule());
        self.line(heading);
        self.line(rule());
    }

    pub(crate) fn finish(self) -> String {
        self.buf
    }
}

/// Write `content` to `dir/file_name`, creating `dir` as needed.
pub(crate) fn write_text(dir: &Path, file_name: &str, content: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;
    let path = dir.join(file_name);
    std::fs::write(&path, content)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

/// `[1, 2, 3]`.
pub(crate) fn bracketed<T: std::fmt::Display>(items: &[T]) -> String {
    let inner = items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{inner}]")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_is_underlined_to_width() {
        let mut report = TextReport::default();
        report.heading("BY DAY:");
        assert_eq!(report.finish(), "BY DAY:\n-------\n");
    }

    #[test]
    fn bracketed_list() {
        assert_eq!(bracketed(&[1, 3]), "[1, 3]");
        assert_eq!(bracketed::<i32>(&[]), "[]");
    }
}
