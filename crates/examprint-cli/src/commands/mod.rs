//! Subcommand implementations and the pieces they share.

pub mod assign;
pub mod clear;
pub mod init;
pub mod print;
pub mod validate;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use examprint_core::engine::{EngineConfig, ProgressReporter, RunController, RunMode};
use examprint_core::model::Day;
use examprint_core::report::RunReport;
use examprint_store::{load_config_from, ExamPrintConfig};

/// Console progress reporter.
pub struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_day_start(&self, day: Day, mode: RunMode, students: usize) {
        eprintln!("  Day {day}: {mode} ({students} sign-ups)");
    }

    fn on_day_complete(&self, day: Day, detail: &str) {
        eprintln!("  Day {day}: done, {detail}");
    }

    fn on_day_skipped(&self, day: Day, reason: &str) {
        eprintln!("  Day {day}: SKIPPED, {reason}");
    }

    fn on_run_complete(&self, mode: RunMode, elapsed: Duration) {
        eprintln!("\n{mode} complete ({:.1}s)", elapsed.as_secs_f64());
    }
}

/// Loaded configuration plus the output directory the command writes to.
pub struct Setup {
    pub config: ExamPrintConfig,
    pub output: PathBuf,
}

impl Setup {
    pub fn load(config_path: Option<PathBuf>, output: Option<PathBuf>) -> Result<Self> {
        let config = load_config_from(config_path.as_deref())?;
        let output = output.unwrap_or_else(|| config.output_dir.clone());
        tracing::debug!(
            data_dir = %config.data_dir.display(),
            output = %output.display(),
            "configuration loaded"
        );
        Ok(Self { config, output })
    }

    pub fn controller(&self) -> RunController {
        self.controller_with(self.config.engine_config())
    }

    pub fn controller_with(&self, engine: EngineConfig) -> RunController {
        RunController::new(
            Arc::new(self.config.open_store()),
            Arc::new(self.config.open_probe()),
            engine,
        )
    }
}

/// Save the JSON run report next to the text reports.
pub fn save_run_report(report: &RunReport, output: &Path) -> Result<PathBuf> {
    let timestamp = report.created_at.format("%Y-%m-%dT%H%M%S");
    let path = output.join(format!("run-{}-{timestamp}.json", report.mode));
    report.save_json(&path)?;
    Ok(path)
}

/// Parse `"1,2, 3"` into day numbers.
pub fn parse_days(raw: &str) -> Result<Vec<Day>> {
    let days = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<Day>()
                .map_err(|_| anyhow::anyhow!("invalid day number: '{s}'"))
        })
        .collect::<Result<Vec<_>>>()?;
    anyhow::ensure!(!days.is_empty(), "--days must name at least one day");
    Ok(days)
}
