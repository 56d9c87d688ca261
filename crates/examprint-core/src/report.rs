//! Run report with JSON persistence.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::{
    AssignOutcome, DayPrint, DaySummary, PrintOutcome, RunMode, SnapshotCounts, ValidateOutcome,
};
use crate::missing::{MissingQuestionInfo, MissingQuestions};
use crate::validation::{Issue, ValidationResult};

/// Machine-readable record of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    pub mode: RunMode,
    /// Store the run read from.
    pub store: String,
    pub counts: SnapshotCounts,
    /// Assignments created by this run.
    #[serde(default)]
    pub new_assignments: usize,
    /// Per-day assignment progress (assign runs).
    #[serde(default)]
    pub days: Vec<DaySummary>,
    /// Per-day print results (print runs).
    #[serde(default)]
    pub printed: Vec<DayPrint>,
    #[serde(default)]
    pub missing: Vec<MissingQuestionInfo>,
    #[serde(default)]
    pub errors: Vec<Issue>,
    #[serde(default)]
    pub warnings: Vec<Issue>,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

impl RunReport {
    fn new(
        mode: RunMode,
        store: &str,
        counts: SnapshotCounts,
        missing: &MissingQuestions,
        issues: &ValidationResult,
        duration: Duration,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            mode,
            store: store.to_string(),
            counts,
            new_assignments: 0,
            days: Vec::new(),
            printed: Vec::new(),
            missing: missing.clone().into_vec(),
            errors: issues.errors().to_vec(),
            warnings: issues.warnings().to_vec(),
            duration_ms: duration.as_millis() as u64,
        }
    }

    pub fn from_assign(outcome: &AssignOutcome, store: &str) -> Self {
        let issues = ValidationResult::combine([outcome.validation.clone(), outcome.images.clone()]);
        Self {
            new_assignments: outcome.total_assigned(),
            days: outcome.days.clone(),
            ..Self::new(
                RunMode::Assign,
                store,
                outcome.counts,
                &outcome.missing,
                &issues,
                outcome.duration,
            )
        }
    }

    pub fn from_print(outcome: &PrintOutcome, store: &str) -> Self {
        Self {
            printed: outcome.days.clone(),
            ..Self::new(
                RunMode::Print,
                store,
                outcome.counts,
                &outcome.missing,
                &outcome.validation(),
                outcome.duration,
            )
        }
    }

    pub fn from_validate(outcome: &ValidateOutcome, store: &str) -> Self {
        Self::new(
            RunMode::Validate,
            store,
            outcome.counts,
            &outcome.missing,
            &outcome.validation,
            outcome.duration,
        )
    }

    /// True iff the run recorded no errors.
    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: RunReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }
}
