//! Run controller.
//!
//! Sequences grouping, validation and allocation once per run, day by day in
//! ascending order. The controller is the only place holding cross-day state:
//! the set of placements that already have a persisted assignment.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::allocation::{allocate_session, ReservePolicy};
use crate::grouping::{group_by_day, group_sessions, undated, PoolGroup, QuestionPools};
use crate::missing::MissingQuestions;
use crate::model::{Announcement, Assignment, Day, PoolKey, Snapshot, WrittenAnnouncement};
use crate::papers::{day_calendar, prepare_day, PaperLabels};
use crate::traits::{DocumentRenderer, ExamStore, FileProbe, RenderSummary};
use crate::validation::{
    duplicate_id_issue, validate_bucket, validate_image_files, validate_oral,
    validate_question_availability, validate_written, ValidationResult,
};

/// Configuration for a run.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub reserve: ReservePolicy,
    /// Days the print workflow renders. Empty means every day.
    pub days_to_print: BTreeSet<Day>,
    pub labels: PaperLabels,
}

impl EngineConfig {
    pub fn prints_day(&self, day: Day) -> bool {
        self.days_to_print.is_empty() || self.days_to_print.contains(&day)
    }
}

/// Which workflow a run executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Assign,
    Print,
    Validate,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Assign => write!(f, "assign"),
            RunMode::Print => write!(f, "print"),
            RunMode::Validate => write!(f, "validate"),
        }
    }
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_day_start(&self, day: Day, mode: RunMode, students: usize);
    fn on_day_complete(&self, day: Day, detail: &str);
    fn on_day_skipped(&self, day: Day, reason: &str);
    fn on_run_complete(&self, mode: RunMode, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_day_start(&self, _: Day, _: RunMode, _: usize) {}
    fn on_day_complete(&self, _: Day, _: &str) {}
    fn on_day_skipped(&self, _: Day, _: &str) {}
    fn on_run_complete(&self, _: RunMode, _: Duration) {}
}

/// Record counts of a loaded snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotCounts {
    pub written: usize,
    pub oral: usize,
    pub questions: usize,
}

impl SnapshotCounts {
    fn of(snapshot: &Snapshot) -> Self {
        Self {
            written: snapshot.written.len(),
            oral: snapshot.oral.len(),
            questions: snapshot.questions.len(),
        }
    }
}

/// Assignment progress of one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySummary {
    pub day: Day,
    /// Written sign-ups of the day, assigned or not.
    pub total_students: usize,
    pub unassigned_before: usize,
    pub assigned: usize,
    /// Sign-ups left without a question after this run.
    pub skipped: usize,
    /// Sign-ups of the day holding an assignment after this run.
    pub total_assigned: usize,
}

impl DaySummary {
    pub fn is_ready(&self) -> bool {
        self.skipped == 0
    }

    pub fn status(&self) -> &'static str {
        if self.is_ready() {
            "READY FOR PRINTING"
        } else {
            "INCOMPLETE - Missing questions"
        }
    }
}

/// Result of the incremental assignment workflow.
#[derive(Debug, Clone, Default)]
pub struct AssignOutcome {
    pub counts: SnapshotCounts,
    pub existing_assignments: usize,
    /// Written sign-ups without an assignment when the run started.
    pub unassigned: usize,
    pub days: Vec<DaySummary>,
    pub new_assignments: Vec<Assignment>,
    pub missing: MissingQuestions,
    pub validation: ValidationResult,
    /// Image check over every assigned question.
    pub images: ValidationResult,
    pub images_checked: usize,
    /// Pending sign-ups without a day. They cannot be assigned.
    pub undated: Vec<Announcement>,
    pub duration: Duration,
}

impl AssignOutcome {
    /// Nothing was left to assign when the run started.
    pub fn all_assigned(&self) -> bool {
        self.unassigned == 0
    }

    pub fn total_assigned(&self) -> usize {
        self.new_assignments.len()
    }

    pub fn total_skipped(&self) -> usize {
        self.days.iter().map(|d| d.skipped).sum()
    }

    pub fn total_in_store(&self) -> usize {
        self.existing_assignments + self.total_assigned()
    }

    /// Days with nothing left to assign.
    pub fn ready_days(&self) -> Vec<Day> {
        self.days
            .iter()
            .filter(|d| d.is_ready())
            .map(|d| d.day)
            .collect()
    }
}

/// What happened to one day in the print workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DayStatus {
    Printed { papers: usize, forms: usize },
    /// Validation found errors; nothing was rendered.
    Skipped,
    /// The renderer failed.
    Failed { message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayPrint {
    pub day: Day,
    pub status: DayStatus,
    pub validation: ValidationResult,
    #[serde(default)]
    pub outputs: Vec<String>,
}

/// Result of the print workflow.
#[derive(Debug, Clone, Default)]
pub struct PrintOutcome {
    pub counts: SnapshotCounts,
    pub assignments_found: usize,
    pub days: Vec<DayPrint>,
    pub missing: MissingQuestions,
    pub duration: Duration,
}

impl PrintOutcome {
    /// No assignments exist yet; the assign workflow has to run first.
    pub fn needs_assignment(&self) -> bool {
        self.assignments_found == 0
    }

    pub fn printed_days(&self) -> Vec<Day> {
        self.days
            .iter()
            .filter(|d| matches!(d.status, DayStatus::Printed { .. }))
            .map(|d| d.day)
            .collect()
    }

    pub fn validation(&self) -> ValidationResult {
        ValidationResult::combine(self.days.iter().map(|d| d.validation.clone()))
    }
}

/// Result of the read-only validation workflow.
#[derive(Debug, Clone, Default)]
pub struct ValidateOutcome {
    pub counts: SnapshotCounts,
    pub validation: ValidationResult,
    pub missing: MissingQuestions,
    pub images_checked: usize,
    pub undated: Vec<Announcement>,
    pub duration: Duration,
}

/// Drives one run against a store.
///
/// Single-writer discipline is assumed, not enforced: two controllers
/// assigning against the same store at once can both allocate the same
/// placement.
pub struct RunController {
    store: Arc<dyn ExamStore>,
    probe: Arc<dyn FileProbe>,
    config: EngineConfig,
}

impl RunController {
    pub fn new(store: Arc<dyn ExamStore>, probe: Arc<dyn FileProbe>, config: EngineConfig) -> Self {
        Self {
            store,
            probe,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    /// Fail fast when the store cannot be reached.
    async fn connect(&self) -> Result<()> {
        tracing::info!("checking store {}", self.store.name());
        self.store
            .ping()
            .await
            .with_context(|| format!("store {} is unreachable", self.store.name()))
    }

    async fn load_snapshot(&self) -> Result<Snapshot> {
        let written = self
            .store
            .written_announcements()
            .await
            .context("failed to load written announcements")?;
        let oral = self
            .store
            .oral_announcements()
            .await
            .context("failed to load oral announcements")?;
        let questions = self
            .store
            .questions()
            .await
            .context("failed to load questions")?;
        tracing::info!(
            written = written.len(),
            oral = oral.len(),
            questions = questions.len(),
            "snapshot loaded"
        );
        Ok(Snapshot {
            written,
            oral,
            questions,
        })
    }

    async fn load_assignments(&self) -> Result<Vec<Assignment>> {
        self.store
            .assignments()
            .await
            .context("failed to load existing assignments")
    }

    /// Assign questions to every written sign-up that has none yet.
    pub async fn assign(&self, progress: &dyn ProgressReporter) -> Result<AssignOutcome> {
        let start = Instant::now();
        self.connect().await?;
        let snapshot = self.load_snapshot().await?;
        let existing = self.load_assignments().await?;

        let assigned_ids: HashSet<i64> = existing.iter().map(|a| a.placement_id).collect();
        let mut pending_ids = HashSet::new();
        let mut duplicates = ValidationResult::new();
        let pending: Vec<&WrittenAnnouncement> = snapshot
            .written
            .iter()
            .filter(|w| match w.id {
                None => true,
                Some(id) if assigned_ids.contains(&id) => false,
                Some(id) if !pending_ids.insert(id) => {
                    duplicates.push(duplicate_id_issue(w));
                    false
                }
                Some(_) => true,
            })
            .collect();
        if duplicates.has_errors() {
            tracing::warn!(
                count = duplicates.error_count(),
                "sign-ups sharing a placement id skipped, first occurrence kept"
            );
        }

        let mut outcome = AssignOutcome {
            counts: SnapshotCounts::of(&snapshot),
            existing_assignments: existing.len(),
            unassigned: pending.len(),
            ..Default::default()
        };
        tracing::info!(
            existing = outcome.existing_assignments,
            unassigned = outcome.unassigned,
            "assignment state loaded"
        );

        if pending.is_empty() {
            tracing::info!("all students already have question assignments");
            outcome.duration = start.elapsed();
            progress.on_run_complete(RunMode::Assign, outcome.duration);
            return Ok(outcome);
        }

        outcome.undated = pending
            .iter()
            .filter(|w| w.day.is_none())
            .map(|&w| Announcement::from(w.clone()))
            .collect();
        if !outcome.undated.is_empty() {
            tracing::warn!(
                count = outcome.undated.len(),
                "sign-ups without a day cannot be assigned"
            );
        }

        let pools = QuestionPools::build(&snapshot.questions);
        let all_days = group_by_day(&snapshot.written, &snapshot.oral, &snapshot.questions);
        let pending_days = group_by_day(pending.iter().copied(), &snapshot.oral, &snapshot.questions);
        let mut validations = Vec::new();

        for (day, bucket) in &pending_days {
            if bucket.written.is_empty() {
                continue;
            }
            let day = *day;
            let total_students = all_days.get(&day).map_or(0, |b| b.written.len());
            progress.on_day_start(day, RunMode::Assign, bucket.written.len());

            let groups = group_sessions(bucket.written.iter().copied());
            let (batch, skipped) = self.allocate_day(day, &groups, &pools, &mut outcome.missing);

            let assigned = if self.persist(day, &batch).await? {
                batch.len()
            } else {
                0
            };
            let skipped = skipped + (batch.len() - assigned);
            if assigned > 0 {
                outcome.new_assignments.extend(batch);
            }

            let summary = DaySummary {
                day,
                total_students,
                unassigned_before: bucket.written.len(),
                assigned,
                skipped,
                total_assigned: total_students - skipped,
            };
            tracing::info!(
                day,
                assigned,
                skipped,
                status = summary.status(),
                "day processed"
            );
            progress.on_day_complete(
                day,
                &format!("{assigned} assigned, {skipped} missing questions"),
            );
            outcome.days.push(summary);

            validations.push(validate_written(bucket.written.iter().copied()));
            validations.push(validate_oral(bucket.oral.iter().copied()));
        }

        validations.push(duplicates);
        outcome.validation = ValidationResult::combine(validations);
        outcome.validation.extend(outcome.missing.to_issues());

        let in_use: HashSet<(PoolKey, &str)> = existing
            .iter()
            .chain(outcome.new_assignments.iter())
            .map(|a| (a.pool_key(), a.question_id.as_str()))
            .collect();
        let assigned_questions: Vec<_> = snapshot
            .questions
            .iter()
            .filter(|q| in_use.contains(&(q.pool_key(), q.id.as_str())))
            .collect();
        outcome.images_checked = assigned_questions.len();
        outcome.images = validate_image_files(assigned_questions, self.probe.as_ref());
        tracing::info!(
            checked = outcome.images_checked,
            errors = outcome.images.error_count(),
            warnings = outcome.images.warning_count(),
            "image files checked"
        );

        outcome.duration = start.elapsed();
        progress.on_run_complete(RunMode::Assign, outcome.duration);
        Ok(outcome)
    }

    /// Allocate every pool of one day. Returns the batch and the number of
    /// sign-ups that could not be served.
    fn allocate_day(
        &self,
        day: Day,
        groups: &[PoolGroup<'_>],
        pools: &QuestionPools<'_>,
        missing: &mut MissingQuestions,
    ) -> (Vec<Assignment>, usize) {
        let assigned_at = Utc::now();
        let mut batch = Vec::new();
        let mut skipped = 0usize;

        for group in groups {
            let plan = self
                .config
                .reserve
                .plan_pool(pools.distinct_ids(&group.pool));
            let pool = match plan {
                Ok(pool) => pool,
                Err(e) => {
                    tracing::warn!(day, pool = %group.pool, "cannot allocate: {e}");
                    for session in &group.sessions {
                        missing.register(
                            &group.pool,
                            e.available(),
                            &session.key,
                            session.len(),
                            session.day(),
                        );
                    }
                    skipped += group.student_count();
                    continue;
                }
            };

            tracing::debug!(
                day,
                pool = %group.pool,
                usable = pool.len(),
                withheld = pool.withheld(),
                "pool planned"
            );
            for session in &group.sessions {
                let allocation = allocate_session(session, &pool, assigned_at);
                if !allocation.unbound.is_empty() {
                    tracing::warn!(
                        day,
                        session = %session.key,
                        count = allocation.unbound.len(),
                        "sign-ups without a placement id skipped"
                    );
                }
                skipped += allocation.unbound.len();
                batch.extend(allocation.assignments);
            }
        }

        (batch, skipped)
    }

    /// Save one day's batch. A non-fatal store error drops the batch and lets
    /// the run continue with the next day.
    async fn persist(&self, day: Day, batch: &[Assignment]) -> Result<bool> {
        if batch.is_empty() {
            return Ok(false);
        }
        match self.store.save_assignments(batch).await {
            Ok(()) => Ok(true),
            Err(e) if e.is_fatal() => {
                Err(anyhow::Error::new(e).context(format!("failed to save assignments for day {day}")))
            }
            Err(e) => {
                tracing::error!(day, "failed to save assignments: {e}");
                Ok(false)
            }
        }
    }

    /// Validate and render the selected days. Invalid days are skipped,
    /// the others still print.
    pub async fn print(
        &self,
        renderer: &dyn DocumentRenderer,
        progress: &dyn ProgressReporter,
    ) -> Result<PrintOutcome> {
        let start = Instant::now();
        self.connect().await?;
        let snapshot = self.load_snapshot().await?;
        let assignments = self.load_assignments().await?;

        let mut outcome = PrintOutcome {
            counts: SnapshotCounts::of(&snapshot),
            assignments_found: assignments.len(),
            ..Default::default()
        };
        if outcome.needs_assignment() {
            tracing::error!("no question assignments found, run assign first");
            outcome.duration = start.elapsed();
            progress.on_run_complete(RunMode::Print, outcome.duration);
            return Ok(outcome);
        }

        let by_placement: HashMap<i64, &Assignment> =
            assignments.iter().map(|a| (a.placement_id, a)).collect();
        let pools = QuestionPools::build(&snapshot.questions);
        let calendar = day_calendar(&snapshot.written);
        let days = group_by_day(&snapshot.written, &snapshot.oral, &snapshot.questions);

        for day in &self.config.days_to_print {
            if !days.contains_key(day) {
                tracing::warn!(day, "no sign-ups found for requested day");
            }
        }

        for (day, bucket) in days.iter().filter(|(d, _)| self.config.prints_day(**d)) {
            let day = *day;
            progress.on_day_start(day, RunMode::Print, bucket.written.len() + bucket.oral.len());

            let (validation, missing) = validate_bucket(bucket, &pools);
            outcome.missing.merge(missing);
            if !validation.is_valid() {
                tracing::warn!(
                    day,
                    errors = validation.error_count(),
                    "validation failed, skipping day"
                );
                progress.on_day_skipped(
                    day,
                    &format!("{} validation errors", validation.error_count()),
                );
                outcome.days.push(DayPrint {
                    day,
                    status: DayStatus::Skipped,
                    validation,
                    outputs: Vec::new(),
                });
                continue;
            }

            let documents = prepare_day(bucket, &by_placement, &pools, &calendar, &self.config.labels);
            let (status, outputs) = match renderer.render_day(&documents).await {
                Ok(RenderSummary {
                    papers,
                    forms,
                    outputs,
                }) => {
                    progress.on_day_complete(day, &format!("{papers} papers, {forms} forms"));
                    (DayStatus::Printed { papers, forms }, outputs)
                }
                Err(e) => {
                    tracing::error!(day, renderer = renderer.name(), "rendering failed: {e:#}");
                    progress.on_day_skipped(day, &format!("rendering failed: {e}"));
                    (
                        DayStatus::Failed {
                            message: format!("{e:#}"),
                        },
                        Vec::new(),
                    )
                }
            };
            outcome.days.push(DayPrint {
                day,
                status,
                validation,
                outputs,
            });
        }

        outcome.duration = start.elapsed();
        progress.on_run_complete(RunMode::Print, outcome.duration);
        Ok(outcome)
    }

    /// Validate the whole snapshot without writing anything.
    pub async fn validate(&self, progress: &dyn ProgressReporter) -> Result<ValidateOutcome> {
        let start = Instant::now();
        self.connect().await?;
        let snapshot = self.load_snapshot().await?;

        let pools = QuestionPools::build(&snapshot.questions);
        let days = group_by_day(&snapshot.written, &snapshot.oral, &snapshot.questions);
        let mut groups = Vec::new();
        for (day, bucket) in &days {
            progress.on_day_start(*day, RunMode::Validate, bucket.written.len() + bucket.oral.len());
            groups.extend(group_sessions(bucket.written.iter().copied()));
        }
        let (availability, missing) = validate_question_availability(&groups, &pools);

        let images = validate_image_files(&snapshot.questions, self.probe.as_ref());
        let validation = ValidationResult::combine([
            validate_written(&snapshot.written),
            validate_oral(&snapshot.oral),
            availability,
            images,
        ]);
        tracing::info!(
            errors = validation.error_count(),
            warnings = validation.warning_count(),
            "validation complete"
        );

        let outcome = ValidateOutcome {
            counts: SnapshotCounts::of(&snapshot),
            validation,
            missing,
            images_checked: snapshot.questions.len(),
            undated: undated(&snapshot),
            duration: start.elapsed(),
        };
        progress.on_run_complete(RunMode::Validate, outcome.duration);
        Ok(outcome)
    }

    /// Delete every persisted assignment.
    pub async fn clear(&self) -> Result<usize> {
        self.connect().await?;
        let removed = self
            .store
            .clear_assignments()
            .await
            .context("failed to clear assignments")?;
        tracing::info!(removed, "assignments cleared");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_status_labels() {
        let mut summary = DaySummary {
            day: 1,
            total_students: 10,
            unassigned_before: 4,
            assigned: 4,
            skipped: 0,
            total_assigned: 10,
        };
        assert!(summary.is_ready());
        assert_eq!(summary.status(), "READY FOR PRINTING");
        summary.skipped = 2;
        assert_eq!(summary.status(), "INCOMPLETE - Missing questions");
    }

    #[test]
    fn empty_day_selection_prints_everything() {
        let mut config = EngineConfig::default();
        assert!(config.prints_day(7));
        config.days_to_print = [1, 2].into_iter().collect();
        assert!(config.prints_day(2));
        assert!(!config.prints_day(3));
    }

    #[test]
    fn day_status_serializes_with_tag() {
        let json = serde_json::to_string(&DayStatus::Printed {
            papers: 3,
            forms: 1,
        })
        .unwrap();
        assert_eq!(json, r#"{"status":"printed","papers":3,"forms":1}"#);
    }
}
