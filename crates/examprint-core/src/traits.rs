//! Collaborator traits for data stores, document renderers and file probes.
//!
//! Implemented by the `examprint-store` and `examprint-report` crates.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::model::{Assignment, OralAnnouncement, Question, WrittenAnnouncement};
use crate::papers::DayDocuments;

// ---------------------------------------------------------------------------
// Data store
// ---------------------------------------------------------------------------

/// Read/write access to sign-ups, questions and persisted assignments.
///
/// No locking is implied. Two runs writing to the same store concurrently can
/// double-allocate; callers are expected to run one writer at a time.
#[async_trait]
pub trait ExamStore: Send + Sync {
    /// Human-readable store name (e.g. "json:./data").
    fn name(&self) -> &str;

    /// Check connectivity. Failure here aborts a run before anything else.
    async fn ping(&self) -> Result<(), StoreError>;

    async fn written_announcements(&self) -> Result<Vec<WrittenAnnouncement>, StoreError>;

    async fn oral_announcements(&self) -> Result<Vec<OralAnnouncement>, StoreError>;

    async fn questions(&self) -> Result<Vec<Question>, StoreError>;

    async fn assignments(&self) -> Result<Vec<Assignment>, StoreError>;

    /// Persist a batch. Rejects any placement that already has an assignment.
    async fn save_assignments(&self, batch: &[Assignment]) -> Result<(), StoreError>;

    /// Delete every persisted assignment, returning how many were removed.
    async fn clear_assignments(&self) -> Result<usize, StoreError>;
}

// ---------------------------------------------------------------------------
// Document renderer
// ---------------------------------------------------------------------------

/// Turns one day's prepared documents into output.
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    fn name(&self) -> &str;

    async fn render_day(&self, documents: &DayDocuments) -> anyhow::Result<RenderSummary>;
}

/// What a renderer produced for one day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderSummary {
    pub papers: usize,
    pub forms: usize,
    /// Paths or identifiers of everything written.
    #[serde(default)]
    pub outputs: Vec<String>,
}

// ---------------------------------------------------------------------------
// File probe
// ---------------------------------------------------------------------------

/// State of a question image on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Readable,
    Empty,
    Unreadable,
    Missing,
}

/// Answers whether a question image can be used.
pub trait FileProbe: Send + Sync {
    fn probe(&self, file_name: &str) -> FileStatus;

    /// Where the probe looks for `file_name`, for reporting.
    fn locate(&self, file_name: &str) -> String;
}
