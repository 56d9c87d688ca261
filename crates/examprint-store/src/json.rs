//! JSON directory store.
//!
//! Layout under the data directory:
//!
//! ```text
//! written.json      [WrittenAnnouncement]
//! oral.json         [OralAnnouncement]
//! questions.json    [Question]
//! assignments.json  [Assignment]
//! ```
//!
//! A missing file reads as an empty list.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use examprint_core::error::StoreError;
use examprint_core::model::{Assignment, OralAnnouncement, Question, WrittenAnnouncement};
use examprint_core::traits::ExamStore;

pub const WRITTEN_FILE: &str = "written.json";
pub const ORAL_FILE: &str = "oral.json";
pub const QUESTIONS_FILE: &str = "questions.json";
pub const ASSIGNMENTS_FILE: &str = "assignments.json";

/// Store backed by JSON files in one directory.
pub struct JsonStore {
    dir: PathBuf,
    name: String,
}

impl JsonStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref().to_path_buf();
        let name = format!("json:{}", dir.display());
        Self { dir, name }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the directory with empty record files, leaving existing files alone.
    pub async fn init(&self) -> Result<Vec<PathBuf>, StoreError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| io_error(&self.dir, e))?;
        let mut created = Vec::new();
        for file in [WRITTEN_FILE, ORAL_FILE, QUESTIONS_FILE, ASSIGNMENTS_FILE] {
            let path = self.dir.join(file);
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                continue;
            }
            tokio::fs::write(&path, "[]\n")
                .await
                .map_err(|e| io_error(&path, e))?;
            created.push(path);
        }
        Ok(created)
    }

    async fn read_list<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<T>, StoreError> {
        let path = self.dir.join(file);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("{} not found, treating as empty", path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(io_error(&path, e)),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|e| StoreError::Malformed {
            what: file.to_string(),
            message: e.to_string(),
        })
    }

    /// Write through a temporary file so a failed write leaves the old list intact.
    async fn write_list<T: Serialize>(&self, file: &str, items: &[T]) -> Result<(), StoreError> {
        let path = self.dir.join(file);
        let json = serde_json::to_string_pretty(items).map_err(|e| StoreError::Malformed {
            what: file.to_string(),
            message: e.to_string(),
        })?;
        let tmp = self.dir.join(format!("{file}.tmp"));
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| io_error(&tmp, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| io_error(&path, e))
    }
}

fn io_error(path: &Path, e: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

#[async_trait]
impl ExamStore for JsonStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn ping(&self) -> Result<(), StoreError> {
        match tokio::fs::metadata(&self.dir).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(StoreError::Unreachable(format!(
                "{} is not a directory",
                self.dir.display()
            ))),
            Err(e) => Err(StoreError::Unreachable(format!(
                "{}: {e}",
                self.dir.display()
            ))),
        }
    }

    async fn written_announcements(&self) -> Result<Vec<WrittenAnnouncement>, StoreError> {
        self.read_list(WRITTEN_FILE).await
    }

    async fn oral_announcements(&self) -> Result<Vec<OralAnnouncement>, StoreError> {
        self.read_list(ORAL_FILE).await
    }

    async fn questions(&self) -> Result<Vec<Question>, StoreError> {
        self.read_list(QUESTIONS_FILE).await
    }

    async fn assignments(&self) -> Result<Vec<Assignment>, StoreError> {
        self.read_list(ASSIGNMENTS_FILE).await
    }

    async fn save_assignments(&self, batch: &[Assignment]) -> Result<(), StoreError> {
        let mut stored: Vec<Assignment> = self.read_list(ASSIGNMENTS_FILE).await?;
        let mut taken: HashSet<i64> = stored.iter().map(|a| a.placement_id).collect();
        for assignment in batch {
            if !taken.insert(assignment.placement_id) {
                return Err(StoreError::DuplicateAssignment(assignment.placement_id));
            }
        }
        stored.extend_from_slice(batch);
        self.write_list(ASSIGNMENTS_FILE, &stored).await?;
        tracing::debug!(
            saved = batch.len(),
            total = stored.len(),
            "assignments written to {}",
            self.dir.display()
        );
        Ok(())
    }

    async fn clear_assignments(&self) -> Result<usize, StoreError> {
        let stored: Vec<Assignment> = self.read_list(ASSIGNMENTS_FILE).await?;
        self.write_list::<Assignment>(ASSIGNMENTS_FILE, &[]).await?;
        Ok(stored.len())
    }
}
