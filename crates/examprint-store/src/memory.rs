//! In-memory store for testing.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use examprint_core::error::StoreError;
use examprint_core::model::{Assignment, OralAnnouncement, Question, Snapshot, WrittenAnnouncement};
use examprint_core::traits::ExamStore;

/// A store kept entirely in memory, for exercising the run controller
/// without touching the filesystem.
///
/// Can be switched into an unreachable state or made to reject saves.
pub struct MemoryStore {
    snapshot: Mutex<Snapshot>,
    assignments: Mutex<Vec<Assignment>>,
    unreachable: AtomicBool,
    reject_saves: AtomicBool,
    /// Number of `save_assignments` calls made.
    save_calls: AtomicU32,
    /// Number of snapshot loads (written announcement reads).
    load_calls: AtomicU32,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryStore {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
            assignments: Mutex::new(Vec::new()),
            unreachable: AtomicBool::new(false),
            reject_saves: AtomicBool::new(false),
            save_calls: AtomicU32::new(0),
            load_calls: AtomicU32::new(0),
        }
    }

    /// Start with assignments already persisted.
    pub fn with_assignments(self, assignments: Vec<Assignment>) -> Self {
        *lock(&self.assignments) = assignments;
        self
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::Relaxed);
    }

    /// Make every save fail with a non-fatal I/O error.
    pub fn set_reject_saves(&self, reject: bool) {
        self.reject_saves.store(reject, Ordering::Relaxed);
    }

    /// Replace the sign-ups and questions, keeping persisted assignments.
    pub fn replace_snapshot(&self, snapshot: Snapshot) {
        *lock(&self.snapshot) = snapshot;
    }

    pub fn stored_assignments(&self) -> Vec<Assignment> {
        lock(&self.assignments).clone()
    }

    pub fn save_calls(&self) -> u32 {
        self.save_calls.load(Ordering::Relaxed)
    }

    pub fn load_calls(&self) -> u32 {
        self.load_calls.load(Ordering::Relaxed)
    }

    fn check_reachable(&self) -> Result<(), StoreError> {
        if self.unreachable.load(Ordering::Relaxed) {
            Err(StoreError::Unreachable("memory store switched off".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ExamStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_reachable()
    }

    async fn written_announcements(&self) -> Result<Vec<WrittenAnnouncement>, StoreError> {
        self.check_reachable()?;
        self.load_calls.fetch_add(1, Ordering::Relaxed);
        Ok(lock(&self.snapshot).written.clone())
    }

    async fn oral_announcements(&self) -> Result<Vec<OralAnnouncement>, StoreError> {
        self.check_reachable()?;
        Ok(lock(&self.snapshot).oral.clone())
    }

    async fn questions(&self) -> Result<Vec<Question>, StoreError> {
        self.check_reachable()?;
        Ok(lock(&self.snapshot).questions.clone())
    }

    async fn assignments(&self) -> Result<Vec<Assignment>, StoreError> {
        self.check_reachable()?;
        Ok(self.stored_assignments())
    }

    async fn save_assignments(&self, batch: &[Assignment]) -> Result<(), StoreError> {
        self.check_reachable()?;
        self.save_calls.fetch_add(1, Ordering::Relaxed);
        if self.reject_saves.load(Ordering::Relaxed) {
            return Err(StoreError::Io {
                path: "memory".into(),
                message: "saves rejected".into(),
            });
        }

        let mut stored = lock(&self.assignments);
        let mut taken: HashSet<i64> = stored.iter().map(|a| a.placement_id).collect();
        for assignment in batch {
            if !taken.insert(assignment.placement_id) {
                return Err(StoreError::DuplicateAssignment(assignment.placement_id));
            }
        }
        stored.extend_from_slice(batch);
        Ok(())
    }

    async fn clear_assignments(&self) -> Result<usize, StoreError> {
        self.check_reachable()?;
        let mut stored = lock(&self.assignments);
        let removed = stored.len();
        stored.clear();
        Ok(removed)
    }
}
