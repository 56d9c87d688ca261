//! Error types shared across examprint crates.
//!
//! `StoreError` is defined here rather than in `examprint-store` so the run
//! controller can tell a fatal connectivity failure from a per-call failure
//! without string matching.

use thiserror::Error;

/// Errors raised by a data store implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store cannot be reached at all.
    #[error("store unreachable: {0}")]
    Unreachable(String),

    /// Reading or writing the backing storage failed.
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    /// Stored records could not be decoded.
    #[error("malformed {what}: {message}")]
    Malformed { what: String, message: String },

    /// A placement already has a persisted assignment.
    #[error("placement {0} already has an assignment")]
    DuplicateAssignment(i64),
}

impl StoreError {
    /// Returns `true` if the whole run has to stop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StoreError::Unreachable(_))
    }
}

/// Why a question pool cannot be handed out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// The pool has no questions at all.
    #[error("no questions available")]
    NoQuestions,

    /// The configured reserve swallows the whole pool.
    #[error("after reserve, no questions left to use: total={total}, reserve={reserve}")]
    ReserveExceedsPool { total: usize, reserve: usize },
}

impl PoolError {
    /// Distinct questions the pool actually holds.
    pub fn available(&self) -> usize {
        match self {
            PoolError::NoQuestions => 0,
            PoolError::ReserveExceedsPool { total, .. } => *total,
        }
    }
}
