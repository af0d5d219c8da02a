//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use study_core::model::{ReflectionError, SessionError, SessionId, WeekId};

/// Errors emitted by `SessionService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionServiceError {
    #[error("session not found: {0}")]
    NotFound(SessionId),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ReflectionService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReflectionServiceError {
    #[error(transparent)]
    Reflection(#[from] ReflectionError),
    #[error("week {0} has no scheduled sessions")]
    UnknownWeek(WeekId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
