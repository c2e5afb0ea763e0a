//! Shared error types for the services crate.

use thiserror::Error;

use hifz_core::model::{DraftError, StudentError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("failed to render overview: {0}")]
    Render(#[from] serde_json::Error),
}

/// Errors emitted by `EntryService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EntryError {
    #[error(transparent)]
    Draft(#[from] DraftError),
    #[error(transparent)]
    Student(#[from] StudentError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ServicesInitError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
