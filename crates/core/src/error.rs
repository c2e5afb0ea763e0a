use thiserror::Error;

use crate::model::{DraftError, PageError, StageError, StudentError, WindowConfigError};

/// Umbrella error over the engine's validating constructors.
///
/// The computations themselves are total and never return it.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Page(#[from] PageError),
    #[error(transparent)]
    Stage(#[from] StageError),
    #[error(transparent)]
    WindowConfig(#[from] WindowConfigError),
    #[error(transparent)]
    Draft(#[from] DraftError),
    #[error(transparent)]
    Student(#[from] StudentError),
}
