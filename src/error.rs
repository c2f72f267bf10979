//! Error type for job pagination and runs.

use thiserror::Error;

use crate::types::StageError;

/// Errors returned by [`crate::Job::paginate`] and [`crate::Job::run`].
#[derive(Error, Debug)]
pub enum JobError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("job has no pages; call paginate before run")]
    NotPaginated,

    #[error(transparent)]
    Stage(#[from] StageError),

    #[error("run cancelled after {completed} pages")]
    Cancelled { completed: usize },

    #[error("{0} thread panicked")]
    WorkerPanicked(&'static str),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub type JobResult<T> = std::result::Result<T, JobError>;
