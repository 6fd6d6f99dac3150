use thiserror::Error;

use super::resolver::ResolutionError;
use crate::db::DatabaseError;
use crate::moss::FailureKind;
use crate::retry::RetryError;

/// Failure categories used when logging a job outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Recoverable,
    Fatal,
    Resolution,
    Configuration,
    Unclassified,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Recoverable => "recoverable",
            ErrorKind::Fatal => "fatal",
            ErrorKind::Resolution => "resolution",
            ErrorKind::Configuration => "configuration",
            ErrorKind::Unclassified => "unclassified",
        }
    }
}

#[derive(Error, Debug)]
pub enum JobError {
    #[error("Job {0} not found")]
    NotFound(String),

    #[error("Job {job_id} is {status}, only queued jobs can be processed")]
    NotQueued { job_id: String, status: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("MOSS run failed: {0}")]
    Retry(#[from] RetryError),

    #[error("Resolution failed: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl JobError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            JobError::NotFound(_) | JobError::NotQueued { .. } => ErrorKind::Fatal,
            JobError::Configuration(_) => ErrorKind::Configuration,
            JobError::Retry(e) => match e.kind() {
                FailureKind::Recoverable => ErrorKind::Recoverable,
                FailureKind::Fatal => ErrorKind::Fatal,
                FailureKind::Unclassified => ErrorKind::Unclassified,
            },
            JobError::Resolution(_) => ErrorKind::Resolution,
            JobError::Database(_) => ErrorKind::Unclassified,
        }
    }
}
