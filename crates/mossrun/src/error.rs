use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MossrunError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Job error: {0}")]
    Job(#[from] crate::jobs::JobError),

    #[error("MOSS client error: {0}")]
    Moss(#[from] crate::moss::MossError),

    #[error("Failed to install signal handler: {0}")]
    Signal(#[from] ctrlc::Error),

    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Invalid language '{code}': {reason}")]
    InvalidLanguage { code: String, reason: String },
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Failed to spawn worker: {0}")]
    SpawnFailed(String),

    #[error("Worker channel closed unexpectedly")]
    ChannelClosed,

    #[error("Job {0} is already queued or running in this pool")]
    AlreadyQueued(String),
}

pub type Result<T> = std::result::Result<T, MossrunError>;
