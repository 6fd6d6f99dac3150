pub mod config;
pub mod db;
pub mod error;
pub mod jobs;
pub mod language;
pub mod logging;
pub mod moss;
pub mod retry;
pub mod worker;

pub use config::{load_config, Config};
pub use db::{Database, DatabaseError};
pub use error::{ConfigError, MossrunError, Result, WorkerError};
pub use jobs::{JobError, JobProcessor, JobStatus, ProcessorConfig};
pub use language::LanguageRegistry;
pub use moss::{MossClient, MossError, ReportClient, ReportParser, UrlGenerator};
pub use retry::{BackoffPolicy, Cancellation, RetryController, RetryError};
pub use worker::{BatchSummary, JobOutcome, WorkerPool};
