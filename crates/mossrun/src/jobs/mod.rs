pub mod config;
pub mod error;
pub mod files;
pub mod model;
pub mod processor;
pub mod resolver;

pub use config::ProcessorConfig;
pub use error::{ErrorKind, JobError};
pub use files::{collect_job_files, upload_root, JobFiles};
pub use model::{Job, JobStatus, Submission, SubmissionType};
pub use processor::JobProcessor;
pub use resolver::{ResolutionError, SubmissionResolver};
