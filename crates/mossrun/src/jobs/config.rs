use std::path::PathBuf;

use crate::config::Config;
use crate::language::LanguageRegistry;
use crate::retry::BackoffPolicy;

use super::files;

/// Settings a [`JobProcessor`](super::JobProcessor) needs, resolved once.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    pub upload_directory: String,
    pub languages: LanguageRegistry,
    pub policy: BackoffPolicy,
    pub use_basename: bool,
    /// Used when the job carries no comment of its own.
    pub default_comment: String,
    /// Emit per-job statistics on success.
    pub debug: bool,
}

impl ProcessorConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            upload_directory: config.upload_directory.clone(),
            languages: LanguageRegistry::new(&config.languages),
            policy: BackoffPolicy::from_config(&config.retry),
            use_basename: config.moss.use_basename,
            default_comment: config.moss.comment.clone(),
            debug: config.debug,
        }
    }

    pub fn upload_root(&self, job_id: &str) -> PathBuf {
        files::upload_root(&self.upload_directory, job_id)
    }
}
