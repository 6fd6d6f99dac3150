use std::collections::HashSet;
use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if !config.upload_directory.contains("{job_id}") {
        return Err(ConfigError::Validation {
            message: format!(
                "upload_directory must contain '{{job_id}}': {}",
                config.upload_directory
            ),
        });
    }

    if config.worker_count == 0 {
        return Err(ConfigError::Validation {
            message: "worker_count must be at least 1".to_string(),
        });
    }

    let retry = &config.retry;
    if !(1.0..=2.0).contains(&retry.backoff_base) {
        return Err(ConfigError::Validation {
            message: format!(
                "retry.backoff_base must be within [1, 2], got {}",
                retry.backoff_base
            ),
        });
    }
    if retry.max_attempts == 0 {
        return Err(ConfigError::Validation {
            message: "retry.max_attempts must be at least 1".to_string(),
        });
    }
    if retry.max_retry_duration_secs == 0 {
        return Err(ConfigError::Validation {
            message: "retry.max_retry_duration_secs must be positive".to_string(),
        });
    }

    let mut codes = HashSet::new();
    for language in &config.languages {
        if language.code.trim().is_empty() {
            return Err(ConfigError::InvalidLanguage {
                code: language.code.clone(),
                reason: "Empty language code".to_string(),
            });
        }
        if language.moss_name.trim().is_empty() {
            return Err(ConfigError::InvalidLanguage {
                code: language.code.clone(),
                reason: "Empty MOSS language identifier".to_string(),
            });
        }
        if !codes.insert(language.code.as_str()) {
            return Err(ConfigError::InvalidLanguage {
                code: language.code.clone(),
                reason: "Duplicate language code".to_string(),
            });
        }
    }

    Ok(())
}
