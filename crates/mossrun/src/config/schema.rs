use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    /// Upload root for a job; `{job_id}` is replaced with the job identifier.
    pub upload_directory: String,
    #[serde(default)]
    pub database_path: Option<String>,
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub json_logs: bool,
    #[serde(default = "default_languages")]
    pub languages: Vec<LanguageConfig>,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub moss: MossConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

fn default_worker_count() -> usize {
    num_cpus::get()
}

/// One supported language: internal code, readable name, MOSS identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageConfig {
    pub code: String,
    pub name: String,
    pub moss_name: String,
    #[serde(default)]
    pub extensions: Vec<String>,
}

impl LanguageConfig {
    fn new(code: &str, name: &str, moss_name: &str, extensions: &[&str]) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            moss_name: moss_name.to_string(),
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
        }
    }
}

pub fn default_languages() -> Vec<LanguageConfig> {
    vec![
        LanguageConfig::new("PY", "Python", "python", &["py"]),
        LanguageConfig::new("JA", "Java", "java", &["java"]),
        LanguageConfig::new(
            "CP",
            "C++",
            "cc",
            &[
                "C", "cc", "cpp", "cxx", "c++", "h", "H", "hh", "hpp", "hxx", "h++",
            ],
        ),
        LanguageConfig::new("CX", "C", "c", &["c", "h"]),
        LanguageConfig::new("CS", "C#", "csharp", &["cs", "csx"]),
        LanguageConfig::new("JS", "Javascript", "javascript", &["js"]),
        LanguageConfig::new("PL", "Perl", "perl", &["pl", "plx", "pm", "xs", "t", "pod"]),
        LanguageConfig::new("MP", "MIPS assembly", "mips", &["asm", "s"]),
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Wait before attempt n+1 is `backoff_base^n` seconds. Must lie in [1, 2].
    #[serde(default = "default_backoff_base")]
    pub backoff_base: f64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Upper bound on the summed backoff waits of a single job.
    #[serde(default = "default_max_retry_duration")]
    pub max_retry_duration_secs: u64,
}

fn default_backoff_base() -> f64 {
    1.5
}

fn default_max_attempts() -> u32 {
    20
}

fn default_max_retry_duration() -> u64 {
    86_400
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            backoff_base: default_backoff_base(),
            max_attempts: default_max_attempts(),
            max_retry_duration_secs: default_max_retry_duration(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MossConfig {
    #[serde(default = "default_server")]
    pub server: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Generous by default: MOSS answers `query` only after the comparison has run.
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,
    #[serde(default = "default_true")]
    pub use_basename: bool,
    #[serde(default)]
    pub experimental: bool,
    #[serde(default)]
    pub comment: String,
}

fn default_server() -> String {
    "moss.stanford.edu".to_string()
}

fn default_port() -> u16 {
    7690
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_read_timeout() -> u64 {
    600
}

fn default_http_timeout() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

impl Default for MossConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            port: default_port(),
            connect_timeout_secs: default_connect_timeout(),
            read_timeout_secs: default_read_timeout(),
            http_timeout_secs: default_http_timeout(),
            use_basename: true,
            experimental: false,
            comment: String::new(),
        }
    }
}

/// Tuning parameters applied to jobs that were created without explicit values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default = "default_max_until_ignored")]
    pub max_until_ignored: u32,
    #[serde(default = "default_max_displayed_matches")]
    pub max_displayed_matches: u32,
}

fn default_max_until_ignored() -> u32 {
    10
}

fn default_max_displayed_matches() -> u32 {
    250
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            max_until_ignored: default_max_until_ignored(),
            max_displayed_matches: default_max_displayed_matches(),
        }
    }
}
