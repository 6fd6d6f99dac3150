use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Everything needed to submit one batch to MOSS.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionRequest {
    /// The user's MOSS account identifier.
    pub user_id: String,
    /// Language identifier as MOSS expects it (e.g. `python`).
    pub language: String,
    /// Skeleton code shared by all submissions; excluded from matching.
    pub base_files: Vec<PathBuf>,
    pub files: Vec<PathBuf>,
    /// `-m`: passages appearing in more than this many files are ignored.
    pub max_until_ignored: u32,
    /// `-n`: number of matching file pairs shown in the report.
    pub max_displayed_matches: u32,
    /// Send file names only instead of full paths.
    pub use_basename: bool,
    pub comment: String,
}

/// Inclusive line span within one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    pub start: u32,
    pub end: u32,
}

/// One matching passage: lines in the first file against lines in the second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineMatch {
    pub first: LineRange,
    pub second: LineRange,
}

/// A match as reported by MOSS, before its names are resolved to submissions.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMatch {
    pub first_name: String,
    pub second_name: String,
    pub first_percentage: f64,
    pub second_percentage: f64,
    pub lines_matched: u32,
    pub line_matches: Vec<LineMatch>,
}

/// Parsed MOSS report.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub url: String,
    pub matches: Vec<RawMatch>,
}
