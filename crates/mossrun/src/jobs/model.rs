use std::fmt;
use std::path::PathBuf;

use crate::db::job_repo::JobRow;
use crate::db::submission_repo::SubmissionRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(JobStatus::Queued),
            "processing" => Some(JobStatus::Processing),
            "completed" => Some(JobStatus::Completed),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role of an uploaded file. Each maps to a directory under the job's upload root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmissionType {
    /// Skeleton code shared by every submission.
    BaseFile,
    Submission,
}

impl SubmissionType {
    pub const ALL: [SubmissionType; 2] = [SubmissionType::BaseFile, SubmissionType::Submission];

    pub fn dir_name(&self) -> &'static str {
        match self {
            SubmissionType::BaseFile => "base_files",
            SubmissionType::Submission => "files",
        }
    }

    pub fn from_dir_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.dir_name() == name)
    }
}

/// A job joined with its owner's MOSS account.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub job_id: String,
    pub moss_id: String,
    pub language: String,
    pub max_until_ignored: u32,
    pub max_displayed_matches: u32,
    pub comment: Option<String>,
    pub status: Option<JobStatus>,
}

impl Job {
    pub fn from_row(row: JobRow, moss_id: String) -> Self {
        Self {
            status: JobStatus::parse(&row.status),
            job_id: row.job_id,
            moss_id,
            language: row.language,
            max_until_ignored: row.max_until_ignored,
            max_displayed_matches: row.max_displayed_matches,
            comment: row.comment,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    /// Database row id, referenced by stored matches.
    pub id: i64,
    pub submission_id: String,
    pub submission_type: Option<SubmissionType>,
    pub name: String,
    pub file_path: PathBuf,
}

impl From<SubmissionRow> for Submission {
    fn from(row: SubmissionRow) -> Self {
        Self {
            id: row.id,
            submission_type: SubmissionType::from_dir_name(&row.file_type),
            submission_id: row.submission_id,
            name: row.name,
            file_path: PathBuf::from(row.file_path),
        }
    }
}
