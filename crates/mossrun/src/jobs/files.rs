//! Reading a job's upload directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::model::SubmissionType;

/// Uploaded files of one job, grouped by type and sorted by path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobFiles {
    pub base_files: Vec<PathBuf>,
    pub files: Vec<PathBuf>,
}

impl JobFiles {
    pub fn get(&self, kind: SubmissionType) -> &[PathBuf] {
        match kind {
            SubmissionType::BaseFile => &self.base_files,
            SubmissionType::Submission => &self.files,
        }
    }

    /// Count and mean size in bytes of the submission files.
    pub fn submission_stats(&self) -> (usize, f64) {
        let count = self.files.len();
        if count == 0 {
            return (0, 0.0);
        }
        let total: u64 = self
            .files
            .iter()
            .filter_map(|p| fs::metadata(p).ok())
            .map(|m| m.len())
            .sum();
        (count, total as f64 / count as f64)
    }
}

/// Upload root of a job: `template` with `{job_id}` substituted.
pub fn upload_root(template: &str, job_id: &str) -> PathBuf {
    PathBuf::from(template.replace("{job_id}", job_id))
}

/// Collects the non-empty regular files under `<root>/base_files` and
/// `<root>/files`. A missing directory contributes nothing.
pub fn collect_job_files(root: &Path) -> io::Result<JobFiles> {
    Ok(JobFiles {
        base_files: collect_dir(&root.join(SubmissionType::BaseFile.dir_name()))?,
        files: collect_dir(&root.join(SubmissionType::Submission.dir_name()))?,
    })
}

fn collect_dir(dir: &Path) -> io::Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let metadata = entry.metadata()?;
        if metadata.is_file() && metadata.len() > 0 {
            paths.push(entry.path());
        } else {
            log::debug!("Skipping {}", entry.path().display());
        }
    }
    paths.sort();
    Ok(paths)
}
