//! Maps names from a MOSS report back to the job's submissions.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

use super::model::Submission;
use crate::moss::wire_name;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Report entry '{name}' does not match any submission of job {job_id}")]
pub struct ResolutionError {
    pub job_id: String,
    pub name: String,
}

pub struct SubmissionResolver {
    job_id: String,
    by_id: HashMap<String, Submission>,
}

impl SubmissionResolver {
    pub fn new(job_id: impl Into<String>, submissions: Vec<Submission>) -> Self {
        let by_id = submissions
            .into_iter()
            .map(|s| (wire_name(&s.submission_id), s))
            .collect();
        Self {
            job_id: job_id.into(),
            by_id,
        }
    }

    /// Resolves both sides of a match. Fails if either name is unknown.
    pub fn resolve(
        &self,
        first: &str,
        second: &str,
    ) -> Result<(&Submission, &Submission), ResolutionError> {
        Ok((self.lookup(first)?, self.lookup(second)?))
    }

    fn lookup(&self, name: &str) -> Result<&Submission, ResolutionError> {
        self.by_id
            .get(&wire_name(submission_key(name)))
            .ok_or_else(|| ResolutionError {
                job_id: self.job_id.clone(),
                name: name.to_string(),
            })
    }
}

/// Reduces a report name to its final path component.
fn submission_key(name: &str) -> &str {
    let trimmed = name.trim();
    Path::new(trimmed)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(trimmed)
}
