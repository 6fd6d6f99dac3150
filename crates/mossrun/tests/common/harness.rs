//! Test harness for isolated job processing.
//!
//! The `TestHarness` owns a temporary upload tree and an in-memory database
//! with one registered MOSS user, and builds processors around any
//! combination of MOSS doubles.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use mossrun::db::job_repo::{self, JobRow};
use mossrun::db::result_repo::{self, MatchRow, ResultRow};
use mossrun::db::submission_repo::{self, SubmissionRow};
use mossrun::db::{now_timestamp, user_repo, Database};
use mossrun::jobs::{upload_root, JobStatus, SubmissionType};
use mossrun::moss::{ReportParser, UrlGenerator};
use mossrun::retry::{BackoffPolicy, RecordingSleeper, Sleeper};
use mossrun::{JobProcessor, LanguageRegistry, ProcessorConfig};

pub const MOSS_ID: &str = "246810";

/// Isolated environment for running jobs end to end.
pub struct TestHarness {
    temp_dir: TempDir,
    /// Upload directory template containing `{job_id}`.
    pub template: String,
    pub db: Database,
    pub user_id: i64,
    pub policy: BackoffPolicy,
}

impl TestHarness {
    /// Fresh harness with a fast policy: base 2, four attempts, one hour budget.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let template = temp_dir
            .path()
            .join("media")
            .join("{job_id}")
            .to_string_lossy()
            .to_string();
        let db = Database::open_in_memory().expect("Failed to open database");
        let user_id = user_repo::insert(&db, MOSS_ID).expect("Failed to insert user");

        Self {
            temp_dir,
            template,
            db,
            user_id,
            policy: BackoffPolicy::new(2.0, 4, Duration::from_secs(3600)),
        }
    }

    pub fn with_policy(mut self, policy: BackoffPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Registers a queued job.
    pub fn add_job(&self, job_id: &str, language: &str) {
        job_repo::insert(
            &self.db,
            &JobRow {
                job_id: job_id.to_string(),
                user_id: self.user_id,
                language: language.to_string(),
                max_until_ignored: 10,
                max_displayed_matches: 250,
                comment: None,
                status: JobStatus::Queued.as_str().to_string(),
                created_at: now_timestamp(),
                start_date: None,
                completion_date: None,
                error: None,
            },
        )
        .expect("Failed to insert job");
    }

    /// Writes an upload named after its submission id and registers it.
    pub fn add_file(
        &self,
        job_id: &str,
        kind: SubmissionType,
        submission_id: &str,
        content: &str,
    ) -> PathBuf {
        let dir = upload_root(&self.template, job_id).join(kind.dir_name());
        std::fs::create_dir_all(&dir).expect("Failed to create upload directory");
        let path = dir.join(submission_id);
        std::fs::write(&path, content).expect("Failed to write upload");

        submission_repo::insert(
            &self.db,
            &SubmissionRow {
                id: 0,
                job_id: job_id.to_string(),
                submission_id: submission_id.to_string(),
                file_type: kind.dir_name().to_string(),
                name: format!("{}.py", submission_id),
                file_path: path.to_string_lossy().to_string(),
            },
        )
        .expect("Failed to insert submission");
        path
    }

    /// A queued Python job with one base file and the given submissions.
    pub fn add_python_job(&self, job_id: &str, submissions: &[&str]) {
        self.add_job(job_id, "PY");
        self.add_file(job_id, SubmissionType::BaseFile, "skeleton", "def main():\n    pass\n");
        for (i, id) in submissions.iter().enumerate() {
            self.add_file(
                job_id,
                SubmissionType::Submission,
                id,
                &format!("def main():\n    print({})\n", i),
            );
        }
    }

    pub fn processor_config(&self) -> ProcessorConfig {
        ProcessorConfig {
            upload_directory: self.template.clone(),
            languages: LanguageRegistry::default(),
            policy: self.policy,
            use_basename: true,
            default_comment: "integration".to_string(),
            debug: false,
        }
    }

    pub fn processor(
        &self,
        generator: Arc<dyn UrlGenerator>,
        parser: Arc<dyn ReportParser>,
        sleeper: Arc<dyn Sleeper>,
    ) -> JobProcessor {
        JobProcessor::new(
            Arc::new(self.processor_config()),
            self.db.clone(),
            generator,
            parser,
            sleeper,
        )
    }

    /// Processor whose backoff waits are recorded instead of slept.
    pub fn recording_processor(
        &self,
        generator: Arc<dyn UrlGenerator>,
        parser: Arc<dyn ReportParser>,
    ) -> (JobProcessor, Arc<RecordingSleeper>) {
        let sleeper = Arc::new(RecordingSleeper::new());
        (self.processor(generator, parser, sleeper.clone()), sleeper)
    }

    pub fn job(&self, job_id: &str) -> JobRow {
        job_repo::find_by_id(&self.db, job_id)
            .expect("Failed to load job")
            .expect("Job not found")
    }

    pub fn status(&self, job_id: &str) -> JobStatus {
        JobStatus::parse(&self.job(job_id).status).expect("Unknown status")
    }

    pub fn result(&self, job_id: &str) -> Option<(ResultRow, Vec<MatchRow>)> {
        let result = result_repo::find_by_job(&self.db, job_id).expect("Failed to load result")?;
        let matches =
            result_repo::matches_for_result(&self.db, result.id).expect("Failed to load matches");
        Some((result, matches))
    }

    /// Database row id of a submission.
    pub fn submission_row(&self, job_id: &str, submission_id: &str) -> i64 {
        submission_repo::find(&self.db, job_id, submission_id)
            .expect("Failed to load submission")
            .expect("Submission not found")
            .id
    }

    pub fn root(&self) -> &std::path::Path {
        self.temp_dir.path()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
