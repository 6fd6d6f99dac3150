use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, info_span, warn};

use super::config::ProcessorConfig;
use super::error::{ErrorKind, JobError};
use super::files::{collect_job_files, JobFiles};
use super::model::{Job, JobStatus, Submission};
use super::resolver::SubmissionResolver;
use crate::config::MossConfig;
use crate::db::result_repo::{self, NewMatch};
use crate::db::job_repo::JobRow;
use crate::db::{job_repo, submission_repo, user_repo, Database};
use crate::moss::{
    MossClient, MossError, Report, ReportClient, ReportParser, SubmissionRequest, UrlGenerator,
};
use crate::retry::{Cancellation, RetryController, Sleeper, ThreadSleeper};

/// Runs queued jobs against MOSS and records their outcome.
///
/// Cloning is cheap; each worker thread holds its own clone.
#[derive(Clone)]
pub struct JobProcessor {
    config: Arc<ProcessorConfig>,
    db: Database,
    generator: Arc<dyn UrlGenerator>,
    parser: Arc<dyn ReportParser>,
    sleeper: Arc<dyn Sleeper>,
}

impl JobProcessor {
    /// Production constructor: real MOSS clients and a blocking sleeper.
    pub fn from_config(
        config: Arc<ProcessorConfig>,
        db: Database,
        moss: &MossConfig,
    ) -> Result<Self, MossError> {
        Ok(Self::new(
            config,
            db,
            Arc::new(MossClient::from_config(moss)),
            Arc::new(ReportClient::from_config(moss)?),
            Arc::new(ThreadSleeper::new()),
        ))
    }

    pub fn new(
        config: Arc<ProcessorConfig>,
        db: Database,
        generator: Arc<dyn UrlGenerator>,
        parser: Arc<dyn ReportParser>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            config,
            db,
            generator,
            parser,
            sleeper,
        }
    }

    /// Processes one queued job to a terminal state.
    ///
    /// Returns the report URL on success. Jobs that are missing or not
    /// queued are left untouched and yield `None`.
    pub fn process_job(&self, job_id: &str) -> Option<String> {
        self.process_job_with(job_id, &Cancellation::new())
    }

    /// Like [`process_job`](Self::process_job), stopping early once `cancel` fires.
    pub fn process_job_with(&self, job_id: &str, cancel: &Cancellation) -> Option<String> {
        let _span = info_span!("job", job_id = %job_id).entered();

        match self.run(job_id, cancel) {
            Ok(url) => {
                info!(url = %url, "Job completed");
                Some(url)
            }
            Err(e @ (JobError::NotFound(_) | JobError::NotQueued { .. })) => {
                warn!(error = %e, "Job rejected");
                None
            }
            Err(e) => {
                let kind = e.kind();
                if kind == ErrorKind::Unclassified {
                    error!(kind = kind.as_str(), error = %e, "Job failed");
                } else {
                    warn!(kind = kind.as_str(), error = %e, "Job failed");
                }
                None
            }
        }
    }

    fn run(&self, job_id: &str, cancel: &Cancellation) -> Result<String, JobError> {
        let row = self.load(job_id)?;

        let started = Utc::now();
        if !job_repo::claim(&self.db, job_id, &started.to_rfc3339())? {
            let status = job_repo::find_by_id(&self.db, job_id)?
                .map(|row| row.status)
                .unwrap_or_else(|| "missing".to_string());
            return Err(JobError::NotQueued {
                job_id: job_id.to_string(),
                status,
            });
        }
        info!(language = %row.language, "Job claimed");

        let result = self
            .with_owner(row)
            .and_then(|job| self.execute(&job, started, cancel));
        if let Err(e) = &result {
            self.fail(job_id, started, e);
        }
        result
    }

    fn load(&self, job_id: &str) -> Result<JobRow, JobError> {
        let row = job_repo::find_by_id(&self.db, job_id)?
            .ok_or_else(|| JobError::NotFound(job_id.to_string()))?;

        if row.status != JobStatus::Queued.as_str() {
            return Err(JobError::NotQueued {
                job_id: job_id.to_string(),
                status: row.status,
            });
        }
        Ok(row)
    }

    fn with_owner(&self, row: JobRow) -> Result<Job, JobError> {
        let user = user_repo::find_by_id(&self.db, row.user_id)?.ok_or_else(|| {
            JobError::Configuration(format!(
                "owner {} of job {} not found",
                row.user_id, row.job_id
            ))
        })?;
        Ok(Job::from_row(row, user.moss_id))
    }

    fn execute(
        &self,
        job: &Job,
        started: DateTime<Utc>,
        cancel: &Cancellation,
    ) -> Result<String, JobError> {
        let files = {
            let _step = info_span!("collect_files").entered();
            let root = self.config.upload_root(&job.job_id);
            let files = collect_job_files(&root).map_err(|e| {
                JobError::Configuration(format!("cannot read uploads in {}: {}", root.display(), e))
            })?;
            if files.files.is_empty() {
                return Err(JobError::Configuration(format!(
                    "no submission files in {}",
                    root.display()
                )));
            }
            debug!(
                base_files = files.base_files.len(),
                files = files.files.len(),
                "Collected uploads"
            );
            files
        };

        let language = self
            .config
            .languages
            .moss_language(&job.language)
            .ok_or_else(|| {
                JobError::Configuration(format!("unsupported language '{}'", job.language))
            })?;

        let request = SubmissionRequest {
            user_id: job.moss_id.clone(),
            language: language.to_string(),
            base_files: files.base_files.clone(),
            files: files.files.clone(),
            max_until_ignored: job.max_until_ignored,
            max_displayed_matches: job.max_displayed_matches,
            use_basename: self.config.use_basename,
            comment: job
                .comment
                .clone()
                .unwrap_or_else(|| self.config.default_comment.clone()),
        };

        let report = {
            let _step = info_span!("moss").entered();
            let controller = RetryController::new(
                self.generator.as_ref(),
                self.parser.as_ref(),
                self.sleeper.as_ref(),
                self.config.policy,
            );
            let run = controller.run(&request, cancel);
            debug!(
                attempts = run.attempts,
                url_generations = run.url_generations,
                waited_secs = run.total_wait().as_secs_f64(),
                "MOSS run finished"
            );
            run.outcome?
        };

        let matches = {
            let _step = info_span!("resolve_matches").entered();
            self.resolve_matches(&job.job_id, &report)?
        };

        let completed = completion_time(started);
        {
            let _step = info_span!("persist", matches = matches.len()).entered();
            result_repo::complete_job(
                &self.db,
                &job.job_id,
                &report.url,
                &matches,
                &completed.to_rfc3339(),
            )?;
        }

        if self.config.debug {
            log_stats(job, &files, started, completed);
        }

        Ok(report.url)
    }

    /// Resolves every match or none: the first unknown name aborts the batch.
    fn resolve_matches(&self, job_id: &str, report: &Report) -> Result<Vec<NewMatch>, JobError> {
        let submissions: Vec<Submission> = submission_repo::list_for_job(&self.db, job_id)?
            .into_iter()
            .map(Submission::from)
            .collect();
        let resolver = SubmissionResolver::new(job_id, submissions);

        report
            .matches
            .iter()
            .map(|m| {
                let (first, second) = resolver.resolve(&m.first_name, &m.second_name)?;
                Ok::<_, JobError>(NewMatch {
                    first_submission: first.id,
                    second_submission: second.id,
                    first_percentage: m.first_percentage,
                    second_percentage: m.second_percentage,
                    lines_matched: m.lines_matched,
                    line_matches: m.line_matches.clone(),
                })
            })
            .collect()
    }

    fn fail(&self, job_id: &str, started: DateTime<Utc>, err: &JobError) {
        let completed = completion_time(started);
        match job_repo::mark_failed(&self.db, job_id, &completed.to_rfc3339(), &err.to_string()) {
            Ok(true) => {}
            Ok(false) => warn!("Job no longer processing, failure not recorded"),
            Err(e) => error!(error = %e, "Could not record job failure"),
        }
    }
}

/// Completion never precedes the start, even if the clock steps back.
fn completion_time(started: DateTime<Utc>) -> DateTime<Utc> {
    Utc::now().max(started)
}

fn log_stats(job: &Job, files: &JobFiles, started: DateTime<Utc>, completed: DateTime<Utc>) {
    let (num_files, avg_file_size) = files.submission_stats();
    let duration = (completed - started).to_std().unwrap_or_default();
    info!(
        target: "mossrun::stats",
        job_id = %job.job_id,
        moss_id = %job.moss_id,
        language = %job.language,
        num_files,
        avg_file_size,
        duration_secs = duration.as_secs_f64(),
        "Job statistics"
    );
}
