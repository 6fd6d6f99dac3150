use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::cancel::Cancellation;
use super::policy::BackoffPolicy;
use super::sleep::Sleeper;
use crate::moss::{
    is_valid_report_url, FailureKind, MossError, Report, ReportParser, SubmissionRequest,
    UrlGenerator,
};

/// Where a run currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPhase {
    NoUrl,
    UrlReady,
    Parsing,
    Succeeded,
    Failed,
}

/// Per-run bookkeeping. Lives only as long as [`RetryController::run`].
#[derive(Debug)]
struct RetryState {
    phase: RetryPhase,
    url: Option<String>,
    attempts: u32,
    waited: Duration,
}

impl RetryState {
    fn new() -> Self {
        Self {
            phase: RetryPhase::NoUrl,
            url: None,
            attempts: 0,
            waited: Duration::ZERO,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RetryError {
    #[error("Fatal failure: {0}")]
    Fatal(MossError),

    #[error("Unclassified failure: {0}")]
    Unclassified(MossError),

    #[error("Gave up after {attempts} attempts: {last}")]
    AttemptsExhausted { attempts: u32, last: MossError },

    #[error("Retry budget of {budget:?} would be exceeded after waiting {waited:?}: {last}")]
    DurationExceeded {
        waited: Duration,
        budget: Duration,
        last: MossError,
    },

    #[error("Cancelled")]
    Cancelled,
}

impl RetryError {
    /// Class of the failure that ended the run.
    pub fn kind(&self) -> FailureKind {
        match self {
            RetryError::Fatal(_) => FailureKind::Fatal,
            RetryError::Unclassified(_) => FailureKind::Unclassified,
            RetryError::AttemptsExhausted { .. }
            | RetryError::DurationExceeded { .. }
            | RetryError::Cancelled => FailureKind::Recoverable,
        }
    }
}

/// Outcome of a controller run plus what it took to get there.
#[derive(Debug)]
pub struct RetryRun {
    pub outcome: Result<Report, RetryError>,
    pub attempts: u32,
    /// Backoff waits actually completed, in order.
    pub waits: Vec<Duration>,
    pub url_generations: u32,
}

impl RetryRun {
    pub fn total_wait(&self) -> Duration {
        self.waits.iter().sum()
    }
}

enum AttemptError {
    Cancelled,
    Service(MossError),
}

impl From<MossError> for AttemptError {
    fn from(err: MossError) -> Self {
        AttemptError::Service(err)
    }
}

/// Drives URL generation and report parsing until success or a terminal failure.
///
/// A URL, once generated and syntactically valid, is reused for every later
/// parse attempt of the run.
pub struct RetryController<'a> {
    generator: &'a dyn UrlGenerator,
    parser: &'a dyn ReportParser,
    sleeper: &'a dyn Sleeper,
    policy: BackoffPolicy,
}

impl<'a> RetryController<'a> {
    pub fn new(
        generator: &'a dyn UrlGenerator,
        parser: &'a dyn ReportParser,
        sleeper: &'a dyn Sleeper,
        policy: BackoffPolicy,
    ) -> Self {
        Self {
            generator,
            parser,
            sleeper,
            policy,
        }
    }

    pub fn run(&self, request: &SubmissionRequest, cancel: &Cancellation) -> RetryRun {
        let mut state = RetryState::new();
        let mut waits = Vec::new();
        let mut url_generations = 0;

        let outcome = loop {
            if cancel.is_cancelled() {
                break Err(RetryError::Cancelled);
            }
            if state.attempts >= self.policy.max_attempts {
                break Err(RetryError::AttemptsExhausted {
                    attempts: state.attempts,
                    last: MossError::recoverable("no attempt allowed"),
                });
            }

            let attempt = state.attempts;
            state.attempts += 1;

            let err = match self.attempt(&mut state, request, cancel, &mut url_generations) {
                Ok(report) => {
                    state.phase = RetryPhase::Succeeded;
                    break Ok(report);
                }
                Err(AttemptError::Cancelled) => break Err(RetryError::Cancelled),
                Err(AttemptError::Service(err)) => err,
            };

            match err.kind() {
                FailureKind::Fatal => {
                    warn!(attempt, error = %err, "Fatal failure, not retrying");
                    break Err(RetryError::Fatal(err));
                }
                FailureKind::Unclassified => {
                    error!(
                        attempt,
                        phase = ?state.phase,
                        url = state.url.as_deref().unwrap_or("-"),
                        language = %request.language,
                        files = request.files.len(),
                        error = %err,
                        "Unclassified failure, giving up"
                    );
                    break Err(RetryError::Unclassified(err));
                }
                FailureKind::Recoverable => {}
            }

            if state.attempts >= self.policy.max_attempts {
                break Err(RetryError::AttemptsExhausted {
                    attempts: state.attempts,
                    last: err,
                });
            }

            let delay = self.policy.delay(attempt);
            if state.waited.saturating_add(delay) > self.policy.max_total {
                break Err(RetryError::DurationExceeded {
                    waited: state.waited,
                    budget: self.policy.max_total,
                    last: err,
                });
            }

            warn!(
                attempt,
                delay_secs = delay.as_secs_f64(),
                phase = ?state.phase,
                error = %err,
                "Recoverable failure, backing off"
            );
            if !self.sleeper.sleep(delay, cancel) {
                break Err(RetryError::Cancelled);
            }
            state.waited += delay;
            waits.push(delay);
        };

        if outcome.is_err() {
            state.phase = RetryPhase::Failed;
            state.url = None;
        }
        debug!(
            phase = ?state.phase,
            attempts = state.attempts,
            waited_secs = state.waited.as_secs_f64(),
            "Retry run finished"
        );

        RetryRun {
            outcome,
            attempts: state.attempts,
            waits,
            url_generations,
        }
    }

    /// One attempt: generate a URL if none is held, then parse it.
    fn attempt(
        &self,
        state: &mut RetryState,
        request: &SubmissionRequest,
        cancel: &Cancellation,
        url_generations: &mut u32,
    ) -> Result<Report, AttemptError> {
        let url = match state.url.clone() {
            Some(url) => url,
            None => {
                state.phase = RetryPhase::NoUrl;
                if cancel.is_cancelled() {
                    return Err(AttemptError::Cancelled);
                }
                *url_generations += 1;
                let url = self.generator.generate_url(request)?;
                if !is_valid_report_url(Some(&url)) {
                    return Err(MossError::recoverable(format!(
                        "service returned an unusable report URL '{}'",
                        url
                    ))
                    .into());
                }
                info!(url = %url, "Report URL generated");
                state.url = Some(url.clone());
                state.phase = RetryPhase::UrlReady;
                url
            }
        };

        if cancel.is_cancelled() {
            return Err(AttemptError::Cancelled);
        }
        state.phase = RetryPhase::Parsing;
        match self.parser.parse_report(&url) {
            Ok(report) => Ok(report),
            Err(err) => {
                state.phase = RetryPhase::UrlReady;
                Err(err.into())
            }
        }
    }
}
