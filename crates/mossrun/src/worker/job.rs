/// What a worker reports back for one submitted job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobOutcome {
    pub job_id: String,
    /// Report URL when the job completed; `None` when it failed, was
    /// rejected or was cancelled before starting.
    pub report_url: Option<String>,
}

impl JobOutcome {
    pub fn new(job_id: impl Into<String>, report_url: Option<String>) -> Self {
        Self {
            job_id: job_id.into(),
            report_url,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.report_url.is_some()
    }
}

/// Tally of one [`WorkerPool::process_batch`](super::WorkerPool::process_batch) call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub completed: usize,
    /// Jobs that failed, were rejected or were cancelled.
    pub failed: usize,
    /// Jobs never handed to a worker.
    pub unprocessed: usize,
}

impl BatchSummary {
    pub fn all_completed(&self) -> bool {
        self.failed == 0 && self.unprocessed == 0
    }
}
