use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};
use log::{debug, error, info, warn};

use crate::error::WorkerError;
use crate::jobs::JobProcessor;
use crate::retry::Cancellation;
use crate::worker::job::{BatchSummary, JobOutcome};

type InFlight = Arc<Mutex<HashMap<String, Cancellation>>>;

const BATCH_POLL: Duration = Duration::from_millis(200);

pub struct WorkerPool {
    job_sender: Sender<String>,
    result_receiver: Receiver<JobOutcome>,
    workers: Vec<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
    /// Parent of every job's cancellation token.
    cancel: Cancellation,
    /// Jobs submitted and not yet reported, with their tokens.
    in_flight: InFlight,
}

impl WorkerPool {
    /// Starts `worker_count` threads, each with its own clone of `processor`.
    pub fn new(processor: JobProcessor, worker_count: usize) -> Result<Self, WorkerError> {
        if worker_count == 0 {
            return Err(WorkerError::SpawnFailed(
                "worker_count must be > 0".to_string(),
            ));
        }

        let (job_sender, job_receiver) = bounded::<String>(worker_count * 2);
        // Unbounded: a worker never blocks while reporting.
        let (result_sender, result_receiver) = unbounded::<JobOutcome>();
        let shutdown = Arc::new(AtomicBool::new(false));
        let in_flight: InFlight = Arc::new(Mutex::new(HashMap::new()));

        let mut workers = Vec::with_capacity(worker_count);

        for worker_id in 0..worker_count {
            let job_rx = job_receiver.clone();
            let result_tx = result_sender.clone();
            let shutdown_flag = Arc::clone(&shutdown);
            let worker_processor = processor.clone();
            let worker_in_flight = Arc::clone(&in_flight);

            let handle = thread::Builder::new()
                .name(format!("mossrun-worker-{}", worker_id))
                .spawn(move || {
                    run_worker(
                        worker_id,
                        job_rx,
                        result_tx,
                        shutdown_flag,
                        worker_processor,
                        worker_in_flight,
                    );
                })
                .map_err(|e| WorkerError::SpawnFailed(e.to_string()))?;

            workers.push(handle);
        }

        info!("Started {} workers", worker_count);

        Ok(Self {
            job_sender,
            result_receiver,
            workers,
            shutdown,
            cancel: Cancellation::new(),
            in_flight,
        })
    }

    /// Queues a job, blocking while the queue is full. A job already queued
    /// or running in this pool is refused.
    pub fn submit(&self, job_id: &str) -> Result<(), WorkerError> {
        self.register(job_id)?;
        if self.job_sender.send(job_id.to_string()).is_err() {
            self.unregister(job_id);
            return Err(WorkerError::ChannelClosed);
        }
        Ok(())
    }

    /// Queues a job without blocking. Returns `Ok(false)` when the queue is
    /// full; the job is then not registered and may be offered again.
    pub fn try_submit(&self, job_id: &str) -> Result<bool, WorkerError> {
        self.register(job_id)?;
        match self.job_sender.try_send(job_id.to_string()) {
            Ok(()) => Ok(true),
            Err(TrySendError::Full(_)) => {
                self.unregister(job_id);
                Ok(false)
            }
            Err(TrySendError::Disconnected(_)) => {
                self.unregister(job_id);
                Err(WorkerError::ChannelClosed)
            }
        }
    }

    fn register(&self, job_id: &str) -> Result<(), WorkerError> {
        if self.shutdown.load(Ordering::Relaxed) {
            return Err(WorkerError::ChannelClosed);
        }

        let mut in_flight = self
            .in_flight
            .lock()
            .map_err(|_| WorkerError::ChannelClosed)?;
        if in_flight.contains_key(job_id) {
            return Err(WorkerError::AlreadyQueued(job_id.to_string()));
        }
        in_flight.insert(job_id.to_string(), self.cancel.child());
        Ok(())
    }

    fn unregister(&self, job_id: &str) {
        if let Ok(mut in_flight) = self.in_flight.lock() {
            in_flight.remove(job_id);
        }
    }

    /// Feeds `job_ids` into the pool as capacity frees up and collects every
    /// outcome, calling `on_outcome` for each one as it arrives.
    ///
    /// Once `interrupted` is set the pool is shut down: running jobs are
    /// cancelled, queued ones are reported unstarted and the rest are never
    /// submitted.
    pub fn process_batch<F>(
        &self,
        job_ids: &[String],
        interrupted: &AtomicBool,
        mut on_outcome: F,
    ) -> BatchSummary
    where
        F: FnMut(&JobOutcome),
    {
        let mut summary = BatchSummary::default();
        let mut remaining = job_ids.iter().peekable();
        let mut pending = 0usize;

        loop {
            if interrupted.load(Ordering::Relaxed) && !self.is_shutdown() {
                warn!("Interrupted, cancelling {} job(s)", self.in_flight());
                self.shutdown();
            }

            if !self.is_shutdown() {
                while let Some(job_id) = remaining.peek() {
                    match self.try_submit(job_id) {
                        Ok(true) => pending += 1,
                        Ok(false) => break,
                        Err(e) => {
                            warn!("Could not submit job {}: {}", job_id, e);
                            summary.unprocessed += 1;
                        }
                    }
                    remaining.next();
                }
            }

            if pending == 0 && (remaining.peek().is_none() || self.is_shutdown()) {
                break;
            }

            if let Some(outcome) = self.recv_result_timeout(BATCH_POLL) {
                pending -= 1;
                if outcome.succeeded() {
                    summary.completed += 1;
                } else {
                    summary.failed += 1;
                }
                on_outcome(&outcome);
            }
        }

        summary.unprocessed += remaining.count();
        summary
    }

    /// Cancels one job. A job that has not started yet is skipped and
    /// stays queued; a running one stops at its next checkpoint.
    pub fn cancel(&self, job_id: &str) -> bool {
        match self.in_flight.lock() {
            Ok(in_flight) => match in_flight.get(job_id) {
                Some(token) => {
                    token.cancel();
                    true
                }
                None => false,
            },
            Err(_) => false,
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn try_recv_result(&self) -> Option<JobOutcome> {
        self.result_receiver.try_recv().ok()
    }

    pub fn recv_result(&self) -> Option<JobOutcome> {
        self.result_receiver.recv().ok()
    }

    pub fn recv_result_timeout(&self, timeout: Duration) -> Option<JobOutcome> {
        self.result_receiver.recv_timeout(timeout).ok()
    }

    /// Stops accepting jobs and cancels the ones in progress.
    pub fn shutdown(&self) {
        info!("Shutting down worker pool...");
        self.shutdown.store(true, Ordering::Relaxed);
        self.cancel.cancel();
    }

    pub fn wait(self) {
        // Drop sender to signal workers to exit
        drop(self.job_sender);

        for (i, worker) in self.workers.into_iter().enumerate() {
            if let Err(e) = worker.join() {
                error!("Worker {} panicked: {:?}", i, e);
            } else {
                debug!("Worker {} finished", i);
            }
        }

        info!("All workers have stopped");
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }
}

fn run_worker(
    worker_id: usize,
    job_receiver: Receiver<String>,
    result_sender: Sender<JobOutcome>,
    shutdown: Arc<AtomicBool>,
    processor: JobProcessor,
    in_flight: InFlight,
) {
    debug!("Worker {} started", worker_id);

    loop {
        if shutdown.load(Ordering::Relaxed) {
            debug!("Worker {} received shutdown signal", worker_id);
            // Report jobs that never started; they stay queued in the database.
            while let Ok(job_id) = job_receiver.try_recv() {
                if let Ok(mut m) = in_flight.lock() {
                    m.remove(&job_id);
                }
                if result_sender.send(JobOutcome::new(job_id, None)).is_err() {
                    break;
                }
            }
            break;
        }

        match job_receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(job_id) => {
                debug!("Worker {} processing job {}", worker_id, job_id);

                let token = in_flight
                    .lock()
                    .ok()
                    .and_then(|m| m.get(&job_id).cloned())
                    .unwrap_or_default();

                let report_url = if token.is_cancelled() {
                    warn!("Job {} cancelled before it started", job_id);
                    None
                } else {
                    processor.process_job_with(&job_id, &token)
                };

                if let Ok(mut m) = in_flight.lock() {
                    m.remove(&job_id);
                }

                if let Err(e) = result_sender.send(JobOutcome::new(job_id, report_url)) {
                    error!("Worker {} failed to send result: {}", worker_id, e);
                    break;
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                continue;
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                debug!("Worker {} job channel disconnected", worker_id);
                break;
            }
        }
    }

    debug!("Worker {} stopped", worker_id);
}
