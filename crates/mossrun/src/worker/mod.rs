pub mod job;
pub mod pool;

pub use job::{BatchSummary, JobOutcome};
pub use pool::WorkerPool;
