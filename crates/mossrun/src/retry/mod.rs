pub mod cancel;
pub mod controller;
pub mod policy;
pub mod sleep;

pub use cancel::Cancellation;
pub use controller::{RetryController, RetryError, RetryPhase, RetryRun};
pub use policy::BackoffPolicy;
pub use sleep::{RecordingSleeper, Sleeper, ThreadSleeper};
