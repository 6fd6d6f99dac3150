use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use super::cancel::Cancellation;

/// Blocks between retry attempts.
pub trait Sleeper: Send + Sync {
    /// Waits for `duration`. Returns `false` if `cancel` fired before the
    /// wait completed.
    fn sleep(&self, duration: Duration, cancel: &Cancellation) -> bool;
}

/// Sleeps on the calling thread, waking periodically to observe cancellation.
pub struct ThreadSleeper {
    tick: Duration,
}

impl ThreadSleeper {
    pub fn new() -> Self {
        Self {
            tick: Duration::from_millis(100),
        }
    }
}

impl Default for ThreadSleeper {
    fn default() -> Self {
        Self::new()
    }
}

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration, cancel: &Cancellation) -> bool {
        let deadline = Instant::now().checked_add(duration);
        loop {
            if cancel.is_cancelled() {
                return false;
            }
            let remaining = match deadline {
                Some(deadline) => deadline.saturating_duration_since(Instant::now()),
                None => self.tick,
            };
            if remaining.is_zero() {
                return true;
            }
            thread::sleep(remaining.min(self.tick));
        }
    }
}

/// Records requested waits without blocking.
#[derive(Default)]
pub struct RecordingSleeper {
    waits: Mutex<Vec<Duration>>,
    cancel_on: Option<usize>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels the run's token when the `n`th wait (1-based) is requested.
    pub fn cancelling_on(n: usize) -> Self {
        Self {
            waits: Mutex::new(Vec::new()),
            cancel_on: Some(n),
        }
    }

    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().map(|w| w.clone()).unwrap_or_default()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration, cancel: &Cancellation) -> bool {
        let count = match self.waits.lock() {
            Ok(mut waits) => {
                waits.push(duration);
                waits.len()
            }
            Err(_) => return false,
        };
        if self.cancel_on == Some(count) {
            cancel.cancel();
        }
        !cancel.is_cancelled()
    }
}
