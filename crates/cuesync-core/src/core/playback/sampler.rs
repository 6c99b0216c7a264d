//! Fixed-Cadence Sampler
//!
//! A Tokio task that runs a callback every `period`. The returned `Sampler`
//! owns the task: cancelling it, or dropping it, aborts the timer, so there is
//! no path on which a timer outlives its owner.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::trace;

use crate::core::{CoreError, CoreResult};

/// Smallest period accepted; a zero period would spin
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Handle to a running sampler task
#[derive(Debug)]
pub struct Sampler {
    handle: JoinHandle<()>,
    period: Duration,
}

impl Sampler {
    /// Starts sampling on the current Tokio runtime.
    ///
    /// The first sample fires one `period` after the call. `tick` returns
    /// `false` to end the task on its own.
    pub fn spawn<F>(period: Duration, mut tick: F) -> CoreResult<Self>
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| CoreError::RuntimeUnavailable)?;
        let period = period.max(MIN_PERIOD);

        let handle = runtime.spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                if !tick() {
                    trace!("Sampler finished by callback");
                    break;
                }
            }
        });

        Ok(Self { handle, period })
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Whether the task is still scheduled
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stops the timer
    pub fn cancel(self) {
        // Drop aborts the task
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
