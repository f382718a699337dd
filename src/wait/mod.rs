//! Wait-for-state polling shared by lifecycle operations.
//!
//! A [`StateChangeConf`] repeatedly invokes a refresh function that returns a
//! snapshot and a coarse state label, until the label reaches one of the
//! target values, the refresh fails, or the timeout elapses.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::{Instant, sleep_until};
use tracing::debug;

/// Delay before the first refresh.
pub const DEFAULT_DELAY: Duration = Duration::from_secs(5);

/// Interval between consecutive refreshes.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(3);

/// Errors returned by [`StateChangeConf::wait_for_state`].
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum WaitError<E> {
    /// Raised when no target state was observed before the deadline.
    #[error(
        "provider did not reach state {target} within {timeout:?} (last state: '{last_state}')"
    )]
    Timeout {
        /// Target states, comma separated.
        target: String,
        /// Last label returned by the refresh function.
        last_state: String,
        /// Configured timeout.
        timeout: Duration,
    },
    /// Raised when the refresh reports a state outside the pending set.
    #[error("unexpected state '{state}', wanted target {target}")]
    UnexpectedState {
        /// Label returned by the refresh function.
        state: String,
        /// Target states, comma separated.
        target: String,
    },
    /// Raised when the refresh function itself fails.
    #[error(transparent)]
    Refresh(E),
}

/// Polling configuration for a single wait.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StateChangeConf {
    /// Labels that keep the wait going. Empty accepts any non-target label.
    pub pending: Vec<String>,
    /// Labels that end the wait successfully.
    pub target: Vec<String>,
    /// Delay before the first refresh.
    pub delay: Duration,
    /// Interval between refreshes.
    pub min_interval: Duration,
    /// Overall deadline measured from the start of the wait.
    pub timeout: Duration,
}

impl StateChangeConf {
    /// Creates a configuration waiting for any of `target` within `timeout`.
    #[must_use]
    pub fn new<I, S>(target: I, timeout: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pending: Vec::new(),
            target: target.into_iter().map(Into::into).collect(),
            delay: DEFAULT_DELAY,
            min_interval: DEFAULT_MIN_INTERVAL,
            timeout,
        }
    }

    /// Restricts the labels that may be observed while waiting.
    #[must_use]
    pub fn pending<I, S>(mut self, pending: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pending = pending.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the initial delay.
    #[must_use]
    pub const fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sets the interval between refreshes.
    #[must_use]
    pub const fn min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }

    /// Polls `refresh` until it reports a target label.
    ///
    /// The refresh is never skipped in favour of an early timeout: the last
    /// sleep is clamped to the deadline and one final refresh runs before
    /// [`WaitError::Timeout`] is returned.
    ///
    /// # Errors
    ///
    /// Returns [`WaitError::Timeout`] once the deadline passes without a
    /// target label, [`WaitError::UnexpectedState`] when a label is neither
    /// pending nor target, and [`WaitError::Refresh`] when `refresh` fails.
    pub async fn wait_for_state<T, E, F, Fut>(&self, mut refresh: F) -> Result<T, WaitError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(T, String), E>>,
    {
        let started = Instant::now();
        let deadline = started + self.timeout;
        sleep_until((started + self.delay).min(deadline)).await;

        loop {
            let (snapshot, state) = refresh().await.map_err(WaitError::Refresh)?;
            if self.target.contains(&state) {
                debug!(%state, elapsed = ?started.elapsed(), "target state reached");
                return Ok(snapshot);
            }

            if !self.pending.is_empty() && !self.pending.contains(&state) {
                return Err(WaitError::UnexpectedState {
                    state,
                    target: self.target_label(),
                });
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(WaitError::Timeout {
                    target: self.target_label(),
                    last_state: state,
                    timeout: self.timeout,
                });
            }

            debug!(%state, "waiting for target state");
            sleep_until((now + self.min_interval).min(deadline)).await;
        }
    }

    fn target_label(&self) -> String {
        self.target.join(", ")
    }
}
