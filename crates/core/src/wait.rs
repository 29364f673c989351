//! Existence confirmation after a write
//!
//! Stores often make a new object visible to HEAD requests only after a short
//! lag. [`ExistenceWaiter`] polls until the object shows up or the deadline
//! passes. The deadline wraps the whole loop, so it interrupts a pending sleep
//! or head-check as soon as it fires.

use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::classify::{ErrorKind, classify};
use crate::error::{Error, Result};
use crate::traits::ObjectStore;
use crate::types::ObjectKey;

/// Overall deadline used by comparable waiters
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(60);

/// Delay between head-checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Validated polling parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    timeout: Duration,
    interval: Duration,
}

impl WaitConfig {
    pub fn new(timeout: Duration, interval: Duration) -> Result<Self> {
        if timeout.is_zero() {
            return Err(Error::Config("wait timeout must be greater than zero".into()));
        }
        if interval.is_zero() {
            return Err(Error::Config("poll interval must be greater than zero".into()));
        }
        if interval > timeout {
            return Err(Error::Config(format!(
                "poll interval ({}ms) exceeds wait timeout ({}ms)",
                interval.as_millis(),
                timeout.as_millis()
            )));
        }
        Ok(Self { timeout, interval })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_WAIT_TIMEOUT,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Visibility state of a freshly written object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PollState {
    Pending,
    Confirmed,
    TimedOut,
}

/// How a confirmation attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitReport {
    pub state: PollState,
    /// Head-checks issued
    pub attempts: u32,
    pub elapsed: Duration,
    /// Head-checks that failed instead of answering
    pub head_errors: u32,
    /// Kind of the most recent failed head-check
    pub last_error: Option<ErrorKind>,
}

/// Polls `head_object` until the object exists or the deadline passes
pub struct ExistenceWaiter<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
    config: WaitConfig,
}

impl<'a, S: ObjectStore + ?Sized> ExistenceWaiter<'a, S> {
    pub fn new(store: &'a S, config: WaitConfig) -> Self {
        Self { store, config }
    }

    /// Wait for `key` to become visible
    ///
    /// Returns [`PollState::Confirmed`] or [`PollState::TimedOut`]. Head-check
    /// failures count as "not yet visible".
    pub async fn confirm(&self, key: &ObjectKey) -> WaitReport {
        let started = Instant::now();
        let mut attempts = 0u32;
        let mut head_errors = 0u32;
        let mut last_error = None;

        let poll = async {
            let mut state = PollState::Pending;
            while state == PollState::Pending {
                attempts += 1;
                state = match self.store.head_object(key).await {
                    Ok(true) => PollState::Confirmed,
                    Ok(false) => {
                        tracing::debug!(attempt = attempts, %key, "Object not visible yet");
                        PollState::Pending
                    }
                    Err(e) => {
                        let err = classify(&e);
                        tracing::warn!(attempt = attempts, %key, error = %err, "Existence check failed");
                        head_errors += 1;
                        last_error = Some(err.kind);
                        PollState::Pending
                    }
                };

                if state == PollState::Pending {
                    tokio::time::sleep(self.config.interval).await;
                }
            }
            state
        };

        let state = tokio::time::timeout(self.config.timeout, poll)
            .await
            .unwrap_or(PollState::TimedOut);

        let report = WaitReport {
            state,
            attempts,
            elapsed: started.elapsed(),
            head_errors,
            last_error,
        };

        match report.state {
            PollState::TimedOut => tracing::warn!(
                %key,
                attempts = report.attempts,
                head_errors = report.head_errors,
                elapsed_ms = report.elapsed.as_millis() as u64,
                "Timed out waiting for object to exist"
            ),
            _ => tracing::debug!(
                %key,
                attempts = report.attempts,
                elapsed_ms = report.elapsed.as_millis() as u64,
                "Object is visible"
            ),
        }

        report
    }
}
