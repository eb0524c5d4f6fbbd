use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::binding::error::BindingError;
use crate::definition::definition_model::FormKey;
use crate::wait::cancel::CancellationToken;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// How long to keep polling and how long to sleep between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        WaitPolicy {
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl WaitPolicy {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        WaitPolicy {
            timeout,
            poll_interval,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

/// States of the polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    Attempting,
    Waiting,
    Done,
}

/// Re-runs a bind attempt until it succeeds, fails fatally, is cancelled or
/// runs out of time.
///
/// Attempts never overlap: the loop blocks the calling thread while
/// sleeping.
#[derive(Debug, Clone)]
pub struct RetryController {
    policy: WaitPolicy,
    cancel: CancellationToken,
}

impl RetryController {
    pub fn new(policy: WaitPolicy, cancel: CancellationToken) -> Self {
        RetryController { policy, cancel }
    }

    pub fn policy(&self) -> &WaitPolicy {
        &self.policy
    }

    /// Run `attempt` until it returns `Ok`.
    ///
    /// Recoverable errors are remembered and retried while the deadline has
    /// not passed. Any other error is returned at once. On timeout the last
    /// recoverable error is returned, or [`BindingError::FormNotPresent`] for
    /// `form` if none was recorded.
    pub fn run<T, F>(&self, form: &FormKey, mut attempt: F) -> Result<T, BindingError>
    where
        F: FnMut() -> Result<T, BindingError>,
    {
        // `None` when the timeout is too large to represent: wait forever.
        let deadline = Instant::now().checked_add(self.policy.timeout);
        let mut last_failure: Option<BindingError> = None;
        let mut attempts: u32 = 0;
        let mut state = RetryState::Attempting;

        loop {
            match state {
                RetryState::Attempting => {
                    attempts += 1;
                    match attempt() {
                        Ok(value) => {
                            debug!(form = %form, attempts, "form bound");
                            return Ok(value);
                        }
                        Err(e) if e.is_recoverable() => {
                            debug!(form = %form, attempts, error = %e, "bind attempt not ready");
                            last_failure = Some(e);
                            state = if deadline.is_none_or(|deadline| Instant::now() < deadline) {
                                RetryState::Waiting
                            } else {
                                RetryState::Done
                            };
                        }
                        Err(e) => return Err(e),
                    }
                }
                RetryState::Waiting => {
                    self.cancel.sleep(self.policy.poll_interval)?;
                    state = RetryState::Attempting;
                }
                RetryState::Done => break,
            }
        }

        warn!(
            form = %form,
            attempts,
            timeout_ms = self.policy.timeout.as_millis() as u64,
            "gave up waiting for form"
        );
        Err(last_failure.unwrap_or_else(|| BindingError::FormNotPresent { form: form.clone() }))
    }
}
