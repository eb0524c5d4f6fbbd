use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::binding::error::BindingError;

/// Cancels a waiting bind from another thread.
///
/// Cloning shares the underlying flag. Once cancelled a token stays
/// cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    cancelled: Mutex<bool>,
    signal: Condvar,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        let mut cancelled = self.inner.cancelled.lock();
        *cancelled = true;
        self.inner.signal.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.cancelled.lock()
    }

    /// Sleep for `duration`, returning early with
    /// [`BindingError::Cancelled`] if the token is cancelled meanwhile. A
    /// duration past the representable range sleeps until cancelled.
    pub fn sleep(&self, duration: Duration) -> Result<(), BindingError> {
        let deadline = Instant::now().checked_add(duration);
        let mut cancelled = self.inner.cancelled.lock();
        while !*cancelled {
            match deadline {
                Some(deadline) => {
                    if self
                        .inner
                        .signal
                        .wait_until(&mut cancelled, deadline)
                        .timed_out()
                    {
                        return Ok(());
                    }
                }
                None => self.inner.signal.wait(&mut cancelled),
            }
        }
        Err(BindingError::Cancelled)
    }
}
