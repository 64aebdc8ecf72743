//! One-shot timer with best-effort cancellation.
//!
//! Backs the partial-dialog timeout. Cancellation races the firing thread:
//! `cancel` returns `false` once the callback has been committed to run,
//! and the dialog state machine tolerates that by re-checking state under
//! the dialog mutex inside the callback.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerState {
    Scheduled,
    Fired,
    Cancelled,
}

struct TimerInner {
    state: Mutex<TimerState>,
    cond: Condvar,
}

/// A scheduled one-shot timer.
pub struct Timer {
    inner: Arc<TimerInner>,
}

impl Timer {
    /// Arms a timer that runs `callback` on its own thread after
    /// `duration`, unless cancelled first.
    pub fn schedule(duration: Duration, callback: impl FnOnce() + Send + 'static) -> Timer {
        let inner = Arc::new(TimerInner {
            state: Mutex::new(TimerState::Scheduled),
            cond: Condvar::new(),
        });
        let thread_inner = inner.clone();
        thread::spawn(move || {
            let deadline = Instant::now() + duration;
            let mut state = thread_inner.state.lock();
            while *state == TimerState::Scheduled {
                let now = Instant::now();
                if now >= deadline {
                    break;
                }
                let _ = thread_inner.cond.wait_for(&mut state, deadline - now);
            }
            if *state != TimerState::Scheduled {
                return;
            }
            *state = TimerState::Fired;
            drop(state);
            callback();
        });
        Timer { inner }
    }

    /// Stops the timer. Returns `false` when the callback has already been
    /// committed (fired or is about to run).
    pub fn cancel(&self) -> bool {
        let mut state = self.inner.state.lock();
        if *state == TimerState::Scheduled {
            *state = TimerState::Cancelled;
            self.inner.cond.notify_all();
            true
        } else {
            false
        }
    }

    pub fn is_running(&self) -> bool {
        *self.inner.state.lock() == TimerState::Scheduled
    }
}

impl std::fmt::Debug for Timer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timer")
            .field("running", &self.is_running())
            .finish()
    }
}
