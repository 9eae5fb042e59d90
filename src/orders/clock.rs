//! Scheduling port for order resolution timers
//!
//! `TokioClock` drives real delays on a tokio runtime. `ManualClock` only moves when
//! told to and fires due timers synchronously, which makes the simulator deterministic.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::runtime::Handle;

/// A scheduled callback
pub type TimerTask = Box<dyn FnOnce() + Send + 'static>;

/// Time source and one-shot timer scheduler
pub trait Clock: Send + Sync {
    /// Current wall-clock time
    fn now(&self) -> DateTime<Utc>;

    /// Run `task` once after `delay`, unless the returned handle is cancelled first
    fn after(&self, delay: Duration, task: TimerTask) -> TimerHandle;
}

/// Handle to a scheduled timer
///
/// Dropping the handle leaves the timer scheduled; only `cancel` stops it.
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl TimerHandle {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Stop the timer; no effect if it already fired
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle")
            .field("armed", &self.cancel.is_some())
            .finish()
    }
}

/// Clock backed by a tokio runtime
#[derive(Debug, Clone)]
pub struct TokioClock {
    handle: Handle,
}

impl TokioClock {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn after(&self, delay: Duration, task: TimerTask) -> TimerHandle {
        let join = self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        });
        TimerHandle::new(move || join.abort())
    }
}

struct ManualState {
    start: DateTime<Utc>,
    elapsed: Duration,
    next_seq: u64,
    /// Keyed by (due time, scheduling order) so equal due times fire first-scheduled first
    timers: BTreeMap<(Duration, u64), TimerTask>,
}

/// Deterministic clock for tests and replays
///
/// Cloning shares the same timeline.
#[derive(Clone)]
pub struct ManualClock {
    state: Arc<Mutex<ManualState>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ManualState {
                start,
                elapsed: Duration::ZERO,
                next_seq: 0,
                timers: BTreeMap::new(),
            })),
        }
    }

    /// Move time forward, firing every timer due within the window in due order
    ///
    /// Returns the number of timers fired.
    pub fn advance(&self, by: Duration) -> usize {
        let target = lock(&self.state).elapsed.saturating_add(by);
        let mut fired = 0;

        loop {
            // Pop under the lock, run outside it: the task may schedule or cancel timers
            let task = {
                let mut state = lock(&self.state);
                let due_key = state
                    .timers
                    .keys()
                    .next()
                    .copied()
                    .filter(|(due, _)| *due <= target);
                match due_key {
                    Some(key) => {
                        state.elapsed = state.elapsed.max(key.0);
                        state.timers.remove(&key)
                    }
                    None => {
                        state.elapsed = target;
                        None
                    }
                }
            };

            match task {
                Some(task) => {
                    task();
                    fired += 1;
                }
                None => return fired,
            }
        }
    }

    /// Fire every scheduled timer, jumping time to each due point
    pub fn run_until_idle(&self) -> usize {
        let mut fired = 0;

        loop {
            let task = {
                let mut state = lock(&self.state);
                match state.timers.keys().next().copied() {
                    Some(key) => {
                        state.elapsed = state.elapsed.max(key.0);
                        state.timers.remove(&key)
                    }
                    None => None,
                }
            };

            match task {
                Some(task) => {
                    task();
                    fired += 1;
                }
                None => return fired,
            }
        }
    }

    /// Number of timers still waiting to fire
    pub fn pending_timers(&self) -> usize {
        lock(&self.state).timers.len()
    }

    /// Time elapsed since the clock was created
    pub fn elapsed(&self) -> Duration {
        lock(&self.state).elapsed
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl fmt::Debug for ManualClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("ManualClock")
            .field("elapsed", &state.elapsed)
            .field("pending_timers", &state.timers.len())
            .finish()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let state = lock(&self.state);
        let elapsed = chrono::Duration::from_std(state.elapsed).unwrap_or_else(|_| chrono::Duration::zero());
        state.start + elapsed
    }

    fn after(&self, delay: Duration, task: TimerTask) -> TimerHandle {
        let key = {
            let mut state = lock(&self.state);
            let key = (state.elapsed.saturating_add(delay), state.next_seq);
            state.next_seq += 1;
            state.timers.insert(key, task);
            key
        };

        let state = Arc::downgrade(&self.state);
        TimerHandle::new(move || {
            if let Some(state) = state.upgrade() {
                lock(&state).timers.remove(&key);
            }
        })
    }
}

/// Lock ignoring poisoning; the guarded data stays consistent across a panicking task
/// because tasks never run under the lock.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
