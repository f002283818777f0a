//! Deferred callbacks.
//!
//! The pending-write scheduler never touches a clock directly; it asks a
//! [`Timer`] to run a callback after a delay and keeps the returned
//! [`TimerHandle`] to cancel it. [`TokioTimer`] is the runtime implementation,
//! [`ManualTimer`] a virtual clock that only moves when told to.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;

/// Callback run when a timer elapses.
pub type TimerCallback = Box<dyn FnOnce()>;

/// Capability to run a callback once `delay` has elapsed.
pub trait Timer {
    fn after(&self, delay: Duration, callback: TimerCallback) -> TimerHandle;
}

/// Cancels a scheduled callback.
///
/// Dropping the handle leaves the callback scheduled.
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl TimerHandle {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Prevent the callback from running. No effect once it has run.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerHandle").finish_non_exhaustive()
    }
}

/// Timer backed by `tokio::time`.
///
/// Callbacks are spawned with `spawn_local`, so this must be used from inside
/// a `tokio::task::LocalSet`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioTimer;

impl Timer for TokioTimer {
    fn after(&self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        let task = tokio::task::spawn_local(async move {
            tokio::time::sleep(delay).await;
            callback();
        });
        let abort = task.abort_handle();
        TimerHandle::new(move || abort.abort())
    }
}

struct Scheduled {
    due: Duration,
    seq: u64,
    callback: TimerCallback,
}

#[derive(Default)]
struct ManualClock {
    now: Cell<Duration>,
    next_seq: Cell<u64>,
    queue: RefCell<Vec<Scheduled>>,
}

/// Virtual clock for deterministic tests.
///
/// Time only moves on [`advance`](ManualTimer::advance); callbacks fire in due
/// order, ties broken by scheduling order.
#[derive(Clone, Default)]
pub struct ManualTimer {
    clock: Rc<ManualClock>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed since the timer was created.
    pub fn now(&self) -> Duration {
        self.clock.now.get()
    }

    /// Number of callbacks still waiting.
    pub fn pending(&self) -> usize {
        self.clock.queue.borrow().len()
    }

    /// Move the clock forward by `by`, running every callback that falls due.
    ///
    /// Callbacks may schedule further callbacks; those fire too if they fall
    /// due within the same window.
    pub fn advance(&self, by: Duration) {
        let target = self.clock.now.get() + by;
        loop {
            let next = {
                let mut queue = self.clock.queue.borrow_mut();
                let earliest = queue
                    .iter()
                    .enumerate()
                    .filter(|(_, s)| s.due <= target)
                    .min_by_key(|(_, s)| (s.due, s.seq))
                    .map(|(i, _)| i);
                earliest.map(|i| queue.swap_remove(i))
            };
            let Some(scheduled) = next else { break };
            self.clock.now.set(scheduled.due);
            (scheduled.callback)();
        }
        self.clock.now.set(target);
    }
}

impl Timer for ManualTimer {
    fn after(&self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        let seq = self.clock.next_seq.get();
        self.clock.next_seq.set(seq + 1);
        self.clock.queue.borrow_mut().push(Scheduled {
            due: self.clock.now.get() + delay,
            seq,
            callback,
        });
        let clock: Weak<ManualClock> = Rc::downgrade(&self.clock);
        TimerHandle::new(move || {
            if let Some(clock) = clock.upgrade() {
                clock.queue.borrow_mut().retain(|s| s.seq != seq);
            }
        })
    }
}
