//! Work and stop signalling between the main thread and a worker.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
struct Flags {
    work_requested: bool,
    stop_requested: bool,
}

/// Why a wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    Work,
    Stop,
    TimedOut,
}

/// A work request flag and a stop flag under one mutex, with one condvar.
///
/// Stopping wakes every waiter, so a worker parked on "wait for work" also
/// observes the stop.
#[derive(Debug, Default)]
pub struct WorkSignal {
    flags: Mutex<Flags>,
    cond: Condvar,
}

impl WorkSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_work(&self) {
        self.flags.lock().work_requested = true;
        self.cond.notify_all();
    }

    /// Consume a pending work request.
    pub fn take_work(&self) -> bool {
        std::mem::take(&mut self.flags.lock().work_requested)
    }

    pub fn request_stop(&self) {
        self.flags.lock().stop_requested = true;
        self.cond.notify_all();
    }

    pub fn is_stop_requested(&self) -> bool {
        self.flags.lock().stop_requested
    }

    /// Block until work is requested, stop is requested or `timeout` passes.
    /// Leaves the work request pending for [`Self::take_work`].
    pub fn wait_for_work(&self, timeout: Duration) -> Wake {
        let deadline = Instant::now() + timeout;
        let mut flags = self.flags.lock();
        loop {
            if flags.stop_requested {
                return Wake::Stop;
            }
            if flags.work_requested {
                return Wake::Work;
            }
            if self.cond.wait_until(&mut flags, deadline).timed_out() {
                return if flags.stop_requested {
                    Wake::Stop
                } else if flags.work_requested {
                    Wake::Work
                } else {
                    Wake::TimedOut
                };
            }
        }
    }

    /// Sleep for `duration` unless stop is requested first.
    /// Returns `true` if stop was requested.
    pub fn sleep_unless_stopped(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        let mut flags = self.flags.lock();
        while !flags.stop_requested {
            if self.cond.wait_until(&mut flags, deadline).timed_out() {
                break;
            }
        }
        flags.stop_requested
    }
}
