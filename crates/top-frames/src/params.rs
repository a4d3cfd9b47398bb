//! Parameter values shared between the main thread and the worker.

use std::sync::Arc;

use parking_lot::Mutex;

/// A guarded parameter cell.
///
/// The main thread stores a fresh snapshot every tick; the worker copies the
/// whole value once per frame so a frame never mixes two ticks' settings.
/// This lock is separate from the frame queue lock.
#[derive(Debug)]
pub struct SharedParams<P> {
    value: Arc<Mutex<P>>,
}

impl<P> Clone for SharedParams<P> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
        }
    }
}

impl<P: Copy> SharedParams<P> {
    pub fn new(initial: P) -> Self {
        Self {
            value: Arc::new(Mutex::new(initial)),
        }
    }

    pub fn store(&self, value: P) {
        *self.value.lock() = value;
    }

    pub fn snapshot(&self) -> P {
        *self.value.lock()
    }
}
