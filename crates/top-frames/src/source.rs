//! Frame sources: where the worker gets raw frames from.

use std::mem::ManuallyDrop;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::SourceError;

/// A raw frame as delivered by a source.
pub trait RawFrame {
    fn data(&self) -> &[u8];
    fn bits_per_pixel(&self) -> usize;
    fn width(&self) -> usize;
    fn height(&self) -> usize;
}

/// Wakes a source blocked in [`FrameSource::acquire`] from another thread.
pub type Unblocker = Arc<dyn Fn() + Send + Sync>;

/// A blocking supplier of frames.
///
/// The worker thread owns the source. Every frame returned by `acquire` must
/// be handed back to `release` exactly once; use [`AcquiredFrame`] rather
/// than calling the pair directly.
pub trait FrameSource: Send + 'static {
    type Frame: Send;

    /// Block for at most `timeout` waiting for the next frame.
    fn acquire(&mut self, timeout: Duration) -> Result<Self::Frame, SourceError>;

    /// Return a frame's storage to the source.
    fn release(&mut self, frame: Self::Frame);

    /// A handle that interrupts a pending `acquire`, if the source supports it.
    fn unblocker(&self) -> Option<Unblocker> {
        None
    }
}

/// A frame on loan from its source. Dropping the guard releases it.
pub struct AcquiredFrame<'a, S: FrameSource> {
    source: &'a mut S,
    frame: ManuallyDrop<S::Frame>,
}

impl<'a, S: FrameSource> AcquiredFrame<'a, S> {
    pub fn acquire(source: &'a mut S, timeout: Duration) -> Result<Self, SourceError> {
        let frame = source.acquire(timeout)?;
        Ok(Self {
            source,
            frame: ManuallyDrop::new(frame),
        })
    }

    pub fn frame(&self) -> &S::Frame {
        &self.frame
    }
}

impl<S: FrameSource> Drop for AcquiredFrame<'_, S> {
    fn drop(&mut self) {
        // SAFETY: `frame` is taken only here, and drop runs once.
        let frame = unsafe { ManuallyDrop::take(&mut self.frame) };
        self.source.release(frame);
    }
}

// ---------------------------------------------------------------------------
// Synthetic source
// ---------------------------------------------------------------------------

/// A tick from the synthetic source. Carries no pixels; the synthetic mapper
/// draws from parameters alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntheticFrame {
    pub sequence: u64,
}

/// Paces the synthetic pattern at a fixed frame interval.
#[derive(Debug)]
pub struct SyntheticSource {
    interval: Duration,
    next_due: Option<Instant>,
    sequence: u64,
}

impl SyntheticSource {
    /// A source yielding one frame per `interval`. A zero interval never waits.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: None,
            sequence: 0,
        }
    }

    pub fn frames_produced(&self) -> u64 {
        self.sequence
    }
}

impl FrameSource for SyntheticSource {
    type Frame = SyntheticFrame;

    fn acquire(&mut self, timeout: Duration) -> Result<SyntheticFrame, SourceError> {
        let now = Instant::now();
        if let Some(due) = self.next_due {
            let wait = due.saturating_duration_since(now);
            if wait > timeout {
                std::thread::sleep(timeout);
                return Err(SourceError::Timeout(timeout));
            }
            std::thread::sleep(wait);
        }
        self.next_due = Some(Instant::now() + self.interval);
        self.sequence += 1;
        Ok(SyntheticFrame {
            sequence: self.sequence,
        })
    }

    fn release(&mut self, _frame: SyntheticFrame) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counting {
        acquired: usize,
        released: usize,
    }

    impl FrameSource for Counting {
        type Frame = usize;

        fn acquire(&mut self, _timeout: Duration) -> Result<usize, SourceError> {
            self.acquired += 1;
            Ok(self.acquired)
        }

        fn release(&mut self, _frame: usize) {
            self.released += 1;
        }
    }

    #[test]
    fn guard_releases_on_drop() {
        let mut source = Counting {
            acquired: 0,
            released: 0,
        };
        {
            let frame = AcquiredFrame::acquire(&mut source, Duration::ZERO).unwrap();
            assert_eq!(*frame.frame(), 1);
        }
        assert_eq!(source.released, 1);
    }

    #[test]
    fn synthetic_source_counts_frames() {
        let mut source = SyntheticSource::new(Duration::ZERO);
        let first = source.acquire(Duration::from_millis(10)).unwrap();
        let second = source.acquire(Duration::from_millis(10)).unwrap();
        assert_eq!(first.sequence, 1);
        assert_eq!(second.sequence, 2);
        assert_eq!(source.frames_produced(), 2);
    }

    #[test]
    fn synthetic_source_times_out_when_interval_exceeds_timeout() {
        let mut source = SyntheticSource::new(Duration::from_secs(60));
        source.acquire(Duration::from_millis(1)).unwrap();
        assert_eq!(
            source.acquire(Duration::from_millis(1)),
            Err(SourceError::Timeout(Duration::from_millis(1)))
        );
    }
}
