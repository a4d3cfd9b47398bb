//! Double-buffered hand-off of finished frames from the worker to the host.
//!
//! The queue owns two [`PixelBuffer`] slots. The worker leases an `Empty`
//! slot, fills it outside any lock and publishes it as `Ready`. Once per
//! tick the main thread swaps the newest `Ready` buffer with its own front
//! buffer under the lock, then copies the front buffer into the host slot
//! with the lock released.
//!
//! A slot's buffer physically moves with its owner: while a slot is
//! `InProgress` the buffer lives in the worker's [`FrameLease`], and the main
//! thread only ever touches its front buffer. Neither side can observe memory
//! the other is writing.

use std::sync::Arc;

use parking_lot::Mutex;
use top_core::OutputFormatSpecs;
use tracing::trace;

use crate::buffer::PixelBuffer;
use crate::config::ProducerPolicy;
use crate::signal::WorkSignal;

/// Number of producer-side slots.
pub const SLOT_COUNT: usize = 2;

/// Who owns a slot's buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Free for the worker.
    Empty,
    /// Leased to the worker, being written.
    InProgress,
    /// Finished, waiting for the main thread.
    Ready,
}

#[derive(Debug)]
struct Slot {
    state: SlotState,
    /// `None` exactly while the slot is `InProgress`.
    buffer: Option<PixelBuffer>,
    sequence: u64,
}

impl Slot {
    fn empty() -> Self {
        Self {
            state: SlotState::Empty,
            buffer: Some(PixelBuffer::default()),
            sequence: 0,
        }
    }
}

/// Frame counters, for diagnostics and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Frames the worker published.
    pub produced: u64,
    /// Frames copied into a host slot.
    pub delivered: u64,
    /// Published frames replaced or invalidated before delivery.
    pub dropped: u64,
}

#[derive(Debug)]
struct State {
    width: usize,
    height: usize,
    slots: [Slot; SLOT_COUNT],
    next_sequence: u64,
    stats: QueueStats,
}

impl State {
    fn newest_ready(&self) -> Option<usize> {
        (0..SLOT_COUNT)
            .filter(|&i| self.slots[i].state == SlotState::Ready)
            .max_by_key(|&i| self.slots[i].sequence)
    }

    fn is_idle(&self) -> bool {
        self.slots.iter().all(|slot| slot.state == SlotState::Empty)
    }

    fn drop_ready(&mut self, index: usize) {
        let slot = &mut self.slots[index];
        if slot.state == SlotState::Ready {
            slot.state = SlotState::Empty;
            self.stats.dropped += 1;
        }
    }
}

#[derive(Debug)]
struct Shared {
    state: Mutex<State>,
    signal: Arc<WorkSignal>,
    policy: ProducerPolicy,
}

/// Consumer side of the queue, owned by the main thread.
#[derive(Debug)]
pub struct FrameQueue {
    shared: Arc<Shared>,
    front: PixelBuffer,
    host_slot: usize,
}

impl FrameQueue {
    pub fn new(policy: ProducerPolicy, signal: Arc<WorkSignal>) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    width: 0,
                    height: 0,
                    slots: [Slot::empty(), Slot::empty()],
                    next_sequence: 1,
                    stats: QueueStats::default(),
                }),
                signal,
                policy,
            }),
            front: PixelBuffer::default(),
            host_slot: 0,
        }
    }

    /// The producer handle. There must be at most one producer at a time.
    pub fn writer(&self) -> FrameWriter {
        FrameWriter {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn policy(&self) -> ProducerPolicy {
        self.shared.policy
    }

    /// Record the host's output dimensions for this tick.
    ///
    /// `Ready` frames of another size are discarded; buffers are resized the
    /// next time the worker leases them.
    pub fn sync(&mut self, width: usize, height: usize) {
        let mut state = self.shared.state.lock();
        if state.width == width && state.height == height {
            return;
        }
        trace!(width, height, "output dimensions changed");
        state.width = width;
        state.height = height;
        for index in 0..SLOT_COUNT {
            state.drop_ready(index);
        }
    }

    /// Deliver the newest finished frame into a host slot.
    ///
    /// Returns `true` when a new frame was uploaded. Otherwise the output
    /// reports no new data and the host keeps showing its previous frame.
    /// Never waits for the worker.
    pub fn send_buffer_for_upload(&mut self, output: &mut OutputFormatSpecs<'_>) -> bool {
        let (fresh, request_more) = {
            let mut state = self.shared.state.lock();
            let mut fresh = None;
            if let Some(index) = state.newest_ready() {
                let slot = &mut state.slots[index];
                if let Some(buffer) = slot.buffer.as_mut() {
                    std::mem::swap(buffer, &mut self.front);
                    slot.state = SlotState::Empty;
                    fresh = Some(slot.sequence);
                }
            }
            let request_more = self.shared.policy == ProducerPolicy::Signaled && state.is_idle();
            (fresh, request_more)
        };
        if request_more {
            self.shared.signal.request_work();
        }

        let Some(sequence) = fresh else {
            return false;
        };
        if !self.front.has_dimensions(output.width(), output.height()) {
            trace!(sequence, "frame does not match the output, skipped");
            return false;
        }
        let slots = output.num_slots().max(1);
        let index = self.host_slot % slots;
        self.host_slot = (index + 1) % slots;
        let uploaded = output.upload(index, self.front.as_floats());
        if uploaded {
            self.shared.state.lock().stats.delivered += 1;
        }
        uploaded
    }

    /// The most recently collected frame, in plugin memory.
    pub fn front(&self) -> &PixelBuffer {
        &self.front
    }

    pub fn slot_states(&self) -> [SlotState; SLOT_COUNT] {
        let state = self.shared.state.lock();
        [state.slots[0].state, state.slots[1].state]
    }

    pub fn stats(&self) -> QueueStats {
        self.shared.state.lock().stats
    }
}

/// Producer side of the queue, owned by the worker.
#[derive(Debug)]
pub struct FrameWriter {
    shared: Arc<Shared>,
}

impl FrameWriter {
    /// Lease a slot to fill, or `None` if there is nothing to do yet.
    ///
    /// Under [`ProducerPolicy::Signaled`] this consumes the pending work
    /// request and yields nothing without one. Under
    /// [`ProducerPolicy::Continuous`] an uncollected frame is overwritten
    /// when no slot is empty.
    pub fn get_buffer_for_update(&self) -> Option<FrameLease> {
        let mut state = self.shared.state.lock();
        if state.width == 0 || state.height == 0 {
            return None;
        }
        let index = match state.slots.iter().position(|slot| slot.state == SlotState::Empty) {
            Some(index) => index,
            None if self.shared.policy == ProducerPolicy::Continuous => {
                let oldest = (0..SLOT_COUNT)
                    .filter(|&i| state.slots[i].state == SlotState::Ready)
                    .min_by_key(|&i| state.slots[i].sequence)?;
                state.drop_ready(oldest);
                oldest
            }
            None => return None,
        };
        if self.shared.policy == ProducerPolicy::Signaled && !self.shared.signal.take_work() {
            return None;
        }

        let (width, height) = (state.width, state.height);
        let sequence = state.next_sequence;
        state.next_sequence += 1;
        let slot = &mut state.slots[index];
        let mut buffer = slot.buffer.take().unwrap_or_default();
        buffer.resize(width, height);
        slot.state = SlotState::InProgress;
        Some(FrameLease {
            shared: Arc::clone(&self.shared),
            slot: index,
            sequence,
            buffer,
            published: false,
        })
    }

    /// Publish a filled lease as the newest `Ready` frame.
    pub fn update_complete(&self, lease: FrameLease) -> bool {
        lease.complete()
    }

    pub fn policy(&self) -> ProducerPolicy {
        self.shared.policy
    }
}

/// A slot on loan to the worker. Dropping it without [`FrameLease::complete`]
/// returns the slot as `Empty`.
#[derive(Debug)]
pub struct FrameLease {
    shared: Arc<Shared>,
    slot: usize,
    sequence: u64,
    buffer: PixelBuffer,
    published: bool,
}

impl FrameLease {
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn buffer_mut(&mut self) -> &mut PixelBuffer {
        &mut self.buffer
    }

    /// Publish the buffer. Older `Ready` frames are dropped. A buffer whose
    /// size no longer matches the output is discarded instead; returns
    /// `false` in that case.
    pub fn complete(mut self) -> bool {
        self.published = true;
        let buffer = std::mem::take(&mut self.buffer);
        let mut state = self.shared.state.lock();
        let current = buffer.has_dimensions(state.width, state.height);
        let slot = &mut state.slots[self.slot];
        slot.buffer = Some(buffer);
        if !current {
            slot.state = SlotState::Empty;
            return false;
        }
        slot.state = SlotState::Ready;
        slot.sequence = self.sequence;
        state.stats.produced += 1;
        for index in 0..SLOT_COUNT {
            if index != self.slot && state.slots[index].sequence < self.sequence {
                state.drop_ready(index);
            }
        }
        true
    }
}

impl Drop for FrameLease {
    fn drop(&mut self) {
        if self.published {
            return;
        }
        let buffer = std::mem::take(&mut self.buffer);
        let mut state = self.shared.state.lock();
        let slot = &mut state.slots[self.slot];
        slot.buffer = Some(buffer);
        slot.state = SlotState::Empty;
        let idle = state.is_idle();
        drop(state);
        // An abandoned signaled frame is still owed to the consumer.
        if self.shared.policy == ProducerPolicy::Signaled && idle {
            self.shared.signal.request_work();
        }
    }
}
