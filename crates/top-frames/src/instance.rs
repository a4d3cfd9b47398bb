//! Per-tick orchestration of one threaded frame pipeline.

use std::sync::Arc;

use top_core::OutputFormatSpecs;

use crate::config::PipelineConfig;
use crate::mapper::ColorMapper;
use crate::params::SharedParams;
use crate::queue::{FrameQueue, QueueStats, SlotState, SLOT_COUNT};
use crate::signal::WorkSignal;
use crate::source::FrameSource;
use crate::worker::{Worker, WorkerStatus};

/// A frame source, a color mapper and the queue between them.
///
/// The worker thread is started lazily on the first [`FrameInstance::tick`]
/// and joined on [`FrameInstance::shutdown`] or drop.
pub struct FrameInstance<S: FrameSource, M: ColorMapper<S::Frame>> {
    queue: FrameQueue,
    params: SharedParams<M::Params>,
    worker: Worker<S, M>,
}

impl<S: FrameSource, M: ColorMapper<S::Frame>> FrameInstance<S, M> {
    pub fn new(name: impl Into<String>, source: S, mapper: M, initial: M::Params, config: PipelineConfig) -> Self {
        let signal = Arc::new(WorkSignal::new());
        let queue = FrameQueue::new(config.policy, Arc::clone(&signal));
        let params = SharedParams::new(initial);
        let worker = Worker::new(name, source, mapper, queue.writer(), params.clone(), signal, config);
        Self { queue, params, worker }
    }

    /// One host tick: publish `params`, match the output size, make sure the
    /// worker runs, then hand over the newest finished frame.
    ///
    /// Returns `true` when a new frame was written to a host slot.
    pub fn tick(&mut self, output: &mut OutputFormatSpecs<'_>, params: M::Params) -> bool {
        self.params.store(params);
        self.queue.sync(output.width(), output.height());
        self.worker.ensure_started();
        self.queue.send_buffer_for_upload(output)
    }

    /// Stop and join the worker, returning the source for ordered teardown.
    pub fn shutdown(&mut self) -> Option<S> {
        self.worker.join()
    }

    pub fn worker_status(&self) -> WorkerStatus {
        self.worker.status()
    }

    pub fn spawn_count(&self) -> usize {
        self.worker.spawn_count()
    }

    pub fn slot_states(&self) -> [SlotState; SLOT_COUNT] {
        self.queue.slot_states()
    }

    pub fn stats(&self) -> QueueStats {
        self.queue.stats()
    }

    pub fn queue(&self) -> &FrameQueue {
        &self.queue
    }
}
