//! The acquisition worker: one background thread per plugin instance.
//!
//! The loop leases a slot, acquires a raw frame, maps it with a parameter
//! snapshot and publishes the slot. Every failure is recoverable: the lease
//! and the frame are handed back and the next iteration starts over.

use std::mem::discriminant;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, error, info, trace, warn};

use crate::config::{PipelineConfig, ProducerPolicy};
use crate::error::{FrameError, SourceError};
use crate::mapper::ColorMapper;
use crate::params::SharedParams;
use crate::queue::FrameWriter;
use crate::signal::{Wake, WorkSignal};
use crate::source::{AcquiredFrame, FrameSource, Unblocker};

/// How long the worker parks when there is no slot to fill.
const IDLE_WAIT: Duration = Duration::from_millis(5);

/// Lifecycle of a [`Worker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStatus {
    NotStarted,
    Running,
    StopRequested,
    Stopped,
}

struct Pending<S: FrameSource, M: ColorMapper<S::Frame>> {
    source: S,
    mapper: M,
    writer: FrameWriter,
    params: SharedParams<M::Params>,
}

enum State<S: FrameSource, M: ColorMapper<S::Frame>> {
    NotStarted(Pending<S, M>),
    Running(JoinHandle<S>),
    Stopped(Option<S>),
}

/// Owns the worker thread and, before and after it runs, the frame source.
pub struct Worker<S: FrameSource, M: ColorMapper<S::Frame>> {
    state: State<S, M>,
    signal: Arc<WorkSignal>,
    unblocker: Option<Unblocker>,
    config: PipelineConfig,
    name: String,
    spawn_count: usize,
}

impl<S: FrameSource, M: ColorMapper<S::Frame>> Worker<S, M> {
    pub fn new(
        name: impl Into<String>,
        source: S,
        mapper: M,
        writer: FrameWriter,
        params: SharedParams<M::Params>,
        signal: Arc<WorkSignal>,
        config: PipelineConfig,
    ) -> Self {
        let unblocker = source.unblocker();
        Self {
            state: State::NotStarted(Pending {
                source,
                mapper,
                writer,
                params,
            }),
            signal,
            unblocker,
            config,
            name: name.into(),
            spawn_count: 0,
        }
    }

    pub fn status(&self) -> WorkerStatus {
        match &self.state {
            State::NotStarted(_) => WorkerStatus::NotStarted,
            State::Running(handle) if handle.is_finished() => WorkerStatus::Stopped,
            State::Running(_) if self.signal.is_stop_requested() => WorkerStatus::StopRequested,
            State::Running(_) => WorkerStatus::Running,
            State::Stopped(_) => WorkerStatus::Stopped,
        }
    }

    /// Threads spawned over this worker's life. Never exceeds 1.
    pub fn spawn_count(&self) -> usize {
        self.spawn_count
    }

    /// Start the thread if it has not been started. Later calls do nothing.
    pub fn ensure_started(&mut self) {
        if !matches!(self.state, State::NotStarted(_)) {
            return;
        }
        if self.signal.is_stop_requested() {
            return;
        }
        let State::NotStarted(pending) = std::mem::replace(&mut self.state, State::Stopped(None)) else {
            return;
        };
        let signal = Arc::clone(&self.signal);
        let config = self.config;
        let spawned = std::thread::Builder::new()
            .name(self.name.clone())
            .spawn(move || run(pending, signal, config));
        self.spawn_count += 1;
        match spawned {
            Ok(handle) => {
                debug!(worker = %self.name, policy = ?config.policy, "worker started");
                self.state = State::Running(handle);
            }
            Err(err) => {
                error!(worker = %self.name, error = %err, "failed to spawn worker thread");
            }
        }
    }

    /// Ask the thread to stop and interrupt a blocked acquire. Does not wait.
    pub fn request_stop(&self) {
        self.signal.request_stop();
        if matches!(self.state, State::Running(_)) {
            if let Some(unblock) = &self.unblocker {
                unblock();
            }
        }
    }

    /// Wait for the thread to finish and take the source back.
    ///
    /// Requests a stop first. Returns `None` if the thread panicked or the
    /// source was already taken.
    pub fn join(&mut self) -> Option<S> {
        self.request_stop();
        match std::mem::replace(&mut self.state, State::Stopped(None)) {
            State::NotStarted(pending) => Some(pending.source),
            State::Running(handle) => match handle.join() {
                Ok(source) => {
                    debug!(worker = %self.name, "worker joined");
                    Some(source)
                }
                Err(_) => {
                    error!(worker = %self.name, "worker thread panicked");
                    None
                }
            },
            State::Stopped(source) => source,
        }
    }
}

impl<S: FrameSource, M: ColorMapper<S::Frame>> Drop for Worker<S, M> {
    fn drop(&mut self) {
        drop(self.join());
    }
}

fn run<S: FrameSource, M: ColorMapper<S::Frame>>(
    pending: Pending<S, M>,
    signal: Arc<WorkSignal>,
    config: PipelineConfig,
) -> S {
    let Pending {
        mut source,
        mut mapper,
        writer,
        params,
    } = pending;
    let mut failures = FailureLog::default();
    let mut missed = false;

    while !signal.is_stop_requested() {
        let Some(mut lease) = writer.get_buffer_for_update() else {
            // A pending request that still yields no slot (no output size
            // yet) must not spin.
            let wake = match config.policy {
                ProducerPolicy::Signaled if missed => {
                    if signal.sleep_unless_stopped(IDLE_WAIT) {
                        Wake::Stop
                    } else {
                        Wake::TimedOut
                    }
                }
                ProducerPolicy::Signaled => signal.wait_for_work(config.acquire_timeout),
                ProducerPolicy::Continuous => signal.wait_for_work(IDLE_WAIT),
            };
            if wake == Wake::Stop {
                break;
            }
            missed = wake == Wake::Work;
            continue;
        };
        missed = false;

        let acquired = match AcquiredFrame::acquire(&mut source, config.acquire_timeout) {
            Ok(acquired) => acquired,
            Err(err) => {
                drop(lease);
                let unavailable = err == SourceError::DeviceUnavailable;
                failures.record(err);
                if unavailable && signal.sleep_unless_stopped(config.acquire_timeout) {
                    break;
                }
                continue;
            }
        };
        // Snapshot after the acquire: the frame maps with the latest committed values.
        let snapshot = params.snapshot();
        let mapped = mapper.map(acquired.frame(), &snapshot, lease.buffer_mut());
        drop(acquired);

        match mapped {
            Ok(()) => {
                let sequence = lease.sequence();
                if writer.update_complete(lease) {
                    trace!(sequence, "frame published");
                }
                failures.recovered();
            }
            Err(err) => failures.record(SourceError::Malformed(err)),
        }
    }
    debug!("worker loop exited");
    source
}

/// Logs the first failure of each kind and stays quiet while it repeats.
#[derive(Debug, Default)]
struct FailureLog {
    last: Option<SourceError>,
    repeats: u64,
}

impl FailureLog {
    fn record(&mut self, err: SourceError) {
        let same_kind = self
            .last
            .as_ref()
            .is_some_and(|last| discriminant(last) == discriminant(&err));
        if same_kind {
            self.repeats += 1;
            return;
        }
        match &err {
            SourceError::Timeout(timeout) => debug!(?timeout, "no frame before timeout"),
            SourceError::DeviceUnavailable => warn!("camera unavailable, no new frames will be produced"),
            SourceError::Malformed(FrameError::DimensionMismatch { .. }) => {
                warn!(error = %err, "frame does not match the output size, dropped")
            }
            SourceError::Malformed(_) => warn!(error = %err, "malformed frame dropped"),
            SourceError::Sdk { .. } => error!(error = %err, "frame acquisition failed"),
            SourceError::Interrupted => debug!("acquire interrupted"),
        }
        self.last = Some(err);
        self.repeats = 0;
    }

    fn recovered(&mut self) {
        if let Some(last) = self.last.take() {
            if !matches!(last, SourceError::Timeout(_) | SourceError::Interrupted) {
                info!(error = %last, repeats = self.repeats, "frames flowing again");
            }
            self.repeats = 0;
        }
    }
}
