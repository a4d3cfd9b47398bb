//! Threaded frame pipeline for CPU-memory TOP plugins.
//!
//! This crate sits between [`top_core`] (host protocol) and a frame source
//! such as a camera. A background worker pulls raw frames, maps them to RGBA
//! and publishes them through a double-buffered queue; the host's main
//! thread collects the newest finished frame once per tick without ever
//! waiting on the worker.
//!
//! # Overview
//!
//! - [`FrameSource`] is the blocking frame supplier; [`SyntheticSource`]
//!   paces a procedural pattern and [`HardwareSource`] drives a
//!   [`CameraSystem`].
//! - [`ColorMapper`] turns a frame into pixels: [`SyntheticMapper`] and
//!   [`DepthMapper`].
//! - [`FrameQueue`] / [`FrameWriter`] hand finished [`PixelBuffer`]s from the
//!   worker to the main thread.
//! - [`Worker`] owns the background thread.
//! - [`FrameInstance`] runs the per-tick sequence.
//! - [`PipelineConfig`] selects the producer policy and timeouts.

pub mod buffer;
pub mod camera;
pub mod color;
pub mod config;
pub mod error;
pub mod instance;
pub mod mapper;
pub mod params;
pub mod queue;
pub mod signal;
pub mod source;
pub mod worker;

pub use buffer::{PixelBuffer, Rgba};
pub use camera::{CameraDevice, CameraSystem, DeviceState, HardwareSource};
pub use color::{DepthParams, SyntheticParams};
pub use config::{PipelineConfig, ProducerPolicy};
pub use error::{ConfigError, FrameError, SourceError};
pub use instance::FrameInstance;
pub use mapper::{ColorMapper, DepthMapper, SyntheticMapper};
pub use params::SharedParams;
pub use queue::{FrameLease, FrameQueue, FrameWriter, QueueStats, SlotState};
pub use signal::{Wake, WorkSignal};
pub use source::{AcquiredFrame, FrameSource, RawFrame, SyntheticFrame, SyntheticSource, Unblocker};
pub use worker::{Worker, WorkerStatus};
