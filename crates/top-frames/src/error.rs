//! Error types for frame acquisition and mapping.

use std::time::Duration;

use thiserror::Error;

/// Why a frame source produced no frame. Every variant is recoverable: the
/// worker skips the iteration and the host keeps the previous image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("no frame within {0:?}")]
    Timeout(Duration),
    #[error("no camera device available")]
    DeviceUnavailable,
    #[error("malformed frame: {0}")]
    Malformed(#[from] FrameError),
    #[error("camera SDK call {call} failed with code {code}")]
    Sdk { call: &'static str, code: i32 },
    #[error("frame source interrupted")]
    Interrupted,
}

/// A raw frame that cannot be mapped into the output buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("{bits_per_pixel} bits per pixel cannot hold a depth word at byte offset 4")]
    UnsupportedLayout { bits_per_pixel: usize },
    #[error("frame holds {actual} bytes, {expected} needed")]
    ShortFrame { expected: usize, actual: usize },
    #[error("frame is {frame_width}x{frame_height}, output is {output_width}x{output_height}")]
    DimensionMismatch {
        frame_width: usize,
        frame_height: usize,
        output_width: usize,
        output_height: usize,
    },
}

/// Invalid pipeline configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{key}: unknown producer policy {value:?}, expected \"continuous\" or \"signaled\"")]
    UnknownPolicy { key: &'static str, value: String },
    #[error("{key}: {value:?} is not a whole number of milliseconds")]
    InvalidMillis { key: &'static str, value: String },
    #[error("{key}: {value:?} is not a boolean")]
    InvalidBool { key: &'static str, value: String },
}
