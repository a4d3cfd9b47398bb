//! Color mappers: turn a raw frame plus a parameter snapshot into pixels.

use crate::buffer::PixelBuffer;
use crate::color::{render_depth, render_synthetic, DepthParams, SyntheticParams};
use crate::error::FrameError;
use crate::source::{RawFrame, SyntheticFrame};

/// Fills a [`PixelBuffer`] from a frame of type `F`.
///
/// The target already has the output dimensions. Mapping must not allocate
/// per frame and must either fill the whole target or return an error.
pub trait ColorMapper<F>: Send + 'static {
    /// Parameter snapshot the worker takes before each frame.
    type Params: Copy + Send + 'static;

    fn map(&mut self, frame: &F, params: &Self::Params, target: &mut PixelBuffer) -> Result<(), FrameError>;
}

/// Draws the animated synthetic pattern.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticMapper;

impl ColorMapper<SyntheticFrame> for SyntheticMapper {
    type Params = SyntheticParams;

    fn map(
        &mut self,
        _frame: &SyntheticFrame,
        params: &SyntheticParams,
        target: &mut PixelBuffer,
    ) -> Result<(), FrameError> {
        let (width, height) = target.dimensions();
        render_synthetic(target.pixels_mut(), width, height, *params);
        Ok(())
    }
}

/// Maps depth frames to the near/far false-color ramp.
#[derive(Debug, Clone, Copy)]
pub struct DepthMapper {
    coordinate_scale: f64,
}

impl DepthMapper {
    /// `coordinate_scale` converts raw depth words to millimeters.
    pub fn new(coordinate_scale: f64) -> Self {
        Self { coordinate_scale }
    }

    pub fn coordinate_scale(&self) -> f64 {
        self.coordinate_scale
    }
}

impl<F: RawFrame> ColorMapper<F> for DepthMapper {
    type Params = DepthParams;

    fn map(&mut self, frame: &F, params: &DepthParams, target: &mut PixelBuffer) -> Result<(), FrameError> {
        let (width, height) = target.dimensions();
        if frame.width() != width || frame.height() != height {
            return Err(FrameError::DimensionMismatch {
                frame_width: frame.width(),
                frame_height: frame.height(),
                output_width: width,
                output_height: height,
            });
        }
        render_depth(
            frame.data(),
            frame.bits_per_pixel(),
            self.coordinate_scale,
            *params,
            target.pixels_mut(),
            width,
            height,
        )
    }
}
