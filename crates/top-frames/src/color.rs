//! Pure pixel mapping: the synthetic pattern and the depth false-color ramp.

use crate::buffer::Rgba;
use crate::error::FrameError;

/// Byte offset of the depth word inside one source pixel.
pub const DEPTH_WORD_OFFSET: usize = 4;

/// Smallest pixel stride that still holds the depth word.
pub const MIN_DEPTH_STRIDE: usize = DEPTH_WORD_OFFSET + 2;

// ---------------------------------------------------------------------------
// Synthetic pattern
// ---------------------------------------------------------------------------

/// Animation step and brightness for the synthetic pattern.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticParams {
    pub step: f64,
    pub brightness: f64,
}

impl Default for SyntheticParams {
    fn default() -> Self {
        Self {
            step: 0.0,
            brightness: 1.0,
        }
    }
}

/// Wrap `step` into `[0, extent)`.
///
/// The fractional part is truncated and negative remainders are moved up by
/// `extent`, so `-1` wraps to `extent - 1`. Non-finite steps wrap to 0.
pub fn wrap_step(step: f64, extent: usize) -> usize {
    if extent == 0 {
        return 0;
    }
    let extent = extent as i64;
    let mut wrapped = (step % extent as f64) as i64;
    if wrapped < 0 {
        wrapped += extent;
    }
    wrapped as usize
}

/// Color of one synthetic pixel given already-wrapped steps.
pub fn synthetic_pixel(x: usize, y: usize, xstep: usize, ystep: usize, brightness: f32) -> Rgba {
    let r = if x > xstep { brightness } else { 0.0 };
    let g = if y > ystep { brightness } else { 0.0 };
    let b = (xstep % 50) as f32 / 50.0 * brightness;
    Rgba::opaque(r, g, b)
}

/// Render the synthetic pattern into `pixels`, laid out row-major as
/// `width * height`.
pub fn render_synthetic(pixels: &mut [Rgba], width: usize, height: usize, params: SyntheticParams) {
    if width == 0 {
        return;
    }
    let xstep = wrap_step(params.step, width);
    let ystep = wrap_step(params.step, height);
    let brightness = params.brightness as f32;
    for (y, row) in pixels.chunks_exact_mut(width).take(height).enumerate() {
        for (x, pixel) in row.iter_mut().enumerate() {
            *pixel = synthetic_pixel(x, y, xstep, ystep, brightness);
        }
    }
}

// ---------------------------------------------------------------------------
// Depth ramp
// ---------------------------------------------------------------------------

/// The depth window, in millimeters. Depths outside `[near, far]` are black.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthParams {
    pub near: f64,
    pub far: f64,
}

impl Default for DepthParams {
    fn default() -> Self {
        Self {
            near: 0.0,
            far: 6000.0,
        }
    }
}

impl DepthParams {
    pub fn span(&self) -> f64 {
        self.far - self.near
    }

    /// False color for depth `z`.
    ///
    /// The window is split into four equal quartiles: red to yellow, yellow
    /// to green, green to cyan, cyan to blue. Each quartile's fraction is
    /// measured against the quartile width.
    pub fn color(&self, z: f64) -> Rgba {
        let span = self.span();
        if !(span > 0.0) || !(z >= self.near && z <= self.far) {
            return Rgba::BLACK;
        }
        let quarter = span / 4.0;
        let yellow = self.near + quarter;
        let green = self.near + 2.0 * quarter;
        let cyan = self.near + 3.0 * quarter;
        let fraction = |start: f64| ((z - start) / quarter).clamp(0.0, 1.0) as f32;

        if z <= yellow {
            Rgba::opaque(1.0, fraction(self.near), 0.0)
        } else if z <= green {
            Rgba::opaque(1.0 - fraction(yellow), 1.0, 0.0)
        } else if z <= cyan {
            Rgba::opaque(0.0, 1.0, fraction(green))
        } else {
            Rgba::opaque(0.0, 1.0 - fraction(cyan), 1.0)
        }
    }
}

/// Scale a raw depth word to whole millimeters, truncating toward zero.
pub fn depth_millimeters(raw: i16, coordinate_scale: f64) -> f64 {
    (f64::from(raw) * coordinate_scale).trunc()
}

/// Map a raw depth image into `pixels`, flipping it vertically.
///
/// Source pixel `i` lands on row `height - i / width - 1`, column
/// `i % width`. `data` must hold at least `width * height` pixels of
/// `bits_per_pixel / 8` bytes each, with the depth word as a little-endian
/// `i16` at byte offset 4.
pub fn render_depth(
    data: &[u8],
    bits_per_pixel: usize,
    coordinate_scale: f64,
    params: DepthParams,
    pixels: &mut [Rgba],
    width: usize,
    height: usize,
) -> Result<(), FrameError> {
    if bits_per_pixel % 8 != 0 || bits_per_pixel / 8 < MIN_DEPTH_STRIDE {
        return Err(FrameError::UnsupportedLayout { bits_per_pixel });
    }
    let stride = bits_per_pixel / 8;
    let count = width * height;
    let expected = count * stride;
    if data.len() < expected {
        return Err(FrameError::ShortFrame {
            expected,
            actual: data.len(),
        });
    }
    if pixels.len() != count {
        return Err(FrameError::DimensionMismatch {
            frame_width: width,
            frame_height: height,
            output_width: width,
            output_height: pixels.len().checked_div(width).unwrap_or(0),
        });
    }

    for (i, source) in data.chunks_exact(stride).take(count).enumerate() {
        let raw = i16::from_le_bytes([source[DEPTH_WORD_OFFSET], source[DEPTH_WORD_OFFSET + 1]]);
        let row = height - i / width - 1;
        let col = i % width;
        pixels[row * width + col] = params.color(depth_millimeters(raw, coordinate_scale));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn near_eq(a: Rgba, b: Rgba) -> bool {
        (a.r - b.r).abs() < 1e-6
            && (a.g - b.g).abs() < 1e-6
            && (a.b - b.b).abs() < 1e-6
            && (a.a - b.a).abs() < 1e-6
    }

    #[test]
    fn negative_step_wraps_to_last_column() {
        assert_eq!(wrap_step(-1.0, 100), 99);
        assert_eq!(wrap_step(250.0, 100), 50);
        assert_eq!(wrap_step(3.9, 100), 3);
        assert_eq!(wrap_step(f64::NAN, 100), 0);
        assert_eq!(wrap_step(5.0, 0), 0);
    }

    #[test]
    fn synthetic_pixel_channels() {
        // xstep 10, ystep 20
        assert_eq!(synthetic_pixel(11, 21, 10, 20, 1.0), Rgba::opaque(1.0, 1.0, 0.2));
        assert_eq!(synthetic_pixel(10, 20, 10, 20, 1.0), Rgba::opaque(0.0, 0.0, 0.2));
        assert_eq!(synthetic_pixel(0, 0, 60, 0, 0.5), Rgba::opaque(0.0, 0.0, 0.1));
    }

    #[test]
    fn render_synthetic_at_step_zero() {
        let mut pixels = vec![Rgba::default(); 3 * 2];
        render_synthetic(&mut pixels, 3, 2, SyntheticParams::default());
        assert_eq!(pixels[0], Rgba::opaque(0.0, 0.0, 0.0));
        assert_eq!(pixels[1], Rgba::opaque(1.0, 0.0, 0.0));
        assert_eq!(pixels[4], Rgba::opaque(1.0, 1.0, 0.0));
    }

    #[test]
    fn depth_ramp_boundaries() {
        let window = DepthParams {
            near: 0.0,
            far: 4000.0,
        };
        assert!(near_eq(window.color(0.0), Rgba::RED));
        assert!(near_eq(window.color(1000.0), Rgba::YELLOW));
        assert!(near_eq(window.color(2000.0), Rgba::GREEN));
        assert!(near_eq(window.color(3000.0), Rgba::CYAN));
        assert!(near_eq(window.color(4000.0), Rgba::BLUE));
        assert_eq!(window.color(4001.0), Rgba::BLACK);
        assert_eq!(window.color(-1.0), Rgba::BLACK);
    }

    #[test]
    fn quartile_fraction_uses_quartile_width() {
        let window = DepthParams {
            near: 1000.0,
            far: 5000.0,
        };
        // Halfway through the yellow to green quartile. Dividing by the
        // first quartile border (2000) instead would give red 0.75.
        let color = window.color(2500.0);
        assert!(near_eq(color, Rgba::opaque(0.5, 1.0, 0.0)), "{color:?}");
    }

    #[test]
    fn empty_window_is_black() {
        let flat = DepthParams {
            near: 2000.0,
            far: 2000.0,
        };
        assert_eq!(flat.color(2000.0), Rgba::BLACK);
        let inverted = DepthParams {
            near: 3000.0,
            far: 1000.0,
        };
        assert_eq!(inverted.color(2000.0), Rgba::BLACK);
    }

    #[test]
    fn depth_is_scaled_and_truncated() {
        assert_eq!(depth_millimeters(1001, 0.25), 250.0);
        assert_eq!(depth_millimeters(-7, 0.5), -3.0);
    }

    fn depth_image(depths: &[i16], stride: usize) -> Vec<u8> {
        let mut data = vec![0u8; depths.len() * stride];
        for (pixel, depth) in data.chunks_exact_mut(stride).zip(depths) {
            pixel[DEPTH_WORD_OFFSET..DEPTH_WORD_OFFSET + 2].copy_from_slice(&depth.to_le_bytes());
        }
        data
    }

    #[test]
    fn depth_image_is_flipped_vertically() {
        let window = DepthParams {
            near: 0.0,
            far: 4000.0,
        };
        // Row 0 of the source is near (red), row 1 is far (blue).
        let data = depth_image(&[0, 0, 4000, 4000], 8);
        let mut pixels = vec![Rgba::default(); 4];
        render_depth(&data, 64, 1.0, window, &mut pixels, 2, 2).unwrap();
        assert!(near_eq(pixels[0], Rgba::BLUE));
        assert!(near_eq(pixels[1], Rgba::BLUE));
        assert!(near_eq(pixels[2], Rgba::RED));
        assert!(near_eq(pixels[3], Rgba::RED));
    }

    #[test]
    fn narrow_stride_is_rejected() {
        let mut pixels = vec![Rgba::default(); 1];
        let err = render_depth(&[0; 4], 32, 1.0, DepthParams::default(), &mut pixels, 1, 1);
        assert_eq!(err, Err(FrameError::UnsupportedLayout { bits_per_pixel: 32 }));
    }

    #[test]
    fn short_data_is_rejected() {
        let mut pixels = vec![Rgba::default(); 4];
        let data = depth_image(&[1, 2, 3], 6);
        let err = render_depth(&data, 48, 1.0, DepthParams::default(), &mut pixels, 2, 2);
        assert_eq!(
            err,
            Err(FrameError::ShortFrame {
                expected: 24,
                actual: 18
            })
        );
    }

    proptest! {
        #[test]
        fn synthetic_render_is_deterministic(
            step in -10_000.0f64..10_000.0,
            brightness in 0.0f64..=1.0,
            width in 1usize..24,
            height in 1usize..24,
        ) {
            let params = SyntheticParams { step, brightness };
            let mut first = vec![Rgba::default(); width * height];
            let mut second = vec![Rgba::BLUE; width * height];
            render_synthetic(&mut first, width, height, params);
            render_synthetic(&mut second, width, height, params);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn wrapped_step_is_in_range(step in -1.0e9f64..1.0e9, extent in 1usize..4096) {
            let wrapped = wrap_step(step, extent);
            prop_assert!(wrapped < extent);
            let whole = step.trunc() as i64;
            prop_assert_eq!((whole - wrapped as i64).rem_euclid(extent as i64), 0);
        }

        #[test]
        fn depth_colors_are_opaque_and_bounded(z in -100.0f64..7000.0, near in 0.0f64..3000.0, far in 3000.0f64..6000.0) {
            let color = DepthParams { near, far }.color(z);
            prop_assert_eq!(color.a, 1.0);
            for channel in [color.r, color.g, color.b] {
                prop_assert!((0.0..=1.0).contains(&channel));
            }
        }
    }
}
