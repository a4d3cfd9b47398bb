//! Plugin-owned RGBA float pixel storage.
//!
//! A [`PixelBuffer`] is the unit that moves between the worker and the main
//! thread. Host memory is never handed to the worker; the main thread copies
//! a finished buffer into the host slot.

use bytemuck::{Pod, Zeroable};

/// One RGBA pixel in the host's `RGBA32Float` layout.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::new(0.0, 0.0, 0.0, 1.0);
    pub const RED: Rgba = Rgba::new(1.0, 0.0, 0.0, 1.0);
    pub const YELLOW: Rgba = Rgba::new(1.0, 1.0, 0.0, 1.0);
    pub const GREEN: Rgba = Rgba::new(0.0, 1.0, 0.0, 1.0);
    pub const CYAN: Rgba = Rgba::new(0.0, 1.0, 1.0, 1.0);
    pub const BLUE: Rgba = Rgba::new(0.0, 0.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from three channels.
    pub const fn opaque(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }
}

/// View interleaved RGBA floats as pixels.
///
/// Returns `None` when the length is not a whole number of pixels.
pub fn as_pixels_mut(floats: &mut [f32]) -> Option<&mut [Rgba]> {
    bytemuck::try_cast_slice_mut(floats).ok()
}

/// A `width * height` RGBA32F image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    pixels: Vec<Rgba>,
}

impl PixelBuffer {
    /// A zeroed buffer.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgba::zeroed(); width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn has_dimensions(&self, width: usize, height: usize) -> bool {
        self.width == width && self.height == height
    }

    /// Resize to `width * height`. Contents are unspecified afterwards; the
    /// allocation is reused when it is large enough.
    pub fn resize(&mut self, width: usize, height: usize) {
        if self.has_dimensions(width, height) {
            return;
        }
        self.width = width;
        self.height = height;
        self.pixels.resize(width * height, Rgba::zeroed());
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Rgba] {
        &mut self.pixels
    }

    /// Pixel at column `x`, row `y`.
    pub fn get(&self, x: usize, y: usize) -> Option<Rgba> {
        if x >= self.width {
            return None;
        }
        self.pixels.get(y * self.width + x).copied()
    }

    pub fn fill(&mut self, color: Rgba) {
        self.pixels.fill(color);
    }

    /// Interleaved floats, `width * height * 4` long, ready for upload.
    pub fn as_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use top_core::CHANNELS;

    #[test]
    fn resize_changes_dimensions_and_length() {
        let mut buffer = PixelBuffer::new(4, 2);
        assert_eq!(buffer.pixels().len(), 8);
        buffer.resize(3, 3);
        assert_eq!(buffer.dimensions(), (3, 3));
        assert_eq!(buffer.pixels().len(), 9);
        assert_eq!(buffer.as_floats().len(), 9 * CHANNELS);
    }

    #[test]
    fn floats_are_interleaved_rgba() {
        let mut buffer = PixelBuffer::new(2, 1);
        buffer.pixels_mut()[1] = Rgba::new(0.1, 0.2, 0.3, 0.4);
        assert_eq!(buffer.as_floats(), &[0.0, 0.0, 0.0, 0.0, 0.1, 0.2, 0.3, 0.4]);
        assert_eq!(buffer.get(1, 0), Some(Rgba::new(0.1, 0.2, 0.3, 0.4)));
        assert_eq!(buffer.get(2, 0), None);
    }

    #[test]
    fn host_floats_view_as_pixels() {
        let mut floats = vec![0.0f32; 8];
        let pixels = as_pixels_mut(&mut floats).unwrap();
        pixels[0] = Rgba::RED;
        assert_eq!(&floats[..4], &[1.0, 0.0, 0.0, 1.0]);

        let mut ragged = vec![0.0f32; 6];
        assert!(as_pixels_mut(&mut ragged).is_none());
    }
}
