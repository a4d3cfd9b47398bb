//! Per-tick output descriptor handed to [`crate::TopInstance::execute`].

use crate::ffi::*;

/// Floats per RGBA32Float pixel.
pub const CHANNELS: usize = 4;

/// Safe view over the host's CPU memory slots for one tick.
///
/// The slices are only valid for the duration of the tick that produced them.
/// Exactly one slot may be reported back as filled.
#[derive(Debug)]
pub struct OutputFormatSpecs<'a> {
    width: usize,
    height: usize,
    slots: Vec<Option<&'a mut [f32]>>,
    new_location: Option<usize>,
}

impl<'a> OutputFormatSpecs<'a> {
    /// Wrap host-owned slots. Slots shorter than `width * height * 4` floats
    /// are treated as unavailable.
    pub fn new(width: usize, height: usize, slots: Vec<&'a mut [f32]>) -> Self {
        let len = width * height * CHANNELS;
        let slots = slots
            .into_iter()
            .map(|slot| {
                if slot.len() >= len {
                    Some(&mut slot[..len])
                } else {
                    None
                }
            })
            .collect();
        Self {
            width,
            height,
            slots,
            new_location: None,
        }
    }

    /// # Safety
    ///
    /// Every non-null `cpuPixelData` pointer must reference at least
    /// `width * height * 4` writable, aligned `f32`s that stay valid and
    /// unaliased for `'a`.
    pub unsafe fn from_raw(raw: &TOP_OutputFormatSpecs) -> Self {
        let width = raw.width.max(0) as usize;
        let height = raw.height.max(0) as usize;
        let len = width * height * CHANNELS;
        let slots = raw
            .cpuPixelData
            .iter()
            .map(|&ptr| {
                (!ptr.is_null() && len > 0)
                    .then(|| unsafe { std::slice::from_raw_parts_mut(ptr.cast::<f32>(), len) })
            })
            .collect();
        Self {
            width,
            height,
            slots,
            new_location: None,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Floats needed to fill one slot.
    pub fn pixel_len(&self) -> usize {
        self.width * self.height * CHANNELS
    }

    pub fn num_slots(&self) -> usize {
        self.slots.len()
    }

    /// Writable memory of slot `index`, if the host provided it.
    pub fn slot_mut(&mut self, index: usize) -> Option<&mut [f32]> {
        self.slots.get_mut(index)?.as_deref_mut()
    }

    /// Copy `pixels` into slot `index` and report it as the new upload.
    ///
    /// Returns `false` when the slot is missing or `pixels` has the wrong size.
    pub fn upload(&mut self, index: usize, pixels: &[f32]) -> bool {
        let expected = self.pixel_len();
        let Some(slot) = self.slot_mut(index) else {
            return false;
        };
        if pixels.len() != expected {
            return false;
        }
        slot.copy_from_slice(pixels);
        self.new_location = Some(index);
        true
    }

    /// Report slot `index` as filled after writing it through [`Self::slot_mut`].
    pub fn mark_uploaded(&mut self, index: usize) {
        if self.slots.get(index).is_some_and(Option::is_some) {
            self.new_location = Some(index);
        }
    }

    pub fn new_cpu_pixel_data_location(&self) -> Option<usize> {
        self.new_location
    }

    /// Value for the host's `newCPUPixelDataLocation` field.
    pub fn location_code(&self) -> i32 {
        self.new_location
            .map_or(TOP_NO_NEW_CPU_PIXEL_DATA, |index| index as i32)
    }
}

/// Owned CPU memory slots, for running an instance without a host.
#[derive(Debug, Clone)]
pub struct CpuPixelSlots {
    width: usize,
    height: usize,
    slots: Vec<Vec<f32>>,
}

impl CpuPixelSlots {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            slots: vec![vec![0.0; width * height * CHANNELS]; TOP_NUM_CPU_PIXEL_DATAS],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn specs(&mut self) -> OutputFormatSpecs<'_> {
        let slots = self.slots.iter_mut().map(Vec::as_mut_slice).collect();
        OutputFormatSpecs::new(self.width, self.height, slots)
    }

    pub fn slot(&self, index: usize) -> &[f32] {
        &self.slots[index]
    }

    /// RGBA of pixel `(x, y)` in slot `index`.
    pub fn pixel(&self, index: usize, x: usize, y: usize) -> [f32; 4] {
        let at = (y * self.width + x) * CHANNELS;
        let p = &self.slots[index][at..at + CHANNELS];
        [p[0], p[1], p[2], p[3]]
    }
}
