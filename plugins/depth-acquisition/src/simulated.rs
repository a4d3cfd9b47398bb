//! A software time-of-flight camera.
//!
//! Streams a tilted plane sweeping back and forth through the 0-6000 mm
//! range in the same four-channel 16-bit layout a Helios camera delivers
//! (x, y, z, intensity). Used when the crate is built without `arena`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use top_frames::{CameraDevice, CameraSystem, RawFrame, SourceError, Unblocker};

const BITS_PER_PIXEL: usize = 64;
const STRIDE: usize = BITS_PER_PIXEL / 8;
const COORDINATE_SCALE: f64 = 0.25;
const FRAME_INTERVAL: Duration = Duration::from_millis(33);
/// Raw depth word at the far end of the sweep.
const MAX_RAW_DEPTH: f64 = 6000.0 / COORDINATE_SCALE;

/// One simulated frame.
#[derive(Debug)]
pub struct SimulatedImage {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl RawFrame for SimulatedImage {
    fn data(&self) -> &[u8] {
        &self.data
    }

    fn bits_per_pixel(&self) -> usize {
        BITS_PER_PIXEL
    }

    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }
}

#[derive(Debug, Default)]
struct Wake {
    interrupted: Mutex<bool>,
    cond: Condvar,
}

pub struct SimulatedDevice {
    width: usize,
    height: usize,
    streaming: bool,
    frame: u64,
    next_due: Instant,
    pool: Vec<Vec<u8>>,
    wake: Arc<Wake>,
}

impl SimulatedDevice {
    fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            streaming: false,
            frame: 0,
            next_due: Instant::now(),
            pool: Vec::new(),
            wake: Arc::default(),
        }
    }

    /// Wait for the next frame slot, giving up after `timeout`.
    fn wait_for_frame(&mut self, timeout: Duration) -> Result<(), SourceError> {
        let deadline = Instant::now() + timeout;
        let due = self.next_due.min(deadline);
        let mut interrupted = self.wake.interrupted.lock();
        while !*interrupted && Instant::now() < due {
            self.wake.cond.wait_until(&mut interrupted, due);
        }
        if *interrupted {
            *interrupted = false;
            return Err(SourceError::Interrupted);
        }
        if self.next_due > deadline {
            return Err(SourceError::Timeout(timeout));
        }
        Ok(())
    }

    fn fill(&self, data: &mut [u8]) {
        // Triangle wave over ~6 s, tilted left to right.
        let phase = (self.frame % 180) as f64 / 90.0;
        let sweep = if phase <= 1.0 { phase } else { 2.0 - phase };
        for (i, pixel) in data.chunks_exact_mut(STRIDE).enumerate() {
            let x = i % self.width;
            let tilt = x as f64 / self.width.max(1) as f64;
            let z = ((sweep * 0.8 + tilt * 0.2) * MAX_RAW_DEPTH).min(f64::from(i16::MAX)) as i16;
            let y = (i / self.width) as i16;
            pixel[0..2].copy_from_slice(&(x as i16).to_le_bytes());
            pixel[2..4].copy_from_slice(&y.to_le_bytes());
            pixel[4..6].copy_from_slice(&z.to_le_bytes());
            pixel[6..8].copy_from_slice(&1000i16.to_le_bytes());
        }
    }
}

impl CameraDevice for SimulatedDevice {
    type Image = SimulatedImage;

    fn start_stream(&mut self) -> Result<(), SourceError> {
        self.streaming = true;
        self.next_due = Instant::now();
        Ok(())
    }

    fn stop_stream(&mut self) -> Result<(), SourceError> {
        self.streaming = false;
        Ok(())
    }

    fn get_image(&mut self, timeout: Duration) -> Result<SimulatedImage, SourceError> {
        if !self.streaming {
            return Err(SourceError::Sdk {
                call: "get_image",
                code: -1,
            });
        }
        self.wait_for_frame(timeout)?;
        self.next_due = Instant::now() + FRAME_INTERVAL;
        self.frame += 1;

        let len = self.width * self.height * STRIDE;
        let mut data = self.pool.pop().unwrap_or_default();
        data.resize(len, 0);
        self.fill(&mut data);
        Ok(SimulatedImage {
            data,
            width: self.width,
            height: self.height,
        })
    }

    fn requeue_buffer(&mut self, image: SimulatedImage) -> Result<(), SourceError> {
        self.pool.push(image.data);
        Ok(())
    }

    fn coordinate_scale(&mut self) -> Result<f64, SourceError> {
        Ok(COORDINATE_SCALE)
    }

    fn unblocker(&self) -> Option<Unblocker> {
        let wake = Arc::clone(&self.wake);
        Some(Arc::new(move || {
            *wake.interrupted.lock() = true;
            wake.cond.notify_all();
        }))
    }
}

/// A camera system with a fixed number of simulated devices.
#[derive(Debug, Clone)]
pub struct SimulatedSystem {
    device_count: usize,
    width: usize,
    height: usize,
}

impl SimulatedSystem {
    pub fn open() -> Result<Self, SourceError> {
        Ok(Self::with_devices(1, 640, 480))
    }

    pub fn with_devices(device_count: usize, width: usize, height: usize) -> Self {
        Self {
            device_count,
            width,
            height,
        }
    }
}

impl CameraSystem for SimulatedSystem {
    type Device = SimulatedDevice;
    type DeviceInfo = usize;

    fn update_devices(&mut self, _timeout: Duration) -> Result<(), SourceError> {
        Ok(())
    }

    fn devices(&mut self) -> Result<Vec<usize>, SourceError> {
        Ok((0..self.device_count).collect())
    }

    fn create_device(&mut self, info: &usize) -> Result<SimulatedDevice, SourceError> {
        if *info >= self.device_count {
            return Err(SourceError::DeviceUnavailable);
        }
        Ok(SimulatedDevice::new(self.width, self.height))
    }

    fn destroy_device(&mut self, _device: SimulatedDevice) -> Result<(), SourceError> {
        Ok(())
    }
}
