//! Camera-backed frame source.
//!
//! [`CameraSystem`] and [`CameraDevice`] are the seams to a vendor SDK. A
//! [`HardwareSource`] opens the first device, streams from it and tears the
//! session down in reverse order: stop stream, destroy device, close system.
//! When no device can be opened the source stays [`DeviceState::Unavailable`]
//! and every acquire reports [`SourceError::DeviceUnavailable`].

use std::fmt::Debug;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::error::SourceError;
use crate::source::{FrameSource, RawFrame, Unblocker};

/// An open camera device.
pub trait CameraDevice: Send + 'static {
    type Image: RawFrame + Send;

    fn start_stream(&mut self) -> Result<(), SourceError>;
    fn stop_stream(&mut self) -> Result<(), SourceError>;

    /// Block for at most `timeout` waiting for the next image.
    fn get_image(&mut self, timeout: Duration) -> Result<Self::Image, SourceError>;

    /// Hand an image's buffer back to the device's pool.
    fn requeue_buffer(&mut self, image: Self::Image) -> Result<(), SourceError>;

    /// Multiplier from raw depth words to millimeters.
    fn coordinate_scale(&mut self) -> Result<f64, SourceError>;

    fn unblocker(&self) -> Option<Unblocker> {
        None
    }
}

/// An open SDK session. Dropping it closes the session.
pub trait CameraSystem: Send + 'static {
    type Device: CameraDevice;
    type DeviceInfo: Debug;

    /// Refresh the device list, waiting at most `timeout`.
    fn update_devices(&mut self, timeout: Duration) -> Result<(), SourceError>;

    fn devices(&mut self) -> Result<Vec<Self::DeviceInfo>, SourceError>;

    fn create_device(&mut self, info: &Self::DeviceInfo) -> Result<Self::Device, SourceError>;

    fn destroy_device(&mut self, device: Self::Device) -> Result<(), SourceError>;
}

/// Whether a [`HardwareSource`] has a streaming device.
#[derive(Debug)]
pub enum DeviceState<D> {
    Streaming { device: D, coordinate_scale: f64 },
    Unavailable,
}

/// Timeout for refreshing the device list when a source opens.
pub const DEVICE_UPDATE_TIMEOUT: Duration = Duration::from_millis(100);

/// A [`FrameSource`] streaming from the first device of a camera system.
pub struct HardwareSource<Sys: CameraSystem> {
    system: Option<Sys>,
    device: DeviceState<Sys::Device>,
    unblocker: Option<Unblocker>,
}

impl<Sys: CameraSystem> HardwareSource<Sys> {
    /// Open the first device of `system` and start streaming.
    ///
    /// Never fails: any error is logged and leaves the source unavailable.
    pub fn open(mut system: Sys) -> Self {
        let device = match Self::start_first_device(&mut system) {
            Ok(Some((device, coordinate_scale))) => DeviceState::Streaming {
                device,
                coordinate_scale,
            },
            Ok(None) => {
                warn!("no camera device found");
                DeviceState::Unavailable
            }
            Err(err) => {
                error!(error = %err, "failed to open camera device");
                DeviceState::Unavailable
            }
        };
        let unblocker = match &device {
            DeviceState::Streaming { device, .. } => device.unblocker(),
            DeviceState::Unavailable => None,
        };
        Self {
            system: Some(system),
            device,
            unblocker,
        }
    }

    /// A source without any camera system.
    pub fn unavailable() -> Self {
        Self {
            system: None,
            device: DeviceState::Unavailable,
            unblocker: None,
        }
    }

    fn start_first_device(system: &mut Sys) -> Result<Option<(Sys::Device, f64)>, SourceError> {
        system.update_devices(DEVICE_UPDATE_TIMEOUT)?;
        let devices = system.devices()?;
        info!(count = devices.len(), "camera devices found");
        let Some(first) = devices.first() else {
            return Ok(None);
        };
        let mut device = system.create_device(first)?;
        let started = device
            .coordinate_scale()
            .and_then(|scale| device.start_stream().map(|()| scale));
        match started {
            Ok(scale) => {
                info!(device = ?first, coordinate_scale = scale, "camera stream started");
                Ok(Some((device, scale)))
            }
            Err(err) => {
                if let Err(destroy_err) = system.destroy_device(device) {
                    warn!(error = %destroy_err, "failed to destroy camera device");
                }
                Err(err)
            }
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self.device, DeviceState::Streaming { .. })
    }

    /// Scale read from the device when the stream started.
    pub fn coordinate_scale(&self) -> Option<f64> {
        match &self.device {
            DeviceState::Streaming { coordinate_scale, .. } => Some(*coordinate_scale),
            DeviceState::Unavailable => None,
        }
    }

    /// Stop the stream, destroy the device and close the system.
    pub fn close(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        let state = std::mem::replace(&mut self.device, DeviceState::Unavailable);
        if let DeviceState::Streaming { mut device, .. } = state {
            match device.stop_stream() {
                Ok(()) => info!("camera stream stopped"),
                Err(err) => warn!(error = %err, "failed to stop camera stream"),
            }
            match self.system.as_mut().map(|system| system.destroy_device(device)) {
                Some(Ok(())) => info!("camera device destroyed"),
                Some(Err(err)) => warn!(error = %err, "failed to destroy camera device"),
                None => {}
            }
        }
        if let Some(system) = self.system.take() {
            drop(system);
            info!("camera system closed");
        }
    }
}

impl<Sys: CameraSystem> Drop for HardwareSource<Sys> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<Sys: CameraSystem> FrameSource for HardwareSource<Sys> {
    type Frame = <Sys::Device as CameraDevice>::Image;

    fn acquire(&mut self, timeout: Duration) -> Result<Self::Frame, SourceError> {
        match &mut self.device {
            DeviceState::Streaming { device, .. } => device.get_image(timeout),
            DeviceState::Unavailable => Err(SourceError::DeviceUnavailable),
        }
    }

    fn release(&mut self, frame: Self::Frame) {
        match &mut self.device {
            DeviceState::Streaming { device, .. } => {
                if let Err(err) = device.requeue_buffer(frame) {
                    warn!(error = %err, "failed to requeue camera buffer");
                }
            }
            DeviceState::Unavailable => debug!("frame released after the device went away"),
        }
    }

    fn unblocker(&self) -> Option<Unblocker> {
        self.unblocker.clone()
    }
}
