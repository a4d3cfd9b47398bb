//! LUCID Helios cameras through the ArenaC SDK.
//!
//! Thin wrappers over the C API: every call returns an `AC_ERROR` code that
//! is mapped to [`SourceError`]. Handles are opaque pointers owned by the
//! SDK; the wrapper types release them in reverse order of creation.

use std::ffi::{c_char, c_void, CStr};
use std::time::Duration;

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use top_frames::{CameraDevice, CameraSystem, RawFrame, SourceError};
use tracing::{debug, warn};

type AcSystem = *mut c_void;
type AcDevice = *mut c_void;
type AcBuffer = *mut c_void;
type AcNodeMap = *mut c_void;

/// Node holding the raw-to-millimeter factor of the depth channel.
const COORDINATE_SCALE_NODE: &CStr = c"Scan3dCoordinateScale";

// ---------------------------------------------------------------------------
// Raw bindings
// ---------------------------------------------------------------------------

#[link(name = "arenac")]
extern "C" {
    fn acOpenSystem(system: *mut AcSystem) -> i32;
    fn acCloseSystem(system: AcSystem) -> i32;
    fn acSystemUpdateDevices(system: AcSystem, timeout_ms: u64) -> i32;
    fn acSystemGetNumDevices(system: AcSystem, count: *mut usize) -> i32;
    fn acSystemCreateDevice(system: AcSystem, index: usize, device: *mut AcDevice) -> i32;
    fn acSystemDestroyDevice(system: AcSystem, device: AcDevice) -> i32;
    fn acDeviceStartStream(device: AcDevice) -> i32;
    fn acDeviceStopStream(device: AcDevice) -> i32;
    fn acDeviceGetBuffer(device: AcDevice, timeout_ms: u64, buffer: *mut AcBuffer) -> i32;
    fn acDeviceRequeueBuffer(device: AcDevice, buffer: AcBuffer) -> i32;
    fn acDeviceGetNodeMap(device: AcDevice, node_map: *mut AcNodeMap) -> i32;
    fn acNodeMapGetFloatValue(node_map: AcNodeMap, name: *const c_char, value: *mut f64) -> i32;
    fn acBufferGetSizeFilled(buffer: AcBuffer, size: *mut usize) -> i32;
    fn acImageGetData(buffer: AcBuffer, data: *mut *mut u8) -> i32;
    fn acImageGetBitsPerPixel(buffer: AcBuffer, bits: *mut usize) -> i32;
    fn acImageGetWidth(buffer: AcBuffer, width: *mut usize) -> i32;
    fn acImageGetHeight(buffer: AcBuffer, height: *mut usize) -> i32;
}

/// `AC_ERROR` codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
#[repr(i32)]
enum AcError {
    Success = 0,
    Error = -1001,
    NotInitialized = -1002,
    NotImplemented = -1003,
    ResourceInUse = -1004,
    AccessDenied = -1005,
    InvalidHandle = -1006,
    InvalidId = -1007,
    NoData = -1008,
    InvalidParameter = -1009,
    Io = -1010,
    Timeout = -1011,
    Abort = -1012,
    InvalidBuffer = -1013,
    NotAvailable = -1014,
}

/// Map an SDK return code, naming the call for the log.
fn check(call: &'static str, code: i32, timeout: Duration) -> Result<(), SourceError> {
    match AcError::from_i32(code) {
        Some(AcError::Success) => Ok(()),
        Some(AcError::Timeout) => Err(SourceError::Timeout(timeout)),
        Some(AcError::Abort) => Err(SourceError::Interrupted),
        Some(AcError::NotAvailable) => Err(SourceError::DeviceUnavailable),
        _ => Err(SourceError::Sdk { call, code }),
    }
}

fn call(name: &'static str, code: i32) -> Result<(), SourceError> {
    check(name, code, Duration::ZERO)
}

/// Status of handing back a buffer whose image could not be read.
fn requeue_unreadable(code: i32) -> Result<(), SourceError> {
    let result = call("acDeviceRequeueBuffer", code);
    if let Err(err) = &result {
        warn!(error = %err, "failed to requeue unreadable camera buffer");
    }
    result
}

// ---------------------------------------------------------------------------
// Image
// ---------------------------------------------------------------------------

/// A filled SDK buffer. Must go back through [`CameraDevice::requeue_buffer`].
pub struct ArenaImage {
    buffer: AcBuffer,
    data: *const u8,
    len: usize,
    bits_per_pixel: usize,
    width: usize,
    height: usize,
}

// SAFETY: the buffer belongs to the device's stream pool and is only touched
// by the thread holding this value until it is requeued.
unsafe impl Send for ArenaImage {}

impl ArenaImage {
    unsafe fn from_buffer(buffer: AcBuffer) -> Result<Self, SourceError> {
        let mut data: *mut u8 = std::ptr::null_mut();
        let (mut len, mut bits_per_pixel, mut width, mut height) = (0usize, 0usize, 0usize, 0usize);
        unsafe {
            call("acImageGetData", acImageGetData(buffer, &mut data))?;
            call("acBufferGetSizeFilled", acBufferGetSizeFilled(buffer, &mut len))?;
            call("acImageGetBitsPerPixel", acImageGetBitsPerPixel(buffer, &mut bits_per_pixel))?;
            call("acImageGetWidth", acImageGetWidth(buffer, &mut width))?;
            call("acImageGetHeight", acImageGetHeight(buffer, &mut height))?;
        }
        if data.is_null() {
            len = 0;
        }
        Ok(Self {
            buffer,
            data,
            len,
            bits_per_pixel,
            width,
            height,
        })
    }
}

impl RawFrame for ArenaImage {
    fn data(&self) -> &[u8] {
        if self.len == 0 {
            return &[];
        }
        // SAFETY: the SDK keeps `len` bytes at `data` alive until the buffer
        // is requeued, which consumes `self`.
        unsafe { std::slice::from_raw_parts(self.data, self.len) }
    }

    fn bits_per_pixel(&self) -> usize {
        self.bits_per_pixel
    }

    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }
}

// ---------------------------------------------------------------------------
// Device
// ---------------------------------------------------------------------------

pub struct ArenaDevice {
    handle: AcDevice,
}

// SAFETY: a device handle is used by one thread at a time: the plugin while
// opening and closing, the worker while streaming.
unsafe impl Send for ArenaDevice {}

impl CameraDevice for ArenaDevice {
    type Image = ArenaImage;

    fn start_stream(&mut self) -> Result<(), SourceError> {
        call("acDeviceStartStream", unsafe { acDeviceStartStream(self.handle) })
    }

    fn stop_stream(&mut self) -> Result<(), SourceError> {
        call("acDeviceStopStream", unsafe { acDeviceStopStream(self.handle) })
    }

    fn get_image(&mut self, timeout: Duration) -> Result<ArenaImage, SourceError> {
        let mut buffer: AcBuffer = std::ptr::null_mut();
        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        check("acDeviceGetBuffer", unsafe { acDeviceGetBuffer(self.handle, timeout_ms, &mut buffer) }, timeout)?;
        match unsafe { ArenaImage::from_buffer(buffer) } {
            Ok(image) => Ok(image),
            Err(err) => {
                // Logged inside; the read error is the one reported.
                requeue_unreadable(unsafe { acDeviceRequeueBuffer(self.handle, buffer) }).ok();
                Err(err)
            }
        }
    }

    fn requeue_buffer(&mut self, image: ArenaImage) -> Result<(), SourceError> {
        call("acDeviceRequeueBuffer", unsafe { acDeviceRequeueBuffer(self.handle, image.buffer) })
    }

    fn coordinate_scale(&mut self) -> Result<f64, SourceError> {
        let mut node_map: AcNodeMap = std::ptr::null_mut();
        let mut scale = 0.0f64;
        unsafe {
            call("acDeviceGetNodeMap", acDeviceGetNodeMap(self.handle, &mut node_map))?;
            call(
                "acNodeMapGetFloatValue",
                acNodeMapGetFloatValue(node_map, COORDINATE_SCALE_NODE.as_ptr(), &mut scale),
            )?;
        }
        debug!(scale, "read Scan3dCoordinateScale");
        Ok(scale)
    }
}

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

/// An open ArenaC session. Closed on drop.
pub struct ArenaSystem {
    handle: AcSystem,
}

// SAFETY: the session handle is only used from the thread that owns this value.
unsafe impl Send for ArenaSystem {}

impl ArenaSystem {
    pub fn open() -> Result<Self, SourceError> {
        let mut handle: AcSystem = std::ptr::null_mut();
        call("acOpenSystem", unsafe { acOpenSystem(&mut handle) })?;
        Ok(Self { handle })
    }
}

impl CameraSystem for ArenaSystem {
    type Device = ArenaDevice;
    type DeviceInfo = usize;

    fn update_devices(&mut self, timeout: Duration) -> Result<(), SourceError> {
        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        check("acSystemUpdateDevices", unsafe { acSystemUpdateDevices(self.handle, timeout_ms) }, timeout)
    }

    fn devices(&mut self) -> Result<Vec<usize>, SourceError> {
        let mut count = 0usize;
        call("acSystemGetNumDevices", unsafe { acSystemGetNumDevices(self.handle, &mut count) })?;
        Ok((0..count).collect())
    }

    fn create_device(&mut self, index: &usize) -> Result<ArenaDevice, SourceError> {
        let mut handle: AcDevice = std::ptr::null_mut();
        call("acSystemCreateDevice", unsafe { acSystemCreateDevice(self.handle, *index, &mut handle) })?;
        Ok(ArenaDevice { handle })
    }

    fn destroy_device(&mut self, device: ArenaDevice) -> Result<(), SourceError> {
        call("acSystemDestroyDevice", unsafe { acSystemDestroyDevice(self.handle, device.handle) })
    }
}

impl Drop for ArenaSystem {
    fn drop(&mut self) {
        if let Err(err) = call("acCloseSystem", unsafe { acCloseSystem(self.handle) }) {
            warn!(error = %err, "failed to close ArenaC system");
        }
    }
}
