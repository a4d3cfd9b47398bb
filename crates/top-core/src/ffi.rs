//! C-repr structs and constants for the TOP CPU-memory plugin ABI.
//!
//! The host loads the plugin library, calls `FillTOPPluginInfo` once, then
//! `CreateTOPInstance` per node. Every other call receives the opaque instance
//! pointer returned from `CreateTOPInstance`. These definitions mirror the
//! host SDK headers field for field; the safe wrappers live in
//! [`crate::inputs`], [`crate::outputs`] and [`crate::parameters`].

#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![allow(dead_code)]

use std::ffi::{c_char, c_void};

// =====================================================================
// Versions and limits
// =====================================================================

/// Must always be written into [`TOP_PluginInfo::apiVersion`].
pub const TOP_CPLUSPLUS_API_VERSION: i32 = 11;

/// Number of CPU memory slots the host offers per tick.
pub const TOP_NUM_CPU_PIXEL_DATAS: usize = 3;

/// Written into `newCPUPixelDataLocation` when nothing new was filled.
pub const TOP_NO_NEW_CPU_PIXEL_DATA: i32 = -1;

pub const OP_TYPE_LEN: usize = 32;
pub const OP_LABEL_LEN: usize = 64;
pub const OP_ICON_LEN: usize = 4;
pub const OP_AUTHOR_LEN: usize = 64;
pub const OP_CHAN_NAME_LEN: usize = 64;

// =====================================================================
// Execute modes
// =====================================================================
pub const TOP_EXECUTE_MODE_OPENGL_FBO: i32 = 0;
pub const TOP_EXECUTE_MODE_CPU_MEM_READ_WRITE: i32 = 1;
pub const TOP_EXECUTE_MODE_CPU_MEM_WRITE_ONLY: i32 = 2;
pub const TOP_EXECUTE_MODE_CUDA: i32 = 3;

// =====================================================================
// CPU memory pixel types
// =====================================================================
pub const OP_CPU_MEM_PIXEL_TYPE_BGRA8_FIXED: i32 = 0;
pub const OP_CPU_MEM_PIXEL_TYPE_RGBA8_FIXED: i32 = 1;
pub const OP_CPU_MEM_PIXEL_TYPE_RGBA32_FLOAT: i32 = 2;

// =====================================================================
// Parameter append results
// =====================================================================
pub const OP_PAR_APPEND_SUCCESS: i32 = 0;
pub const OP_PAR_APPEND_INVALID_NAME: i32 = 1;
pub const OP_PAR_APPEND_INVALID_SIZE: i32 = 2;
pub const OP_PAR_APPEND_DUPLICATE_NAME: i32 = 3;

// =====================================================================
// C-repr structs matching the host SDK
// =====================================================================

/// Filled once by `FillTOPPluginInfo`.
#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct TOP_PluginInfo {
    pub apiVersion: i32,
    pub executeMode: i32,
    pub opType: [c_char; OP_TYPE_LEN],
    pub opLabel: [c_char; OP_LABEL_LEN],
    pub opIcon: [c_char; OP_ICON_LEN],
    pub authorName: [c_char; OP_AUTHOR_LEN],
    pub authorEmail: [c_char; OP_AUTHOR_LEN],
    pub minInputs: i32,
    pub maxInputs: i32,
}

/// Node information passed to `CreateTOPInstance`.
#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct OP_NodeInfo {
    pub opPath: *const c_char,
    pub opId: u32,
}

/// General behaviour flags queried before each cook.
#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct TOP_GeneralInfo {
    pub cookEveryFrame: bool,
    pub memPixelType: i32,
}

/// Output resolution a plugin may request.
#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct TOP_OutputFormat {
    pub width: i32,
    pub height: i32,
}

/// Per-tick output descriptor. `cpuPixelData` slots each hold
/// `width * height * 4` floats owned by the host.
#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct TOP_OutputFormatSpecs {
    pub width: i32,
    pub height: i32,
    pub cpuPixelData: [*mut c_void; TOP_NUM_CPU_PIXEL_DATAS],
    pub newCPUPixelDataLocation: i32,
}

/// Host parameter reader.
#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct OP_Inputs {
    pub context: *mut c_void,
    pub getParDouble: unsafe extern "C" fn(context: *mut c_void, name: *const c_char) -> f64,
}

/// Numeric (float or pulse) parameter declaration.
#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct OP_NumericParameter {
    pub name: *const c_char,
    pub label: *const c_char,
    pub defaultValue: f64,
    pub minSlider: f64,
    pub maxSlider: f64,
    pub minValue: f64,
    pub maxValue: f64,
    pub clampMin: bool,
    pub clampMax: bool,
}

/// Host parameter registry.
#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct OP_ParameterManager {
    pub context: *mut c_void,
    pub appendFloat:
        unsafe extern "C" fn(context: *mut c_void, param: *const OP_NumericParameter) -> i32,
    pub appendPulse:
        unsafe extern "C" fn(context: *mut c_void, param: *const OP_NumericParameter) -> i32,
}

/// One info CHOP channel.
#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct OP_InfoCHOPChan {
    pub name: [c_char; OP_CHAN_NAME_LEN],
    pub value: f32,
}

/// Info DAT table dimensions.
#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct OP_InfoDATSize {
    pub rows: i32,
    pub cols: i32,
    pub byColumn: bool,
}

/// String buffer struct used for host-provided string buffers.
#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct StringBufferStruct {
    pub address: *mut c_char,
    pub maxToWrite: u32,
}

/// One row (or column) of info DAT entries.
#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct OP_InfoDATEntries {
    pub values: *mut StringBufferStruct,
    pub numValues: i32,
}

// =====================================================================
// Utility
// =====================================================================

/// Copy a Rust string into a host-provided buffer, null-terminating it.
///
/// Interior NUL bytes end the string early.
///
/// # Safety
///
/// `address` must be a valid pointer to a buffer of at least `max_to_write` bytes.
pub unsafe fn copy_str_to_host_buffer(address: *mut u8, max_to_write: usize, string: &str) {
    if max_to_write == 0 || address.is_null() {
        return;
    }

    let bytes = string.as_bytes();
    let bytes = match bytes.iter().position(|&b| b == 0) {
        Some(nul) => &bytes[..nul],
        None => bytes,
    };
    let to_copy = bytes.len().min(max_to_write - 1);
    let dest = unsafe { std::slice::from_raw_parts_mut(address, to_copy + 1) };

    dest[..to_copy].copy_from_slice(&bytes[..to_copy]);
    dest[to_copy] = 0;
}

/// Copy a Rust string into a fixed-size `c_char` array, null-terminating it.
pub fn copy_str_to_array<const N: usize>(dest: &mut [c_char; N], string: &str) {
    // SAFETY: the array is exactly N bytes long.
    unsafe { copy_str_to_host_buffer(dest.as_mut_ptr().cast(), N, string) }
}
