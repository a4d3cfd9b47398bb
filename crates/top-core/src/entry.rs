//! Generic C-ABI trampolines behind [`crate::plugin_main!`].
//!
//! Each function validates its pointers, converts to the safe wrappers and
//! calls into the [`TopInstance`]. Panics are caught and logged so they never
//! unwind into the host.

use std::ffi::{c_char, c_void, CStr};
use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::{debug, error, warn};

use crate::ffi::*;
use crate::handler::TopInstance;
use crate::inputs::{HostInputs, NodeInfo};
use crate::outputs::OutputFormatSpecs;
use crate::parameters::HostParameterManager;

fn guarded<R>(what: &str, fallback: R, f: impl FnOnce() -> R) -> R {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_default();
            error!(what, message = %message, "plugin call panicked");
            fallback
        }
    }
}

/// # Safety
///
/// `instance` must be null or a pointer returned by [`create_instance::<T>`]
/// that has not been destroyed.
unsafe fn instance_mut<'a, T: TopInstance>(instance: *mut c_void) -> Option<&'a mut T> {
    unsafe { instance.cast::<T>().as_mut() }
}

/// # Safety
///
/// `info` must be null or valid for writes.
pub unsafe fn fill_plugin_info<T: TopInstance>(info: *mut TOP_PluginInfo) {
    let Some(info) = (unsafe { info.as_mut() }) else {
        return;
    };
    guarded("FillTOPPluginInfo", (), || {
        let plugin = T::plugin_info();
        if !plugin.has_valid_op_type() {
            warn!(op_type = plugin.op_type, "host expects an uppercase letter then lowercase letters or digits");
        }
        plugin.write_to(info)
    });
}

/// # Safety
///
/// `node` must be null or point to a valid `OP_NodeInfo`.
pub unsafe fn create_instance<T: TopInstance>(node: *const OP_NodeInfo) -> *mut c_void {
    crate::log::init_default_subscriber();
    let node = unsafe { node.as_ref() }
        .map(|raw| unsafe { NodeInfo::from_raw(raw) })
        .unwrap_or_default();
    guarded("CreateTOPInstance", std::ptr::null_mut(), || {
        debug!(op_path = %node.op_path, op_type = T::plugin_info().op_type, "creating instance");
        Box::into_raw(Box::new(T::new(&node))).cast()
    })
}

/// # Safety
///
/// `instance` must be null or a pointer returned by [`create_instance::<T>`];
/// it must not be used afterwards.
pub unsafe fn destroy_instance<T: TopInstance>(instance: *mut c_void) {
    if instance.is_null() {
        return;
    }
    let instance = unsafe { Box::from_raw(instance.cast::<T>()) };
    guarded("DestroyTOPInstance", (), move || drop(instance));
}

/// # Safety
///
/// `instance` as for [`destroy_instance`]; `specs` and `inputs` must be valid
/// host structs for the duration of the call.
pub unsafe fn execute<T: TopInstance>(
    instance: *mut c_void,
    specs: *mut TOP_OutputFormatSpecs,
    inputs: *const OP_Inputs,
) {
    let (Some(instance), Some(raw_specs), Some(inputs)) = (
        unsafe { instance_mut::<T>(instance) },
        unsafe { specs.as_mut() },
        unsafe { inputs.as_ref() },
    ) else {
        return;
    };
    let location = guarded("execute", TOP_NO_NEW_CPU_PIXEL_DATA, || {
        let mut output = unsafe { OutputFormatSpecs::from_raw(raw_specs) };
        let inputs = unsafe { HostInputs::from_raw(inputs) };
        instance.execute(&mut output, &inputs);
        output.location_code()
    });
    raw_specs.newCPUPixelDataLocation = location;
}

/// # Safety
///
/// `instance` as for [`destroy_instance`]; `ginfo` must be valid for writes.
pub unsafe fn general_info<T: TopInstance>(instance: *mut c_void, ginfo: *mut TOP_GeneralInfo) {
    let (Some(instance), Some(ginfo)) = (unsafe { instance_mut::<T>(instance) }, unsafe {
        ginfo.as_mut()
    }) else {
        return;
    };
    guarded("getGeneralInfo", (), || instance.general_info().write_to(ginfo));
}

/// Returns `true` when the plugin overrode the node's resolution.
///
/// # Safety
///
/// `instance` as for [`destroy_instance`]; `format` must be valid for writes.
pub unsafe fn output_format<T: TopInstance>(
    instance: *mut c_void,
    format: *mut TOP_OutputFormat,
) -> bool {
    let (Some(instance), Some(format)) = (unsafe { instance_mut::<T>(instance) }, unsafe {
        format.as_mut()
    }) else {
        return false;
    };
    guarded("getOutputFormat", false, || match instance.output_format() {
        Some((width, height)) => {
            format.width = width as i32;
            format.height = height as i32;
            true
        }
        None => false,
    })
}

/// # Safety
///
/// `manager` must be null or a valid host parameter manager.
pub unsafe fn setup_parameters<T: TopInstance>(manager: *const OP_ParameterManager) {
    let Some(manager) = (unsafe { manager.as_ref() }) else {
        return;
    };
    guarded("setupParameters", (), || {
        let mut manager = unsafe { HostParameterManager::from_raw(manager) };
        if let Err(e) = T::setup_parameters(&mut manager) {
            error!("setupParameters failed: {e:#}");
        }
    });
}

/// # Safety
///
/// `instance` as for [`destroy_instance`]; `name` must be null or a valid
/// NUL-terminated string.
pub unsafe fn pulse_pressed<T: TopInstance>(instance: *mut c_void, name: *const c_char) {
    let Some(instance) = (unsafe { instance_mut::<T>(instance) }) else {
        return;
    };
    if name.is_null() {
        return;
    }
    let name = unsafe { CStr::from_ptr(name) }.to_string_lossy();
    guarded("pulsePressed", (), || instance.pulse_pressed(&name));
}

/// # Safety
///
/// `instance` as for [`destroy_instance`].
pub unsafe fn num_info_chop_chans<T: TopInstance>(instance: *mut c_void) -> i32 {
    let Some(instance) = (unsafe { instance_mut::<T>(instance) }) else {
        return 0;
    };
    guarded("getNumInfoCHOPChans", 0, || instance.info_channels().len() as i32)
}

/// # Safety
///
/// `instance` as for [`destroy_instance`]; `chan` must be valid for writes.
pub unsafe fn info_chop_chan<T: TopInstance>(
    instance: *mut c_void,
    index: i32,
    chan: *mut OP_InfoCHOPChan,
) {
    let (Some(instance), Some(chan)) = (unsafe { instance_mut::<T>(instance) }, unsafe {
        chan.as_mut()
    }) else {
        return;
    };
    guarded("getInfoCHOPChan", (), || {
        let channels = instance.info_channels();
        if let Some(channel) = usize::try_from(index).ok().and_then(|i| channels.get(i)) {
            copy_str_to_array(&mut chan.name, channel.name);
            chan.value = channel.value;
        }
    });
}

/// # Safety
///
/// `instance` as for [`destroy_instance`]; `size` must be valid for writes.
pub unsafe fn info_dat_size<T: TopInstance>(instance: *mut c_void, size: *mut OP_InfoDATSize) -> bool {
    let (Some(instance), Some(size)) = (unsafe { instance_mut::<T>(instance) }, unsafe {
        size.as_mut()
    }) else {
        return false;
    };
    guarded("getInfoDATSize", false, || {
        let table = instance.info_table();
        size.rows = table.num_rows() as i32;
        size.cols = table.num_cols() as i32;
        size.byColumn = false;
        true
    })
}

/// # Safety
///
/// `instance` as for [`destroy_instance`]; `entries.values` must point to
/// `entries.numValues` valid string buffers.
pub unsafe fn info_dat_entries<T: TopInstance>(
    instance: *mut c_void,
    index: i32,
    n_entries: i32,
    entries: *mut OP_InfoDATEntries,
) {
    let (Some(instance), Some(entries)) = (unsafe { instance_mut::<T>(instance) }, unsafe {
        entries.as_mut()
    }) else {
        return;
    };
    if entries.values.is_null() {
        return;
    }
    let count = n_entries.min(entries.numValues).max(0) as usize;
    let buffers = unsafe { std::slice::from_raw_parts_mut(entries.values, count) };
    guarded("getInfoDATEntries", (), || {
        let table = instance.info_table();
        let Some(row) = usize::try_from(index).ok().and_then(|i| table.row(i)) else {
            return;
        };
        for (buffer, value) in buffers.iter().zip(row) {
            unsafe {
                copy_str_to_host_buffer(buffer.address.cast(), buffer.maxToWrite as usize, value)
            };
        }
    });
}

/// Export the host entry points for a [`TopInstance`] type.
///
/// ```rust,ignore
/// top_core::plugin_main!(MyTop);
/// ```
#[macro_export]
macro_rules! plugin_main {
    ($instance:ty) => {
        #[no_mangle]
        pub unsafe extern "C" fn FillTOPPluginInfo(info: *mut $crate::ffi::TOP_PluginInfo) {
            unsafe { $crate::entry::fill_plugin_info::<$instance>(info) }
        }

        #[no_mangle]
        pub unsafe extern "C" fn CreateTOPInstance(
            node: *const $crate::ffi::OP_NodeInfo,
        ) -> *mut ::std::ffi::c_void {
            unsafe { $crate::entry::create_instance::<$instance>(node) }
        }

        #[no_mangle]
        pub unsafe extern "C" fn DestroyTOPInstance(instance: *mut ::std::ffi::c_void) {
            unsafe { $crate::entry::destroy_instance::<$instance>(instance) }
        }

        #[no_mangle]
        pub unsafe extern "C" fn ExecuteTOPInstance(
            instance: *mut ::std::ffi::c_void,
            specs: *mut $crate::ffi::TOP_OutputFormatSpecs,
            inputs: *const $crate::ffi::OP_Inputs,
        ) {
            unsafe { $crate::entry::execute::<$instance>(instance, specs, inputs) }
        }

        #[no_mangle]
        pub unsafe extern "C" fn GetGeneralInfoTOP(
            instance: *mut ::std::ffi::c_void,
            ginfo: *mut $crate::ffi::TOP_GeneralInfo,
        ) {
            unsafe { $crate::entry::general_info::<$instance>(instance, ginfo) }
        }

        #[no_mangle]
        pub unsafe extern "C" fn GetOutputFormatTOP(
            instance: *mut ::std::ffi::c_void,
            format: *mut $crate::ffi::TOP_OutputFormat,
        ) -> bool {
            unsafe { $crate::entry::output_format::<$instance>(instance, format) }
        }

        #[no_mangle]
        pub unsafe extern "C" fn SetupParametersTOP(
            manager: *const $crate::ffi::OP_ParameterManager,
        ) {
            unsafe { $crate::entry::setup_parameters::<$instance>(manager) }
        }

        #[no_mangle]
        pub unsafe extern "C" fn PulsePressedTOP(
            instance: *mut ::std::ffi::c_void,
            name: *const ::std::ffi::c_char,
        ) {
            unsafe { $crate::entry::pulse_pressed::<$instance>(instance, name) }
        }

        #[no_mangle]
        pub unsafe extern "C" fn GetNumInfoCHOPChansTOP(instance: *mut ::std::ffi::c_void) -> i32 {
            unsafe { $crate::entry::num_info_chop_chans::<$instance>(instance) }
        }

        #[no_mangle]
        pub unsafe extern "C" fn GetInfoCHOPChanTOP(
            instance: *mut ::std::ffi::c_void,
            index: i32,
            chan: *mut $crate::ffi::OP_InfoCHOPChan,
        ) {
            unsafe { $crate::entry::info_chop_chan::<$instance>(instance, index, chan) }
        }

        #[no_mangle]
        pub unsafe extern "C" fn GetInfoDATSizeTOP(
            instance: *mut ::std::ffi::c_void,
            size: *mut $crate::ffi::OP_InfoDATSize,
        ) -> bool {
            unsafe { $crate::entry::info_dat_size::<$instance>(instance, size) }
        }

        #[no_mangle]
        pub unsafe extern "C" fn GetInfoDATEntriesTOP(
            instance: *mut ::std::ffi::c_void,
            index: i32,
            n_entries: i32,
            entries: *mut $crate::ffi::OP_InfoDATEntries,
        ) {
            unsafe { $crate::entry::info_dat_entries::<$instance>(instance, index, n_entries, entries) }
        }
    };
}
