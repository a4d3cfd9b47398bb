//! Inputs from the host to your plugin

use std::collections::HashMap;
use std::ffi::{CStr, CString};

use crate::ffi::*;

/// Read access to the current parameter values of a node.
pub trait ParameterInputs {
    /// Current value of the named numeric parameter, `0.0` when unknown.
    fn par_double(&self, name: &str) -> f64;
}

/// Parameter reader backed by the host's `OP_Inputs`.
#[derive(Debug)]
pub struct HostInputs<'a> {
    raw: &'a OP_Inputs,
}

impl<'a> HostInputs<'a> {
    /// # Safety
    ///
    /// `raw` must come from the host and stay valid for `'a`.
    pub unsafe fn from_raw(raw: &'a OP_Inputs) -> Self {
        Self { raw }
    }
}

impl ParameterInputs for HostInputs<'_> {
    fn par_double(&self, name: &str) -> f64 {
        let Ok(name) = CString::new(name) else {
            return 0.0;
        };
        unsafe { (self.raw.getParDouble)(self.raw.context, name.as_ptr()) }
    }
}

/// In-process parameter values, for hosts embedding the plugin directly.
#[derive(Debug, Default, Clone)]
pub struct ParamValues {
    values: HashMap<String, f64>,
}

impl ParamValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_string(), value);
    }
}

impl ParameterInputs for ParamValues {
    fn par_double(&self, name: &str) -> f64 {
        self.values.get(name).copied().unwrap_or_default()
    }
}

/// Standard data the host provides when a node is created
#[derive(Debug, Clone, Default)]
pub struct NodeInfo {
    pub op_path: String,
    pub op_id: u32,
}

impl NodeInfo {
    /// # Safety
    ///
    /// `raw.opPath` must be null or a valid NUL-terminated string.
    pub unsafe fn from_raw(raw: &OP_NodeInfo) -> Self {
        let op_path = if raw.opPath.is_null() {
            String::new()
        } else {
            unsafe { CStr::from_ptr(raw.opPath) }
                .to_string_lossy()
                .into_owned()
        };
        Self {
            op_path,
            op_id: raw.opId,
        }
    }
}
