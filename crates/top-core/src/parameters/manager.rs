//! Registries that receive parameter declarations.

use std::ffi::CString;

use super::info::{NumericParameter, ParAppendResult, ParameterKind};
use crate::ffi::*;

/// Something that accepts parameter declarations during setup.
pub trait ParameterManager {
    fn append_float(&mut self, param: &NumericParameter) -> ParAppendResult;

    fn append_pulse(&mut self, param: &NumericParameter) -> ParAppendResult;

    /// Append according to [`NumericParameter::kind`].
    fn append(&mut self, param: &NumericParameter) -> ParAppendResult {
        match param.kind {
            ParameterKind::Float => self.append_float(param),
            ParameterKind::Pulse => self.append_pulse(param),
        }
    }
}

/// Forwards declarations to the host's `OP_ParameterManager`.
#[derive(Debug)]
pub struct HostParameterManager<'a> {
    raw: &'a OP_ParameterManager,
}

impl<'a> HostParameterManager<'a> {
    /// # Safety
    ///
    /// `raw` must come from the host and stay valid for `'a`.
    pub unsafe fn from_raw(raw: &'a OP_ParameterManager) -> Self {
        Self { raw }
    }

    fn call(
        &self,
        append: unsafe extern "C" fn(*mut std::ffi::c_void, *const OP_NumericParameter) -> i32,
        param: &NumericParameter,
    ) -> ParAppendResult {
        let (Ok(name), Ok(label)) = (
            CString::new(param.name.as_str()),
            CString::new(param.label.as_str()),
        ) else {
            return ParAppendResult::InvalidName;
        };
        let raw = OP_NumericParameter {
            name: name.as_ptr(),
            label: label.as_ptr(),
            defaultValue: param.default,
            minSlider: param.min_slider,
            maxSlider: param.max_slider,
            minValue: param.min_value,
            maxValue: param.max_value,
            clampMin: param.clamp_min,
            clampMax: param.clamp_max,
        };
        ParAppendResult::from_raw(unsafe { append(self.raw.context, &raw) })
    }
}

impl ParameterManager for HostParameterManager<'_> {
    fn append_float(&mut self, param: &NumericParameter) -> ParAppendResult {
        self.call(self.raw.appendFloat, param)
    }

    fn append_pulse(&mut self, param: &NumericParameter) -> ParAppendResult {
        self.call(self.raw.appendPulse, param)
    }
}

/// Records declarations in order, rejecting duplicate names.
#[derive(Debug, Default, Clone)]
pub struct ParameterList {
    params: Vec<NumericParameter>,
}

impl ParameterList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&NumericParameter> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NumericParameter> {
        self.params.iter()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    fn push(&mut self, param: &NumericParameter, kind: ParameterKind) -> ParAppendResult {
        if param.name.is_empty() {
            return ParAppendResult::InvalidName;
        }
        if self.get(&param.name).is_some() {
            return ParAppendResult::DuplicateName;
        }
        self.params.push(NumericParameter {
            kind,
            ..param.clone()
        });
        ParAppendResult::Success
    }
}

impl ParameterManager for ParameterList {
    fn append_float(&mut self, param: &NumericParameter) -> ParAppendResult {
        self.push(param, ParameterKind::Float)
    }

    fn append_pulse(&mut self, param: &NumericParameter) -> ParAppendResult {
        self.push(param, ParameterKind::Pulse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_rejects_duplicates() {
        let mut list = ParameterList::new();
        let reset = NumericParameter::pulse("Reset");
        assert_eq!(list.append(&reset), ParAppendResult::Success);
        assert_eq!(list.append(&reset), ParAppendResult::DuplicateName);
        assert_eq!(list.len(), 1);
        assert_eq!(list.get("Reset").map(|p| p.kind), Some(ParameterKind::Pulse));
    }

    #[test]
    fn host_manager_forwards_fields() {
        unsafe extern "C" fn append_float(
            ctx: *mut std::ffi::c_void,
            param: *const OP_NumericParameter,
        ) -> i32 {
            let seen = unsafe { &mut *(ctx as *mut Vec<(f64, f64, bool)>) };
            let param = unsafe { &*param };
            seen.push((param.minValue, param.maxValue, param.clampMax));
            OP_PAR_APPEND_SUCCESS
        }
        unsafe extern "C" fn append_pulse(
            _ctx: *mut std::ffi::c_void,
            _param: *const OP_NumericParameter,
        ) -> i32 {
            OP_PAR_APPEND_DUPLICATE_NAME
        }

        let mut seen: Vec<(f64, f64, bool)> = Vec::new();
        let raw = OP_ParameterManager {
            context: &mut seen as *mut _ as *mut std::ffi::c_void,
            appendFloat: append_float,
            appendPulse: append_pulse,
        };
        let mut manager = unsafe { HostParameterManager::from_raw(&raw) };
        let far = NumericParameter::float("Far").clamped(0.0, 6000.0);
        assert_eq!(manager.append(&far), ParAppendResult::Success);
        assert_eq!(
            manager.append(&NumericParameter::pulse("Reset")),
            ParAppendResult::DuplicateName
        );
        assert_eq!(seen, vec![(0.0, 6000.0, true)]);
    }
}
