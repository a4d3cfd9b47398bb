use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use crate::ffi::*;

/// Kind of control the host shows for a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    Float,
    /// Momentary button; the host calls [`crate::TopInstance::pulse_pressed`].
    Pulse,
}

/// Result of appending a parameter to the host's registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
#[repr(i32)]
pub enum ParAppendResult {
    Success = OP_PAR_APPEND_SUCCESS,
    InvalidName = OP_PAR_APPEND_INVALID_NAME,
    InvalidSize = OP_PAR_APPEND_INVALID_SIZE,
    DuplicateName = OP_PAR_APPEND_DUPLICATE_NAME,
}

impl ParAppendResult {
    /// Decode a raw host result; unknown codes map to `InvalidName`.
    pub fn from_raw(raw: i32) -> Self {
        Self::from_i32(raw).unwrap_or(Self::InvalidName)
    }

    /// Turn anything but `Success` into an error naming the parameter.
    pub fn ok(self, name: &str) -> anyhow::Result<()> {
        match self {
            Self::Success => Ok(()),
            other => Err(anyhow::anyhow!("appending parameter {name:?} failed: {other:?}")),
        }
    }
}

/// Declaration of a single-valued numeric parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericParameter {
    pub name: String,
    pub label: String,
    pub kind: ParameterKind,
    pub default: f64,
    pub min_slider: f64,
    pub max_slider: f64,
    pub min_value: f64,
    pub max_value: f64,
    pub clamp_min: bool,
    pub clamp_max: bool,
}

impl NumericParameter {
    /// Unclamped float with a `0..1` slider.
    pub fn float(name: &str) -> Self {
        Self {
            name: name.to_string(),
            label: name.to_string(),
            kind: ParameterKind::Float,
            default: 0.0,
            min_slider: 0.0,
            max_slider: 1.0,
            min_value: 0.0,
            max_value: 1.0,
            clamp_min: false,
            clamp_max: false,
        }
    }

    pub fn pulse(name: &str) -> Self {
        Self {
            kind: ParameterKind::Pulse,
            ..Self::float(name)
        }
    }

    pub fn default_value(mut self, default: f64) -> Self {
        self.default = default;
        self
    }

    pub fn slider(mut self, min: f64, max: f64) -> Self {
        self.min_slider = min;
        self.max_slider = max;
        self
    }

    /// Hard range enforced on both ends; the slider follows it.
    pub fn clamped(mut self, min: f64, max: f64) -> Self {
        self.min_value = min;
        self.max_value = max;
        self.clamp_min = true;
        self.clamp_max = true;
        self.slider(min, max)
    }

    /// Apply this parameter's clamping to a value read from the host.
    pub fn clamp(&self, value: f64) -> f64 {
        let mut value = if value.is_nan() { self.default } else { value };
        if self.clamp_min {
            value = value.max(self.min_value);
        }
        if self.clamp_max {
            value = value.min(self.max_value);
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamped_range_applies_both_ends() {
        let near = NumericParameter::float("Near").clamped(0.0, 6000.0);
        assert_eq!(near.clamp(-5.0), 0.0);
        assert_eq!(near.clamp(7000.0), 6000.0);
        assert_eq!(near.clamp(1234.5), 1234.5);
        assert_eq!((near.min_slider, near.max_slider), (0.0, 6000.0));
    }

    #[test]
    fn unclamped_passes_through() {
        let speed = NumericParameter::float("Speed").slider(-10.0, 10.0);
        assert_eq!(speed.clamp(-25.0), -25.0);
        assert_eq!(speed.default_value(1.0).clamp(f64::NAN), 1.0);
    }

    #[test]
    fn append_results_decode() {
        assert_eq!(ParAppendResult::from_raw(0), ParAppendResult::Success);
        assert_eq!(ParAppendResult::from_raw(3), ParAppendResult::DuplicateName);
        assert_eq!(ParAppendResult::from_raw(99), ParAppendResult::InvalidName);
        assert!(ParAppendResult::DuplicateName.ok("Reset").is_err());
    }
}
