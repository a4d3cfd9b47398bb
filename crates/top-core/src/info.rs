//! Plugin identity and per-cook capability flags.

use crate::ffi::*;

/// How the host drives the plugin's output memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecuteMode {
    OpenGlFbo,
    CpuMemReadWrite,
    CpuMemWriteOnly,
    Cuda,
}

impl ExecuteMode {
    pub fn raw(self) -> i32 {
        match self {
            Self::OpenGlFbo => TOP_EXECUTE_MODE_OPENGL_FBO,
            Self::CpuMemReadWrite => TOP_EXECUTE_MODE_CPU_MEM_READ_WRITE,
            Self::CpuMemWriteOnly => TOP_EXECUTE_MODE_CPU_MEM_WRITE_ONLY,
            Self::Cuda => TOP_EXECUTE_MODE_CUDA,
        }
    }
}

/// Pixel layout of the CPU memory slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuMemPixelType {
    Bgra8Fixed,
    Rgba8Fixed,
    Rgba32Float,
}

impl CpuMemPixelType {
    pub fn raw(self) -> i32 {
        match self {
            Self::Bgra8Fixed => OP_CPU_MEM_PIXEL_TYPE_BGRA8_FIXED,
            Self::Rgba8Fixed => OP_CPU_MEM_PIXEL_TYPE_RGBA8_FIXED,
            Self::Rgba32Float => OP_CPU_MEM_PIXEL_TYPE_RGBA32_FLOAT,
        }
    }
}

/// Static description of a plugin, reported once at load time.
///
/// `op_type` must start with a capital A-Z followed by lowercase letters or
/// digits; `op_icon` is shown as a three letter badge on the node.
#[derive(Debug, Clone)]
pub struct PluginInfo {
    pub op_type: &'static str,
    pub op_label: &'static str,
    pub op_icon: &'static str,
    pub author_name: &'static str,
    pub author_email: &'static str,
    pub min_inputs: i32,
    pub max_inputs: i32,
    pub execute_mode: ExecuteMode,
}

impl PluginInfo {
    /// Whether `op_type` satisfies the host's naming rule.
    pub fn has_valid_op_type(&self) -> bool {
        let mut chars = self.op_type.chars();
        chars.next().is_some_and(|c| c.is_ascii_uppercase())
            && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
    }

    pub fn write_to(&self, raw: &mut TOP_PluginInfo) {
        raw.apiVersion = TOP_CPLUSPLUS_API_VERSION;
        raw.executeMode = self.execute_mode.raw();
        copy_str_to_array(&mut raw.opType, self.op_type);
        copy_str_to_array(&mut raw.opLabel, self.op_label);
        copy_str_to_array(&mut raw.opIcon, self.op_icon);
        copy_str_to_array(&mut raw.authorName, self.author_name);
        copy_str_to_array(&mut raw.authorEmail, self.author_email);
        raw.minInputs = self.min_inputs;
        raw.maxInputs = self.max_inputs;
    }
}

/// Answer to the host's per-cook general info query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneralInfo {
    pub cook_every_frame: bool,
    pub mem_pixel_type: CpuMemPixelType,
}

impl Default for GeneralInfo {
    fn default() -> Self {
        Self {
            cook_every_frame: true,
            mem_pixel_type: CpuMemPixelType::Rgba32Float,
        }
    }
}

impl GeneralInfo {
    pub fn write_to(&self, raw: &mut TOP_GeneralInfo) {
        raw.cookEveryFrame = self.cook_every_frame;
        raw.memPixelType = self.mem_pixel_type.raw();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(op_type: &'static str) -> PluginInfo {
        PluginInfo {
            op_type,
            op_label: "Label",
            op_icon: "ABC",
            author_name: "",
            author_email: "",
            min_inputs: 0,
            max_inputs: 1,
            execute_mode: ExecuteMode::CpuMemWriteOnly,
        }
    }

    #[test]
    fn op_type_naming_rule() {
        assert!(info("Cpumemsample").has_valid_op_type());
        assert!(info("Depth2").has_valid_op_type());
        assert!(!info("cpumem").has_valid_op_type());
        assert!(!info("CpuMem").has_valid_op_type());
        assert!(!info("").has_valid_op_type());
    }
}
