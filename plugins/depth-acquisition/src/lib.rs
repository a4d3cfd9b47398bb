//! Depth acquisition TOP.
//!
//! Streams depth frames from a time-of-flight camera and maps them to a
//! red-yellow-green-cyan-blue ramp between the `Near` and `Far` distances.
//! Acquisition runs on a worker thread; the host tick only swaps in the
//! newest finished frame.
//!
//! Built with the `arena` feature the camera is the first LUCID device found
//! through ArenaC. Without it a simulated camera is used.

#[cfg(feature = "arena")]
pub mod arena;
pub mod simulated;

use anyhow::Context;
use once_cell::sync::Lazy;
use top_core::parameters::{NumericParameter, ParameterManager};
use top_core::{
    Diagnostics, ExecuteMode, NodeInfo, OutputFormatSpecs, ParameterInputs, PluginInfo, TopInstance,
};
use top_frames::{
    CameraSystem, DepthMapper, DepthParams, FrameInstance, HardwareSource, PipelineConfig,
};
use tracing::{debug, error, info};

#[cfg(feature = "arena")]
pub type Camera = arena::ArenaSystem;
#[cfg(not(feature = "arena"))]
pub type Camera = simulated::SimulatedSystem;

pub const NEAR: &str = "Near";
pub const FAR: &str = "Far";
pub const RESET: &str = "Reset";

/// Sensor resolution requested from the host.
pub const OUTPUT_WIDTH: u32 = 640;
pub const OUTPUT_HEIGHT: u32 = 480;

/// Farthest distance the ramp can be set to, in millimeters.
pub const MAX_DISTANCE: f64 = 6000.0;

static NEAR_PARAM: Lazy<NumericParameter> = Lazy::new(|| {
    NumericParameter::float(NEAR)
        .default_value(0.0)
        .clamped(0.0, MAX_DISTANCE)
});

static FAR_PARAM: Lazy<NumericParameter> = Lazy::new(|| {
    NumericParameter::float(FAR)
        .default_value(MAX_DISTANCE)
        .clamped(0.0, MAX_DISTANCE)
});

static RESET_PARAM: Lazy<NumericParameter> = Lazy::new(|| NumericParameter::pulse(RESET));

fn open_camera() -> anyhow::Result<Camera> {
    Camera::open().context("failed to open camera system")
}

pub struct DepthAcquire<Sys: CameraSystem = Camera> {
    pipeline: FrameInstance<HardwareSource<Sys>, DepthMapper>,
    execute_count: i32,
}

impl<Sys: CameraSystem> DepthAcquire<Sys> {
    /// Build around an already opened source. The depth scale is read from
    /// the source once; an unavailable source keeps a scale of 1.
    pub fn with_source(source: HardwareSource<Sys>, config: PipelineConfig) -> Self {
        let mapper = DepthMapper::new(source.coordinate_scale().unwrap_or(1.0));
        Self {
            pipeline: FrameInstance::new("depth-acquire", source, mapper, DepthParams::default(), config),
            execute_count: 0,
        }
    }

    pub fn pipeline(&self) -> &FrameInstance<HardwareSource<Sys>, DepthMapper> {
        &self.pipeline
    }

    fn read_params(inputs: &dyn ParameterInputs) -> DepthParams {
        DepthParams {
            near: NEAR_PARAM.clamp(inputs.par_double(NEAR)),
            far: FAR_PARAM.clamp(inputs.par_double(FAR)),
        }
    }

    fn tick(&mut self, output: &mut OutputFormatSpecs<'_>, inputs: &dyn ParameterInputs) {
        self.execute_count = self.execute_count.wrapping_add(1);
        self.pipeline.tick(output, Self::read_params(inputs));
    }
}

impl<Sys: CameraSystem> Drop for DepthAcquire<Sys> {
    fn drop(&mut self) {
        if let Some(source) = self.pipeline.shutdown() {
            source.close();
        }
        debug!(execute_count = self.execute_count, "depth acquire dropped");
    }
}

impl TopInstance for DepthAcquire {
    fn plugin_info() -> PluginInfo {
        PluginInfo {
            op_type: "Depthacquire",
            op_label: "Depth Acquire",
            op_icon: "DAQ",
            author_name: "top-plugins",
            author_email: "plugins@example.com",
            min_inputs: 0,
            max_inputs: 1,
            execute_mode: ExecuteMode::CpuMemWriteOnly,
        }
    }

    fn new(node: &NodeInfo) -> Self {
        info!(op_path = %node.op_path, "opening depth camera");
        let source = match open_camera() {
            Ok(system) => HardwareSource::open(system),
            Err(err) => {
                error!("{err:#}");
                HardwareSource::unavailable()
            }
        };
        Self::with_source(source, PipelineConfig::from_env_or_default())
    }

    fn setup_parameters(manager: &mut dyn ParameterManager) -> anyhow::Result<()> {
        for param in [&*NEAR_PARAM, &*FAR_PARAM, &*RESET_PARAM] {
            manager.append(param).ok(&param.name)?;
        }
        Ok(())
    }

    fn execute(&mut self, output: &mut OutputFormatSpecs<'_>, inputs: &dyn ParameterInputs) {
        self.tick(output, inputs);
    }

    fn output_format(&self) -> Option<(u32, u32)> {
        Some((OUTPUT_WIDTH, OUTPUT_HEIGHT))
    }

    fn pulse_pressed(&mut self, name: &str) {
        if name == RESET {
            debug!("reset pulse ignored by the depth camera");
        }
    }

    fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            execute_count: self.execute_count,
            step: 0.0,
        }
    }
}

top_core::plugin_main!(DepthAcquire);

#[cfg(test)]
mod tests {
    use super::*;
    use top_core::parameters::ParameterList;
    use top_core::ParamValues;

    #[test]
    fn declares_near_far_reset() {
        let mut list = ParameterList::new();
        DepthAcquire::<Camera>::setup_parameters(&mut list).unwrap();
        let names: Vec<_> = list.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, [NEAR, FAR, RESET]);
        assert_eq!(list.get(FAR).unwrap().default, MAX_DISTANCE);
        assert_eq!(list.get(NEAR).unwrap().max_value, MAX_DISTANCE);
    }

    #[test]
    fn parameters_are_clamped() {
        let inputs = ParamValues::new().with(NEAR, -50.0).with(FAR, 9000.0);
        let params = DepthAcquire::<Camera>::read_params(&inputs);
        assert_eq!(params, DepthParams { near: 0.0, far: MAX_DISTANCE });
    }
}
