//! CPU memory sample TOP.
//!
//! Draws an animated two-tone pattern whose split point walks across the
//! image by `Speed` pixels per tick. By default a worker thread renders into
//! plugin memory and the newest frame is copied to the host each tick. Set
//! `TOP_SYNTHETIC_THREADED=false` to render straight into the host slot on
//! the main thread instead.

use once_cell::sync::Lazy;
use top_core::parameters::{NumericParameter, ParameterManager};
use top_core::{
    Diagnostics, ExecuteMode, NodeInfo, OutputFormatSpecs, ParameterInputs, PluginInfo, TopInstance,
};
use top_frames::buffer::as_pixels_mut;
use top_frames::color::render_synthetic;
use top_frames::config::parse_bool;
use top_frames::{FrameInstance, PipelineConfig, SyntheticMapper, SyntheticParams, SyntheticSource};
use tracing::{debug, warn};

pub const BRIGHTNESS: &str = "Brightness";
pub const SPEED: &str = "Speed";
pub const RESET: &str = "Reset";

/// Environment switch for the worker thread.
pub const THREADED_VAR: &str = "TOP_SYNTHETIC_THREADED";

static BRIGHTNESS_PARAM: Lazy<NumericParameter> = Lazy::new(|| {
    NumericParameter::float(BRIGHTNESS)
        .default_value(1.0)
        .clamped(0.0, 1.0)
});

static SPEED_PARAM: Lazy<NumericParameter> = Lazy::new(|| {
    NumericParameter::float(SPEED)
        .default_value(1.0)
        .slider(-10.0, 10.0)
});

static RESET_PARAM: Lazy<NumericParameter> = Lazy::new(|| NumericParameter::pulse(RESET));

enum Renderer {
    Threaded(FrameInstance<SyntheticSource, SyntheticMapper>),
    Inline,
}

pub struct CpuMemSample {
    renderer: Renderer,
    execute_count: i32,
    step: f64,
}

impl CpuMemSample {
    pub fn with_config(config: PipelineConfig, threaded: bool) -> Self {
        let renderer = if threaded {
            Renderer::Threaded(FrameInstance::new(
                "cpu-mem-sample",
                SyntheticSource::new(config.frame_interval),
                SyntheticMapper,
                SyntheticParams::default(),
                config,
            ))
        } else {
            Renderer::Inline
        };
        Self {
            renderer,
            execute_count: 0,
            step: 0.0,
        }
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn is_threaded(&self) -> bool {
        matches!(self.renderer, Renderer::Threaded(_))
    }

    /// The threaded pipeline, when enabled.
    pub fn pipeline(&self) -> Option<&FrameInstance<SyntheticSource, SyntheticMapper>> {
        match &self.renderer {
            Renderer::Threaded(instance) => Some(instance),
            Renderer::Inline => None,
        }
    }
}

fn threaded_from_env() -> bool {
    match std::env::var(THREADED_VAR) {
        Ok(value) => parse_bool(THREADED_VAR, &value).unwrap_or_else(|err| {
            warn!(error = %err, "using the worker thread");
            true
        }),
        Err(_) => true,
    }
}

fn render_inline(output: &mut OutputFormatSpecs<'_>, params: SyntheticParams) {
    let (width, height) = (output.width(), output.height());
    let Some(pixels) = output.slot_mut(0).and_then(as_pixels_mut) else {
        return;
    };
    render_synthetic(pixels, width, height, params);
    output.mark_uploaded(0);
}

impl TopInstance for CpuMemSample {
    fn plugin_info() -> PluginInfo {
        PluginInfo {
            op_type: "Cpumemsample",
            op_label: "CPU Mem Sample",
            op_icon: "CPM",
            author_name: "top-plugins",
            author_email: "plugins@example.com",
            min_inputs: 0,
            max_inputs: 1,
            execute_mode: ExecuteMode::CpuMemWriteOnly,
        }
    }

    fn new(node: &NodeInfo) -> Self {
        let threaded = threaded_from_env();
        debug!(op_path = %node.op_path, threaded, "cpu mem sample created");
        Self::with_config(PipelineConfig::from_env_or_default(), threaded)
    }

    fn setup_parameters(manager: &mut dyn ParameterManager) -> anyhow::Result<()> {
        for param in [&*BRIGHTNESS_PARAM, &*SPEED_PARAM, &*RESET_PARAM] {
            manager.append(param).ok(&param.name)?;
        }
        Ok(())
    }

    fn execute(&mut self, output: &mut OutputFormatSpecs<'_>, inputs: &dyn ParameterInputs) {
        self.execute_count = self.execute_count.wrapping_add(1);
        let speed = SPEED_PARAM.clamp(inputs.par_double(SPEED));
        let brightness = BRIGHTNESS_PARAM.clamp(inputs.par_double(BRIGHTNESS));
        self.step += speed;
        let params = SyntheticParams {
            step: self.step,
            brightness,
        };

        match &mut self.renderer {
            Renderer::Threaded(instance) => {
                instance.tick(output, params);
            }
            Renderer::Inline => render_inline(output, params),
        }
    }

    fn pulse_pressed(&mut self, name: &str) {
        if name == RESET {
            debug!(step = self.step, "step reset");
            self.step = 0.0;
        }
    }

    fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            execute_count: self.execute_count,
            step: self.step,
        }
    }
}

top_core::plugin_main!(CpuMemSample);
