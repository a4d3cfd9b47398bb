//! Host protocol for CPU-memory TOP plugins.
//!
//! Implement [`TopInstance`] on your plugin struct and export it with
//! [`plugin_main!`]. The host then drives the instance through the C entry
//! points in [`entry`]:
//!
//! - [`TopInstance::setup_parameters`] declares UI parameters.
//! - [`TopInstance::execute`] runs once per tick and fills one of the host's
//!   CPU memory slots through [`OutputFormatSpecs`].
//! - [`TopInstance::diagnostics`] feeds the info CHOP channels and info DAT.
//!
//! [`log::init_default_subscriber`] is called when the first instance is
//! created; set `RUST_LOG` to change the filter.

pub mod diagnostics;
pub mod entry;
pub mod ffi;
pub mod handler;
pub mod info;
pub mod inputs;
pub mod log;
pub mod outputs;
pub mod parameters;

pub use diagnostics::{format_g, Diagnostics, InfoChannel, InfoTable};
pub use handler::TopInstance;
pub use info::{CpuMemPixelType, ExecuteMode, GeneralInfo, PluginInfo};
pub use inputs::{NodeInfo, ParamValues, ParameterInputs};
pub use outputs::{CpuPixelSlots, OutputFormatSpecs, CHANNELS};
