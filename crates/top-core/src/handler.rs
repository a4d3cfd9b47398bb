//! The [`TopInstance`] trait: the interface every TOP plugin implements.
//!
//! The host creates one instance per node and calls [`TopInstance::execute`]
//! once per tick from its main thread. All other methods are also called
//! from that thread, never concurrently with each other.

use crate::diagnostics::{Diagnostics, InfoChannel, InfoTable};
use crate::info::{GeneralInfo, PluginInfo};
use crate::inputs::{NodeInfo, ParameterInputs};
use crate::outputs::OutputFormatSpecs;
use crate::parameters::ParameterManager;

/// A TOP plugin instance.
///
/// # Example
///
/// ```rust,ignore
/// struct Flat { count: i32 }
///
/// impl TopInstance for Flat {
///     fn plugin_info() -> PluginInfo { /* ... */ }
///     fn new(_node: &NodeInfo) -> Self { Flat { count: 0 } }
///     fn setup_parameters(_manager: &mut dyn ParameterManager) -> anyhow::Result<()> { Ok(()) }
///     fn execute(&mut self, output: &mut OutputFormatSpecs<'_>, _inputs: &dyn ParameterInputs) {
///         self.count += 1;
///         if let Some(slot) = output.slot_mut(0) {
///             slot.fill(1.0);
///             output.mark_uploaded(0);
///         }
///     }
///     fn diagnostics(&self) -> Diagnostics { Diagnostics { execute_count: self.count, step: 0.0 } }
/// }
/// ```
pub trait TopInstance: Sized + 'static {
    /// Identity reported when the library is loaded.
    fn plugin_info() -> PluginInfo;

    /// Called once per node.
    fn new(node: &NodeInfo) -> Self;

    /// Declare the parameters shown in the host UI.
    fn setup_parameters(manager: &mut dyn ParameterManager) -> anyhow::Result<()>;

    /// Produce this tick's image. Must return promptly and never fail.
    fn execute(&mut self, output: &mut OutputFormatSpecs<'_>, inputs: &dyn ParameterInputs);

    /// Counters shown on the info CHOP and info DAT.
    fn diagnostics(&self) -> Diagnostics;

    fn general_info(&self) -> GeneralInfo {
        GeneralInfo::default()
    }

    /// Requested output resolution, or `None` to use the node's settings.
    fn output_format(&self) -> Option<(u32, u32)> {
        None
    }

    fn pulse_pressed(&mut self, _name: &str) {}

    fn info_channels(&self) -> Vec<InfoChannel> {
        self.diagnostics().channels()
    }

    fn info_table(&self) -> InfoTable {
        self.diagnostics().table()
    }
}
