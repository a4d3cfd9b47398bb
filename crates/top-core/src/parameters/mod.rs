//! Structs and enums for host UI parameters.
//! Use [NumericParameter::float] and [NumericParameter::pulse] for declarations,
//! and append them through a [ParameterManager] in
//! [crate::TopInstance::setup_parameters].

pub mod manager;
mod info;
pub use info::*;
pub use manager::{HostParameterManager, ParameterList, ParameterManager};
