//! Plugin registration and argument binding.
//!
//! Plugin types declare named constructor arguments in a [`PluginRegistry`];
//! derived types inherit their parent's declarations. The registry exposes
//! those arguments as command-line flags ([`args::bind`]) and builds plugin
//! instances from merged configuration ([`PluginRegistry::initialize_plugins`]).

pub mod args;
pub mod config;
pub mod error;
pub mod logging;
pub mod plugin;
pub mod registry;

pub use error::PluginError;
pub use plugin::{ArgKind, ArgumentDef, ArgumentGroup, PluginInstance, PluginType, SettingId};
pub use registry::{Declaration, PluginEntry, PluginRegistry};
