//! Plugin types, their declared arguments, and argument resolution.

mod argument;
mod descriptor;
mod resolve;
mod settings;

pub use argument::{ArgKind, ArgumentDef, ArgumentGroup, Validator, ValueSlot};
pub use descriptor::{HookFactory, PluginType};
pub use resolve::{
    classify_argument, resolve, ArgumentStep, AsAny, Classification, ConfigShape, DefaultHooks,
    Fields, PluginHooks, PluginInstance,
};
pub use settings::{PluginSettings, SettingId};
