//! Argument resolution: supplied configuration → instance fields.
//!
//! ```text
//! supplied config → classify shape → per argument: base decision → hook → commit
//!                                   → aggregate missing → after_initialize
//! ```

use std::any::Any;
use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::error::{MissingArgument, PluginError};
use crate::plugin::argument::{ArgumentDef, ArgumentGroup};
use crate::plugin::descriptor::PluginType;

/// Resolved constructor fields, keyed by argument name.
pub type Fields = HashMap<String, Value>;

/// Shape of the configuration handed to a constructor.
#[derive(Debug, Clone, Copy)]
pub enum ConfigShape<'a> {
    /// Nothing supplied, or `null`.
    Empty,
    /// Supplied but not a key→value mapping.
    Unsupported,
    /// A proper mapping.
    Map(&'a Map<String, Value>),
}

impl<'a> ConfigShape<'a> {
    pub fn classify(config: Option<&'a Value>) -> Self {
        match config {
            None | Some(Value::Null) => Self::Empty,
            Some(Value::Object(map)) => Self::Map(map),
            Some(_) => Self::Unsupported,
        }
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        match *self {
            Self::Map(map) => map.get(key),
            Self::Empty | Self::Unsupported => None,
        }
    }
}

/// How a single argument's value was (or was not) found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub empty: bool,
    pub unsupported: bool,
    /// The supplied map holds an accepted value for this argument.
    pub candidate_valid: bool,
    /// The descriptor's value slot holds an accepted value.
    pub descriptor_valid: bool,
}

impl Classification {
    /// Whether the base rule takes a supplied value instead of the default.
    pub fn has_value(&self) -> bool {
        !self.empty && !self.unsupported && (self.candidate_valid || self.descriptor_valid)
    }
}

/// One argument passing through resolution, as seen by [`PluginHooks`].
#[derive(Debug)]
pub struct ArgumentStep<'a> {
    pub argument: &'a ArgumentDef,
    pub classification: Classification,
    /// Base decision; `None` means missing. Hooks may replace it before commit.
    pub value: Option<Value>,
}

/// Object-safe access to `Any` for downcasting hook state.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Per-instance behaviour attached to a plugin type.
///
/// A fresh value is produced by the type's hook factory for every
/// construction attempt, so hooks may keep per-instance state.
pub trait PluginHooks: AsAny + Send + Sync {
    /// Called for every argument after the base decision, before commit.
    ///
    /// Returning `Err` records the argument as missing regardless of its
    /// optionality.
    fn resolve_argument(&mut self, step: &mut ArgumentStep<'_>) -> Result<(), MissingArgument> {
        let _ = step;
        Ok(())
    }

    /// Called exactly once after every field is set and nothing is missing.
    fn after_initialize(&mut self, fields: &mut Fields) {
        let _ = fields;
    }
}

/// Hooks that do nothing.
#[derive(Debug, Default)]
pub struct DefaultHooks;

impl PluginHooks for DefaultHooks {}

/// A constructed plugin.
pub struct PluginInstance {
    type_name: String,
    fields: Fields,
    hooks: Box<dyn PluginHooks>,
}

impl PluginInstance {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Resolved value of a constructor argument.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// The hook state, if it is of type `T`.
    pub fn hooks<T: PluginHooks + 'static>(&self) -> Option<&T> {
        let hooks: &dyn PluginHooks = self.hooks.as_ref();
        hooks.as_any().downcast_ref::<T>()
    }
}

impl std::fmt::Debug for PluginInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginInstance")
            .field("type_name", &self.type_name)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

/// Classify one argument against the supplied configuration.
pub fn classify_argument(argument: &ArgumentDef, shape: ConfigShape<'_>) -> Classification {
    Classification {
        empty: matches!(shape, ConfigShape::Empty),
        unsupported: matches!(shape, ConfigShape::Unsupported),
        candidate_valid: shape.get(&argument.name).is_some_and(|v| argument.accepts(v)),
        descriptor_valid: argument.has_valid_value(),
    }
}

/// Base decision for one argument: default, supplied value, or missing.
///
/// A valid descriptor value takes precedence over a valid supplied one.
fn decide(argument: &ArgumentDef, shape: ConfigShape<'_>, class: &Classification) -> Option<Value> {
    if !class.has_value() {
        return argument.optional.then(|| argument.default.clone());
    }
    if class.descriptor_valid {
        argument.value()
    } else {
        shape.get(&argument.name).cloned()
    }
}

/// Resolve every argument of `plugin_type` and build an instance.
pub fn resolve(plugin_type: &PluginType, config: Option<&Value>) -> Result<PluginInstance, PluginError> {
    let shape = ConfigShape::classify(config);
    let mut hooks = plugin_type.new_hooks();
    let mut fields = Fields::new();
    let mut missing: Vec<String> = Vec::new();

    for argument in plugin_type.arguments() {
        let classification = classify_argument(argument, shape);
        let mut step = ArgumentStep {
            argument,
            classification,
            value: decide(argument, shape, &classification),
        };

        let hook_result = hooks.resolve_argument(&mut step);
        let is_constructor = argument.group == ArgumentGroup::Constructor;

        let missing_here = hook_result.is_err() || (is_constructor && step.value.is_none());
        if missing_here {
            if !missing.contains(&argument.name) {
                missing.push(argument.name.clone());
            }
            continue;
        }

        if is_constructor {
            if let Some(value) = step.value {
                fields.insert(argument.name.clone(), value);
            }
        }
    }

    if !missing.is_empty() {
        tracing::debug!(
            plugin = %plugin_type.name(),
            missing = %missing.join(", "),
            "Plugin construction failed"
        );
        return Err(PluginError::MissingArguments {
            plugin: plugin_type.name().to_string(),
            names: missing,
        });
    }

    hooks.after_initialize(&mut fields);

    Ok(PluginInstance {
        type_name: plugin_type.name().to_string(),
        fields,
        hooks,
    })
}
