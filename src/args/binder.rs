//! Flag binder: plugin argument descriptors → command-line flags.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Map, Value};

use crate::args::parser::{FlagCallback, FlagParser, FlagShape, FlagSpec, FlagValue};
use crate::plugin::{ArgKind, ArgumentDef, ArgumentGroup};
use crate::registry::PluginRegistry;

/// Values parsed from bound flags, keyed by plugin name then argument name.
///
/// Clones share the same underlying map, so a handle returned by [`bind`]
/// sees every later parse.
#[derive(Debug, Clone, Default)]
pub struct ParsedArguments(Arc<Mutex<Map<String, Value>>>);

impl ParsedArguments {
    /// Value parsed for `argument` of `plugin`.
    pub fn get(&self, plugin: &str, argument: &str) -> Option<Value> {
        self.0.lock().get(plugin)?.get(argument).cloned()
    }

    /// Everything parsed for `plugin`, as a configuration mapping.
    pub fn plugin(&self, plugin: &str) -> Option<Map<String, Value>> {
        self.0.lock().get(plugin)?.as_object().cloned()
    }

    /// Snapshot usable as the `config` of bulk instantiation.
    pub fn to_config(&self) -> Map<String, Value> {
        self.0.lock().clone()
    }

    /// Overlay parsed values onto `config`, per plugin and per argument.
    pub fn merge_into(&self, config: &mut Map<String, Value>) {
        for (plugin, parsed) in self.0.lock().iter() {
            let Some(parsed) = parsed.as_object() else {
                continue;
            };
            let entry = config
                .entry(plugin.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Some(target) = entry.as_object_mut() {
                target.extend(parsed.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
        }
    }

    fn with_plugin<R>(&self, plugin: &str, f: impl FnOnce(&mut Map<String, Value>) -> R) -> R {
        let mut guard = self.0.lock();
        let entry = guard
            .entry(plugin.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        match entry.as_object_mut() {
            Some(map) => f(map),
            None => f(&mut Map::new()),
        }
    }
}

/// `--{token}-{argument}` without the leading dashes; underscores become hyphens.
pub fn flag_long(token: &str, argument: &str) -> String {
    format!("{}-{}", token, argument).replace('_', "-")
}

/// Help text: description, then the default on its own line.
pub fn flag_help(argument: &ArgumentDef) -> Option<String> {
    let mut lines = Vec::new();
    if let Some(description) = &argument.description {
        lines.push(description.clone());
    }
    match &argument.default {
        Value::Null => {}
        Value::String(s) => lines.push(format!("default: {}", s)),
        other => lines.push(format!("default: {}", other)),
    }
    (!lines.is_empty()).then(|| lines.join("\n"))
}

fn flag_shape(argument: &ArgumentDef) -> FlagShape {
    match argument.kind {
        ArgKind::Boolean if argument.simple => FlagShape::Toggle,
        ArgKind::Boolean => FlagShape::Negatable,
        ArgKind::List => FlagShape::Repeated,
        ArgKind::Scalar | ArgKind::Unspecified => FlagShape::Single,
    }
}

fn callback(
    results: &ParsedArguments,
    plugin: &str,
    argument: &ArgumentDef,
    shape: FlagShape,
) -> FlagCallback {
    let results = results.clone();
    let plugin = plugin.to_string();
    let name = argument.name.clone();
    let slot = argument.slot().clone();

    Box::new(move |value| {
        let value = match value {
            FlagValue::Bool(b) => Value::Bool(b),
            FlagValue::Str(s) => Value::String(s),
        };
        tracing::trace!(plugin = %plugin, argument = %name, value = %value, "Parsed flag");

        if shape == FlagShape::Repeated {
            // Map entry mirrors the slot sequence.
            slot.push(value);
            let items = slot.get().unwrap_or_else(|| Value::Array(Vec::new()));
            results.with_plugin(&plugin, |map| {
                map.insert(name.clone(), items);
            });
        } else {
            results.with_plugin(&plugin, |map| {
                map.insert(name.clone(), value.clone());
            });
            slot.set(value);
        }
    })
}

/// Register one flag per argument of every registered plugin type.
///
/// `groups` restricts binding to arguments in those groups; `None` binds all.
/// Parsed values land in the returned map and in each descriptor's value slot.
pub fn bind<P: FlagParser>(
    registry: &PluginRegistry,
    parser: &mut P,
    groups: Option<&[ArgumentGroup]>,
) -> ParsedArguments {
    let results = ParsedArguments::default();

    for plugin_type in registry.types() {
        let plugin = registry.unscoped(plugin_type.name());
        let token = plugin_type.opt_token().unwrap_or(plugin);

        for argument in plugin_type.arguments_in(groups) {
            let shape = flag_shape(argument);
            let spec = FlagSpec {
                long: flag_long(token, &argument.name),
                shape,
                help: flag_help(argument),
            };
            tracing::debug!(plugin = %plugin, flag = %spec.long, "Binding flag");
            parser.on(spec, callback(&results, plugin, argument, shape));
        }
    }

    results
}
