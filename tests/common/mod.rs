//! Shared plugin declarations for integration tests.

#![allow(dead_code)]

use plugin_manager::plugin::Fields;
use plugin_manager::{ArgKind, ArgumentDef, ArgumentGroup, PluginRegistry};
use serde_json::{Map, Value};

/// Turn a `json!({...})` literal into a configuration map.
pub fn map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {}", other),
    }
}

/// `argument1`, `argument2` required; `argument3`..`argument6` optional.
pub fn declare_with_arguments(registry: &mut PluginRegistry) {
    registry
        .declare("PluginWithArguments")
        .group("mytestgroup")
        .argument(ArgumentDef::new("argument1"))
        .argument(
            ArgumentDef::new("argument2")
                .kind(ArgKind::Scalar)
                .description("description for argument2 parameter"),
        )
        .argument(ArgumentDef::new("argument3").optional())
        .argument(
            ArgumentDef::new("argument4")
                .optional()
                .default_value(true)
                .kind(ArgKind::Boolean)
                .description("description for argument4 parameter"),
        )
        .argument(ArgumentDef::new("argument5").optional().default_value("123"))
        .argument(ArgumentDef::new("argument6").optional().kind(ArgKind::List))
        .argument(
            ArgumentDef::new("name")
                .group(ArgumentGroup::CommandLine)
                .kind(ArgKind::Scalar)
                .description("description for name parameter"),
        );
}

/// Hooks tripling `argument1` once construction succeeds.
#[derive(Debug, Default)]
pub struct TripleArgument1;

impl plugin_manager::plugin::PluginHooks for TripleArgument1 {
    fn after_initialize(&mut self, fields: &mut Fields) {
        if let Some(Value::String(s)) = fields.get_mut("argument1") {
            *s = s.repeat(3);
        }
    }
}

/// `argument1` and `argument4` required, `argument3` optional.
pub fn declare_initialize(registry: &mut PluginRegistry) {
    registry
        .declare("PluginInitialize")
        .group("mytestgroup")
        .argument(ArgumentDef::new("argument1"))
        .argument(ArgumentDef::new("argument3").optional())
        .argument(ArgumentDef::new("argument4"))
        .hooks(TripleArgument1::default);
}
