//! Argument assembler: resolved descriptors back into command-line tokens.

use serde_json::Value;

use crate::error::MissingArgument;
use crate::plugin::{ArgumentGroup, ArgumentStep, PluginHooks};

/// Builder for the token list handed to an external command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgAssembler {
    args: Vec<String>,
}

impl ArgAssembler {
    /// Start with an empty arg list.
    pub fn new() -> Self {
        Self { args: Vec::new() }
    }

    /// Presence-only flag (`--name`).
    pub fn with_switch(mut self, name: &str) -> Self {
        self.args.push(format!("--{}", name));
        self
    }

    /// Flag followed by its value; lists repeat the flag per element.
    pub fn with_value(mut self, name: &str, value: &Value) -> Self {
        match value {
            Value::Array(items) => {
                for item in items {
                    self = self.with_value(name, item);
                }
            }
            other => {
                self.args.push(format!("--{}", name));
                self.args.push(render(other));
            }
        }
        self
    }

    /// Add arbitrary extra arguments.
    pub fn with_extra(mut self, extra: Vec<String>) -> Self {
        self.args.extend(extra);
        self
    }

    /// Build the final argument list.
    pub fn build(self) -> Vec<String> {
        self.args
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Hooks collecting every valid argument of one group as command-line tokens.
///
/// Validity is judged on the descriptor's parsed value. A required argument
/// of the group without one is reported as missing.
#[derive(Debug, Clone)]
pub struct CommandLineCollector {
    group: ArgumentGroup,
    assembler: ArgAssembler,
}

impl CommandLineCollector {
    pub fn new(group: ArgumentGroup) -> Self {
        Self {
            group,
            assembler: ArgAssembler::new(),
        }
    }

    /// Tokens collected so far, in declaration order.
    pub fn command_line_arguments(&self) -> Vec<String> {
        self.assembler.clone().build()
    }
}

impl PluginHooks for CommandLineCollector {
    fn resolve_argument(&mut self, step: &mut ArgumentStep<'_>) -> Result<(), MissingArgument> {
        let argument = step.argument;
        if argument.group != self.group {
            return Ok(());
        }

        let value = match argument.value() {
            Some(value) if step.classification.descriptor_valid => value,
            _ if argument.optional => return Ok(()),
            _ => return Err(MissingArgument),
        };

        let assembler = std::mem::take(&mut self.assembler);
        self.assembler = if argument.simple {
            assembler.with_switch(&argument.name)
        } else {
            assembler.with_value(&argument.name, &value)
        };
        Ok(())
    }
}
