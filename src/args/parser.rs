//! Flag parser seam: register flags, receive callbacks on parse.

use std::ffi::OsString;

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command};

/// Shape of a registered flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagShape {
    /// `--x-y`, reports `true` when present.
    Toggle,
    /// `--x-y` / `--no-x-y`, reports `true` / `false`; last one wins.
    Negatable,
    /// `--x-y STRING`, reported once per occurrence.
    Repeated,
    /// `--x-y STRING`, reported once with the last occurrence.
    Single,
}

/// A single flag definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagSpec {
    /// Long form without leading dashes (e.g. "PluginWithArguments-argument1").
    pub long: String,
    pub shape: FlagShape,
    /// Human-readable help, may span several lines.
    pub help: Option<String>,
}

impl FlagSpec {
    /// Long form of the negative half of a negatable flag.
    pub fn negated_long(&self) -> String {
        format!("no-{}", self.long)
    }
}

/// Value handed to a flag callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagValue {
    Bool(bool),
    Str(String),
}

pub type FlagCallback = Box<dyn FnMut(FlagValue) + Send>;

/// Anything that can register flags and later invoke their callbacks.
pub trait FlagParser {
    /// Register `spec`. Registering a long name again attaches `callback`
    /// to the existing flag; the first registration decides its shape.
    fn on(&mut self, spec: FlagSpec, callback: FlagCallback);
}

/// One registered flag and every callback attached to it.
struct Binding {
    spec: FlagSpec,
    callbacks: Vec<FlagCallback>,
}

impl Binding {
    fn emit(&mut self, value: FlagValue) {
        for callback in &mut self.callbacks {
            callback(value.clone());
        }
    }
}

/// [`FlagParser`] backed by a clap [`Command`].
pub struct ClapFlagParser {
    command: Command,
    bindings: Vec<Binding>,
}

impl ClapFlagParser {
    /// Extend `command` (which may carry the host's own arguments).
    pub fn new(command: Command) -> Self {
        Self {
            command,
            bindings: Vec::new(),
        }
    }

    pub fn command(&self) -> &Command {
        &self.command
    }

    pub fn command_mut(&mut self) -> &mut Command {
        &mut self.command
    }

    /// Rendered `--help` output.
    pub fn render_help(&mut self) -> String {
        self.command.render_help().to_string()
    }

    /// Parse `args` (first item is the binary name) and dispatch callbacks.
    pub fn parse_from<I, T>(&mut self, args: I) -> Result<ArgMatches, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = self.command.try_get_matches_from_mut(args)?;
        self.dispatch(&matches);
        Ok(matches)
    }

    /// Invoke callbacks for every bound flag given on the command line.
    pub fn dispatch(&mut self, matches: &ArgMatches) {
        for binding in &mut self.bindings {
            for value in parsed_values(matches, &binding.spec) {
                binding.emit(value);
            }
        }
    }
}

impl FlagParser for ClapFlagParser {
    fn on(&mut self, spec: FlagSpec, callback: FlagCallback) {
        if let Some(binding) = self.bindings.iter_mut().find(|b| b.spec.long == spec.long) {
            tracing::debug!(flag = %spec.long, "Flag already bound, attaching callback");
            binding.callbacks.push(callback);
            return;
        }

        let long = spec.long.clone();
        let command = std::mem::take(&mut self.command);
        self.command = match spec.shape {
            FlagShape::Toggle => command.arg(with_help(
                Arg::new(long.clone())
                    .long(long.clone())
                    .action(ArgAction::SetTrue)
                    .overrides_with(long),
                &spec.help,
            )),
            FlagShape::Negatable => {
                let negated = spec.negated_long();
                command
                    .arg(with_help(
                        Arg::new(long.clone())
                            .long(long.clone())
                            .action(ArgAction::SetTrue)
                            .overrides_with_all([long.clone(), negated.clone()]),
                        &spec.help,
                    ))
                    .arg(
                        Arg::new(negated.clone())
                            .long(negated.clone())
                            .action(ArgAction::SetTrue)
                            .overrides_with_all([negated, long]),
                    )
            }
            // Single flags append too so a repeated flag overwrites instead of erroring.
            FlagShape::Repeated | FlagShape::Single => command.arg(with_help(
                Arg::new(long.clone())
                    .long(long)
                    .value_name("STRING")
                    .action(ArgAction::Append),
                &spec.help,
            )),
        };
        self.bindings.push(Binding {
            spec,
            callbacks: vec![callback],
        });
    }
}

fn with_help(arg: Arg, help: &Option<String>) -> Arg {
    match help {
        Some(help) => arg.help(help.clone()),
        None => arg,
    }
}

/// Values to report for `spec`, in the order they were given.
fn parsed_values(matches: &ArgMatches, spec: &FlagSpec) -> Vec<FlagValue> {
    match spec.shape {
        FlagShape::Toggle => {
            if from_command_line(matches, &spec.long) {
                vec![FlagValue::Bool(true)]
            } else {
                Vec::new()
            }
        }
        FlagShape::Negatable => {
            if from_command_line(matches, &spec.long) {
                vec![FlagValue::Bool(true)]
            } else if from_command_line(matches, &spec.negated_long()) {
                vec![FlagValue::Bool(false)]
            } else {
                Vec::new()
            }
        }
        FlagShape::Repeated | FlagShape::Single => {
            if !from_command_line(matches, &spec.long) {
                return Vec::new();
            }
            let values: Vec<FlagValue> = matches
                .get_many::<String>(&spec.long)
                .map(|v| v.cloned().map(FlagValue::Str).collect())
                .unwrap_or_default();
            match spec.shape {
                FlagShape::Single => values.into_iter().last().into_iter().collect(),
                _ => values,
            }
        }
    }
}

fn from_command_line(matches: &ArgMatches, id: &str) -> bool {
    matches.value_source(id) == Some(ValueSource::CommandLine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recorder() -> (Arc<Mutex<Vec<FlagValue>>>, FlagCallback) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: FlagCallback = Box::new(move |value| sink.lock().unwrap().push(value));
        (seen, callback)
    }

    fn spec(long: &str, shape: FlagShape) -> FlagSpec {
        FlagSpec {
            long: long.to_string(),
            shape,
            help: None,
        }
    }

    #[test]
    fn single_flag_reports_last_value() {
        let mut parser = ClapFlagParser::new(Command::new("test"));
        let (seen, callback) = recorder();
        parser.on(spec("p-name", FlagShape::Single), callback);

        parser
            .parse_from(["test", "--p-name", "a", "--p-name", "b"])
            .unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![FlagValue::Str("b".into())]);
    }

    #[test]
    fn absent_flags_are_silent() {
        let mut parser = ClapFlagParser::new(Command::new("test"));
        let (seen, callback) = recorder();
        parser.on(spec("p-help", FlagShape::Toggle), callback);

        parser.parse_from(["test"]).unwrap();
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn negatable_reports_false_for_negative_form() {
        let mut parser = ClapFlagParser::new(Command::new("test"));
        let (seen, callback) = recorder();
        parser.on(spec("p-verbose", FlagShape::Negatable), callback);

        parser.parse_from(["test", "--no-p-verbose"]).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![FlagValue::Bool(false)]);
    }

    #[test]
    fn same_long_twice_shares_one_flag() {
        let mut parser = ClapFlagParser::new(Command::new("test"));
        let (first, callback) = recorder();
        parser.on(spec("p-level", FlagShape::Single), callback);
        let (second, callback) = recorder();
        parser.on(spec("p-level", FlagShape::Single), callback);

        let longs: Vec<_> = parser
            .command()
            .get_arguments()
            .filter_map(|a| a.get_long())
            .collect();
        assert_eq!(longs, vec!["p-level"]);

        parser.parse_from(["test", "--p-level", "x"]).unwrap();
        assert_eq!(*first.lock().unwrap(), vec![FlagValue::Str("x".into())]);
        assert_eq!(*second.lock().unwrap(), vec![FlagValue::Str("x".into())]);
    }
}
