use std::path::PathBuf;
use std::process::Command;

use anyhow::Context;
use clap::{CommandFactory, FromArgMatches, Parser};
use serde_json::Value;

use plugin_manager::args::{bind, ClapFlagParser, CommandLineCollector, ParsedArguments};
use plugin_manager::config::Config;
use plugin_manager::logging::init_tracing;
use plugin_manager::{
    ArgKind, ArgumentDef, ArgumentGroup, PluginError, PluginInstance, PluginRegistry,
};

const PLUGIN: &str = "echo";
const DEFAULT_PROGRAM: &str = "/bin/echo";

/// Run a command with flags collected from plugin arguments.
#[derive(Debug, Parser)]
#[command(name = "plugin-echo", version)]
struct Cli {
    /// Configuration file (defaults to the user config directory).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the command instead of running it.
    #[arg(long)]
    dry_run: bool,
}

fn declare(registry: &mut PluginRegistry) {
    registry
        .declare(PLUGIN)
        .argument(
            ArgumentDef::new("help")
                .group(ArgumentGroup::CommandLine)
                .optional()
                .kind(ArgKind::Boolean)
                .simple()
                .description("pass --help to the command"),
        )
        .argument(
            ArgumentDef::new("message")
                .group(ArgumentGroup::CommandLine)
                .optional()
                .kind(ArgKind::List)
                .description("pass --message <STRING> to the command"),
        )
        .argument(
            ArgumentDef::new("program")
                .optional()
                .default_value(DEFAULT_PROGRAM)
                .validator(|v| v.as_str().is_some_and(|s| !s.is_empty()))
                .description("command to run"),
        )
        .hooks(|| CommandLineCollector::new(ArgumentGroup::CommandLine));
}

/// Construct the plugin from config defaults, its config table and parsed flags.
fn construct(
    registry: &PluginRegistry,
    config: &Config,
    parsed: &ParsedArguments,
) -> Result<PluginInstance, PluginError> {
    let mut plugins = config.plugins.clone();
    parsed.merge_into(&mut plugins);

    let mut options = config.defaults.clone();
    if let Some(own) = plugins.get(PLUGIN).and_then(Value::as_object) {
        options.extend(own.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    let plugin = registry.construct(PLUGIN, Some(&Value::Object(options)))?;
    tracing::debug!(plugin = %plugin.type_name(), fields = ?plugin.fields(), "Constructed plugin");
    Ok(plugin)
}

fn command_line(plugin: &PluginInstance) -> (String, Vec<String>) {
    let program = plugin
        .get("program")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_PROGRAM)
        .to_string();
    let args = plugin
        .hooks::<CommandLineCollector>()
        .map(CommandLineCollector::command_line_arguments)
        .unwrap_or_default();
    (program, args)
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let mut registry = PluginRegistry::new();
    declare(&mut registry);

    let mut parser = ClapFlagParser::new(Cli::command());
    let parsed = bind(&registry, &mut parser, None);
    let matches = parser.command_mut().get_matches_mut();
    parser.dispatch(&matches);
    let cli = Cli::from_arg_matches(&matches)?;

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.apply(&mut registry);

    let plugin = construct(&registry, &config, &parsed)
        .with_context(|| format!("Failed to initialize plugin '{}'", PLUGIN))?;
    let (program, args) = command_line(&plugin);

    println!("$ {} {}", program, args.join(" "));
    if cli.dry_run {
        return Ok(());
    }

    let status = Command::new(&program)
        .args(&args)
        .status()
        .with_context(|| format!("Failed to run '{}'", program))?;
    if status.success() {
        return Ok(());
    }

    std::process::exit(status.code().unwrap_or(1));
}
