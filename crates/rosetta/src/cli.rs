//! Clap derive structures for the `rosetta` CLI.
//!
//! Defines the command tree, global flags, and shared value parsers.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use rosetta_core::{Action, DeviceVersion, Protocol, Value};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// rosetta -- translate RouterOS commands between logical and wire forms
#[derive(Debug, Parser)]
#[command(
    name = "rosetta",
    version,
    about = "Translate RouterOS commands and responses from the command line",
    long_about = "Offline front end for the RouterOS translation layer.\n\n\
        Turns logical operations into API sentences, REST requests, or CLI\n\
        scripts, decodes device output back into logical records, and replays\n\
        scripted batches without touching a router.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "ROSETTA_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format (overrides output.format from config)
    #[arg(long, short = 'o', env = "ROSETTA_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output (overrides output.color from config)
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Device OS version to translate for, e.g. 7.13 or 6.49
    #[arg(long, env = "ROSETTA_ROS_VERSION", global = true)]
    pub ros_version: Option<DeviceVersion>,

    /// Guess bool/int types for fields without a mapping
    #[arg(long, global = true)]
    pub infer_types: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log line format on stderr
    #[arg(long, value_enum, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Translate a logical operation and render it for a protocol
    #[command(alias = "tr")]
    Translate(TranslateArgs),

    /// Render an already-canonical command (JSON or YAML) for a protocol
    Render(RenderArgs),

    /// Decode raw device output into logical records
    Parse(ParseArgs),

    /// Inspect field and version mappings
    #[command(alias = "map")]
    Mappings(MappingsArgs),

    /// Check whether a feature is available on a device version
    Feature(FeatureArgs),

    /// Run a scripted batch fixture through the translating port
    Replay(ReplayArgs),

    /// Show configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Translation ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct TranslateArgs {
    /// Menu path, e.g. /interface/ethernet
    pub path: String,

    /// Action: print, get, add, set, remove, enable, disable, move
    pub action: Action,

    /// Item id (e.g. *1)
    #[arg(long)]
    pub id: Option<String>,

    /// Logical field to send, as KEY=VALUE (repeatable)
    #[arg(long = "set", short = 's', value_name = "KEY=VALUE", value_parser = parse_assignment)]
    pub fields: Vec<(String, Value)>,

    /// Equality filter, as KEY=VALUE (repeatable)
    #[arg(long = "where", short = 'w', value_name = "KEY=VALUE", value_parser = parse_assignment)]
    pub filters: Vec<(String, Value)>,

    /// Properties to return (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub props: Vec<String>,

    /// Wire format: cli, api, api-ssl, rest, ssh, telnet
    #[arg(long, short = 'P', default_value = "cli")]
    pub protocol: Protocol,
}

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Canonical command file, or - for stdin
    #[arg(default_value = "-")]
    pub file: PathBuf,

    /// Wire format: cli, api, api-ssl, rest, ssh, telnet
    #[arg(long, short = 'P', default_value = "cli")]
    pub protocol: Protocol,
}

#[derive(Debug, Args)]
pub struct ParseArgs {
    /// Menu path the output belongs to (selects field mappings)
    #[arg(long)]
    pub path: String,

    /// Wire format of the input: cli, api, rest
    #[arg(long, short = 'P', default_value = "cli")]
    pub protocol: Protocol,

    /// Device output file, or - for stdin
    #[arg(default_value = "-")]
    pub file: PathBuf,
}

// ── Mappings ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct MappingsArgs {
    #[command(subcommand)]
    pub command: MappingsCommand,
}

#[derive(Debug, Subcommand)]
pub enum MappingsCommand {
    /// List field mappings
    Fields {
        /// Only mappings for this path
        #[arg(long)]
        path: Option<String>,
    },

    /// List version features, or show one feature's rules
    Versions {
        /// Feature name
        feature: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct FeatureArgs {
    /// Feature name, e.g. container
    pub name: String,
}

// ── Replay ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// YAML fixture: protocol, version, expect, batch
    pub fixture: PathBuf,
}

// ── Config & Completions ─────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current resolved configuration
    Show,

    /// Print the config file path
    Path,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

// ── Value parsers ────────────────────────────────────────────────────

/// `KEY=VALUE`, where a VALUE that reads as JSON (number, bool, array) is
/// typed and anything else is a string.
fn parse_assignment(s: &str) -> Result<(String, Value), String> {
    let (key, raw) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    let value = match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(json @ (serde_json::Value::Bool(_) | serde_json::Value::Number(_) | serde_json::Value::Array(_))) => {
            Value::from(json)
        }
        _ => Value::from(raw),
    };
    Ok((key.to_owned(), value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn assignment_values_are_typed() {
        assert_eq!(parse_assignment("mtu=1500").unwrap(), ("mtu".into(), Value::Int(1500)));
        assert_eq!(parse_assignment("enabled=false").unwrap(), ("enabled".into(), Value::Bool(false)));
        assert_eq!(
            parse_assignment("comment=uplink to core").unwrap(),
            ("comment".into(), Value::from("uplink to core"))
        );
        // only the first '=' splits
        assert_eq!(parse_assignment("script=a=b").unwrap(), ("script".into(), Value::from("a=b")));
    }

    #[test]
    fn assignment_requires_key() {
        assert!(parse_assignment("mtu").is_err());
        assert!(parse_assignment("=1").is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
