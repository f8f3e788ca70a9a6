//! Config subcommand handlers.

use rosetta_config::config_path;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config::Context;
use crate::error::CliError;
use crate::output;

/// Runs before a `Context` exists: `config path` must work even when the
/// file it names is missing or broken.
pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            let path = global.config.clone().unwrap_or_else(config_path);
            output::print_output(&path.display().to_string(), global.quiet);
            Ok(())
        }
        ConfigCommand::Show => {
            let ctx = Context::load(global)?;
            let out = match ctx.output {
                OutputFormat::Table | OutputFormat::Plain => ctx.config.to_toml()?,
                _ => output::render_single(&ctx.output, &ctx.config, |_| String::new(), |_| String::new())?,
            };
            output::print_output(out.trim_end(), ctx.quiet);
            Ok(())
        }
    }
}
