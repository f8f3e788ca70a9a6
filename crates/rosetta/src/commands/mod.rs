//! Command dispatch: bridges CLI args -> translation layer -> output formatting.

pub mod config_cmd;
pub mod mappings;
pub mod parse;
pub mod replay;
pub mod translate;
pub mod util;

use crate::cli::Command;
use crate::config::Context;
use crate::error::CliError;

/// Dispatch a config-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, ctx: &Context) -> Result<(), CliError> {
    match cmd {
        Command::Translate(args) => translate::handle(args, ctx),
        Command::Render(args) => translate::render(&args, ctx),
        Command::Parse(args) => parse::handle(&args, ctx),
        Command::Mappings(args) => mappings::handle(args, ctx),
        Command::Feature(args) => mappings::feature(&args, ctx),
        Command::Replay(args) => replay::handle(&args, ctx).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
