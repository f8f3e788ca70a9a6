//! `translate` and `render`: logical operation or canonical command in,
//! wire form out.

use serde::Serialize;
use tracing::debug;

use rosetta_core::{CanonicalCommand, Protocol, Rendered, TranslateInput, formatter_for};

use crate::cli::{RenderArgs, TranslateArgs};
use crate::commands::util;
use crate::config::Context;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct Translation<'a> {
    protocol: Protocol,
    command: &'a CanonicalCommand,
    rendered: &'a Rendered,
}

pub fn handle(args: TranslateArgs, ctx: &Context) -> Result<(), CliError> {
    let translator = ctx.translator()?;

    let mut input = TranslateInput::new(args.path, args.action).with_proplist(args.props);
    if let Some(id) = args.id {
        input = input.with_id(id);
    }
    for (name, value) in args.fields {
        input = input.with_field(name, value);
    }
    for (name, value) in args.filters {
        input = input.with_filter(name, value);
    }

    let cmd = translator.translate_to_canonical(input)?;
    emit(ctx, args.protocol, &cmd)
}

pub fn render(args: &RenderArgs, ctx: &Context) -> Result<(), CliError> {
    let text = util::read_input(&args.file)?;
    let cmd: CanonicalCommand = util::parse_document(&text)?;
    emit(ctx, args.protocol, &cmd)
}

fn emit(ctx: &Context, protocol: Protocol, cmd: &CanonicalCommand) -> Result<(), CliError> {
    let formatter = formatter_for(protocol);
    let rendered = formatter.format(cmd)?;
    debug!(path = cmd.path(), protocol = %formatter.protocol(), "rendered command");

    let view = Translation {
        protocol: formatter.protocol(),
        command: cmd,
        rendered: &rendered,
    };
    let out = output::render_single(
        &ctx.output,
        &view,
        |v| v.rendered.to_string(),
        |v| v.rendered.to_string(),
    )?;
    output::print_output(&out, ctx.quiet);
    Ok(())
}
