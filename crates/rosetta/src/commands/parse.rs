//! `parse`: raw device output in, logical records out.

use rosetta_core::{CanonicalResponse, ResponseData, formatter_for};
use tracing::debug;

use crate::cli::{OutputFormat, ParseArgs};
use crate::commands::util;
use crate::config::Context;
use crate::error::CliError;
use crate::output;

pub fn handle(args: &ParseArgs, ctx: &Context) -> Result<(), CliError> {
    let raw = util::read_input(&args.file)?;
    let parsed = formatter_for(args.protocol).parse(&raw)?;
    let resp = ctx.translator()?.translate_response(&args.path, parsed);
    debug!(path = args.path.as_str(), success = resp.success, records = resp.record_slice().len(), "parsed output");

    let structured = matches!(
        ctx.output,
        OutputFormat::Json | OutputFormat::JsonCompact | OutputFormat::Yaml
    );
    if structured {
        // failures are still printed so scripts can read the error body
        let out = output::render_single(&ctx.output, &resp, |_| String::new(), |_| String::new())?;
        output::print_output(&out, ctx.quiet);
    }

    if let Some(error) = &resp.error {
        return Err(CliError::Device(error.clone()));
    }
    if !structured {
        output::print_output(&render_text(&ctx.output, &resp)?, ctx.quiet);
    }
    Ok(())
}

fn render_text(format: &OutputFormat, resp: &CanonicalResponse) -> Result<String, CliError> {
    match &resp.data {
        Some(ResponseData::Raw(text)) => Ok(text.clone()),
        Some(ResponseData::Record(record)) => output::render_records(format, std::slice::from_ref(record)),
        Some(ResponseData::Records(records)) => output::render_records(format, records),
        None => Ok(resp.id.clone().unwrap_or_default()),
    }
}
