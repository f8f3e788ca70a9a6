//! CLI configuration -- thin wrapper around `rosetta_config`.
//!
//! Loads the layered config and applies `GlobalOpts` flag overrides
//! (--ros-version, --infer-types, --output, --color) on top.

use clap::ValueEnum;

use rosetta_config::{Config, load_config};
use rosetta_core::Translator;

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

/// Everything a command handler needs after flags and config are merged.
#[derive(Debug)]
pub struct Context {
    pub config: Config,
    pub output: OutputFormat,
    pub color: bool,
    pub quiet: bool,
}

impl Context {
    pub fn load(global: &GlobalOpts) -> Result<Self, CliError> {
        let mut config = load_config(global.config.as_deref())?;
        if let Some(version) = &global.ros_version {
            config.translator.default_version = Some(version.clone());
        }
        if global.infer_types {
            config.translator.infer_types = true;
        }

        let output = match &global.output {
            Some(format) => format.clone(),
            None => parse_setting::<OutputFormat>("output.format", &config.output.format)?,
        };
        let color = match &global.color {
            Some(mode) => output::should_color(mode),
            None => output::should_color(&parse_setting::<ColorMode>("output.color", &config.output.color)?),
        };

        Ok(Self {
            config,
            output,
            color,
            quiet: global.quiet,
        })
    }

    pub fn translator(&self) -> Result<Translator, CliError> {
        Ok(self.config.translator()?)
    }
}

fn parse_setting<T: ValueEnum>(field: &str, value: &str) -> Result<T, CliError> {
    T::from_str(value, true).map_err(|reason| CliError::Validation {
        field: field.into(),
        reason,
    })
}
