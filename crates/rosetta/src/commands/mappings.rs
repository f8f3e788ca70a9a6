//! `mappings` and `feature`: inspect the registries the translator uses.

use std::fmt::Write as _;

use serde::Serialize;
use tabled::Tabled;

use rosetta_core::{DeviceVersion, FieldMapping, VersionMapping, VersionMappingRegistry};

use crate::cli::{FeatureArgs, MappingsArgs, MappingsCommand};
use crate::config::Context;
use crate::error::CliError;
use crate::output;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Logical")]
    logical: String,
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Type")]
    field_type: String,
}

fn field_row(m: &FieldMapping) -> FieldRow {
    FieldRow {
        path: m.path.clone(),
        logical: m.logical_field.clone(),
        device: m.device_field.clone(),
        field_type: m.field_type.to_string(),
    }
}

#[derive(Tabled)]
struct FeatureRow {
    #[tabled(rename = "Feature")]
    feature: String,
    #[tabled(rename = "Min Version")]
    min_version: String,
    #[tabled(rename = "Paths")]
    paths: usize,
    #[tabled(rename = "Fields")]
    fields: usize,
    #[tabled(rename = "Available")]
    available: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Availability {
    feature: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_version: Option<String>,
    available: bool,
}

// ── Handlers ────────────────────────────────────────────────────────

pub fn handle(args: MappingsArgs, ctx: &Context) -> Result<(), CliError> {
    let out = match args.command {
        MappingsCommand::Fields { path } => {
            let mut mappings = ctx.config.field_registry().all();
            if let Some(path) = &path {
                mappings.retain(|m| &m.path == path);
            }
            output::render_list(&ctx.output, &mappings, field_row, |m| {
                format!("{}:{}={}", m.path, m.logical_field, m.device_field)
            })?
        }
        MappingsCommand::Versions { feature: None } => {
            let registry = ctx.config.version_registry()?;
            let version = ctx.config.translator.default_version.as_ref();
            let mappings: Vec<VersionMapping> =
                registry.features().iter().filter_map(|name| registry.mapping(name)).collect();
            output::render_list(
                &ctx.output,
                &mappings,
                |m| FeatureRow {
                    feature: m.feature.clone(),
                    min_version: m.min_version.as_ref().map(ToString::to_string).unwrap_or_default(),
                    paths: m.path_mappings.len(),
                    fields: m.field_mappings.len(),
                    available: availability_label(&registry, &m.feature, version),
                },
                |m| m.feature.clone(),
            )?
        }
        MappingsCommand::Versions { feature: Some(name) } => {
            let registry = ctx.config.version_registry()?;
            let mapping = lookup(&registry, &name)?;
            output::render_single(&ctx.output, &mapping, describe, |m| m.feature.clone())?
        }
    };
    output::print_output(&out, ctx.quiet);
    Ok(())
}

pub fn feature(args: &FeatureArgs, ctx: &Context) -> Result<(), CliError> {
    let registry = ctx.config.version_registry()?;
    let mapping = lookup(&registry, &args.name)?;
    let version = ctx.config.translator.default_version.as_ref();
    let report = Availability {
        feature: mapping.feature.clone(),
        version: version.map(ToString::to_string),
        min_version: mapping.min_version.as_ref().map(ToString::to_string),
        available: registry.is_feature_available(&mapping.feature, version),
    };

    let out = output::render_single(
        &ctx.output,
        &report,
        |r| match (&r.version, r.available) {
            (Some(v), true) => format!("{}: available on {v}", r.feature),
            (Some(v), false) => format!("{}: not available on {v}", r.feature),
            (None, _) => format!("{}: available (no device version given)", r.feature),
        },
        |r| r.available.to_string(),
    )?;
    output::print_output(&out, ctx.quiet);

    if report.available {
        Ok(())
    } else {
        Err(CliError::FeatureUnavailable {
            name: report.feature,
            required: report.min_version.unwrap_or_default(),
            version: report.version.unwrap_or_default(),
        })
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn lookup(registry: &VersionMappingRegistry, name: &str) -> Result<VersionMapping, CliError> {
    registry.mapping(name).ok_or_else(|| CliError::UnknownFeature {
        name: name.to_owned(),
        available: registry.features().join(", "),
    })
}

fn availability_label(registry: &VersionMappingRegistry, feature: &str, version: Option<&DeviceVersion>) -> String {
    match version {
        None => "-".to_owned(),
        Some(_) if registry.is_feature_available(feature, version) => "yes".to_owned(),
        Some(_) => "no".to_owned(),
    }
}

fn describe(m: &VersionMapping) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "feature: {}", m.feature);
    if let Some(min) = &m.min_version {
        let _ = writeln!(out, "min version: {min}");
    }
    if let Some(note) = &m.note {
        let _ = writeln!(out, "note: {note}");
    }
    for p in &m.path_mappings {
        let _ = writeln!(
            out,
            "path {}: ros6={} ros7={}",
            p.canonical_path,
            p.ros6_path.as_deref().unwrap_or("-"),
            p.ros7_path.as_deref().unwrap_or("-"),
        );
    }
    for f in &m.field_mappings {
        let _ = writeln!(
            out,
            "field {} {}: ros6={} ros7={}",
            f.path,
            f.canonical_field,
            f.ros6_field.as_deref().unwrap_or("-"),
            f.ros7_field.as_deref().unwrap_or("-"),
        );
    }
    out.trim_end().to_owned()
}
