//! Layered configuration for RouterOS translation tools.
//!
//! Defaults, then a TOML file, then `ROSETTA_*` environment variables
//! (nested keys split on `__`, e.g. `ROSETTA_TRANSLATOR__INFER_TYPES=true`).
//! The result builds the field and version mapping registries and a
//! ready-to-use [`Translator`]; the core crates never read files themselves.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use rosetta_core::mapping::default_registry;
use rosetta_core::version::default_version_registry;
use rosetta_core::{
    CoreError, DeviceVersion, FieldMapping, FieldMappingRegistry, Translator, VersionMapping, VersionMappingRegistry,
};

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "ROSETTA_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error(transparent)]
    Mapping(#[from] CoreError),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub translator: TranslatorSettings,

    #[serde(default)]
    pub output: OutputSettings,

    /// Extra field mappings, registered over the built-in set.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub field_mappings: Vec<FieldMapping>,

    /// Extra version mappings, registered over the built-in set.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub version_mappings: Vec<VersionMapping>,

    /// JSON or TOML version mapping files, loaded after `version_mappings`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub version_mapping_files: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TranslatorSettings {
    /// Device version assumed when none is known. Write it as a string
    /// (`"7.10"`); a bare number loses trailing zeros.
    #[serde(default, with = "version_setting", skip_serializing_if = "Option::is_none")]
    pub default_version: Option<DeviceVersion>,

    /// Guess bool/int types for fields without a mapping.
    #[serde(default)]
    pub infer_types: bool,

    /// Apply RouterOS 6/7 path and field rewriting.
    #[serde(default = "default_true")]
    pub version_mapping: bool,
}

impl Default for TranslatorSettings {
    fn default() -> Self {
        Self {
            default_version: None,
            infer_types: false,
            version_mapping: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OutputSettings {
    #[serde(default = "default_format")]
    pub format: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            format: default_format(),
            color: default_color(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_format() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

/// Versions are written as text; environment values arrive as numbers.
mod version_setting {
    use rosetta_core::DeviceVersion;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Version(DeviceVersion),
        Major(u32),
        Number(f64),
    }

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(version: &Option<DeviceVersion>, serializer: S) -> Result<S::Ok, S::Error> {
        match version {
            Some(v) => serializer.serialize_str(&v.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DeviceVersion>, D::Error> {
        let Some(repr) = Option::<Repr>::deserialize(deserializer)? else {
            return Ok(None);
        };
        let version = match repr {
            Repr::Version(v) => v,
            Repr::Major(major) => DeviceVersion::new(major, 0),
            Repr::Number(n) => n.to_string().parse().map_err(serde::de::Error::custom)?,
        };
        Ok(Some(version))
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "rosetta", "rosetta").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("rosetta");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// `ROSETTA_*` variables that belong to CLI flags, not config keys.
const CLI_ONLY_ENV: &[&str] = &["config", "output", "ros_version"];

/// The provider stack: defaults, the TOML file at `path`, then environment.
pub fn figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__").ignore(CLI_ONLY_ENV))
}

/// Load from an explicit file, which must exist, or from the default
/// location, which may be absent.
pub fn load_config(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    let path = match explicit {
        Some(path) if !path.is_file() => {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        Some(path) => path.to_path_buf(),
        None => config_path(),
    };
    debug!(path = %path.display(), "loading config");

    let config: Config = figment(&path).extract()?;
    config.validate()?;
    Ok(config)
}

// ── Registry construction ───────────────────────────────────────────

impl Config {
    fn validate(&self) -> Result<(), ConfigError> {
        for (i, m) in self.field_mappings.iter().enumerate() {
            let field = || format!("field_mappings[{i}]");
            if !m.path.starts_with('/') {
                return Err(ConfigError::Validation {
                    field: field(),
                    reason: format!("path must start with '/', got '{}'", m.path),
                });
            }
            if m.logical_field.is_empty() || m.device_field.is_empty() {
                return Err(ConfigError::Validation {
                    field: field(),
                    reason: "logical_field and device_field must be non-empty".into(),
                });
            }
        }
        if let Some(m) = self.version_mappings.iter().find(|m| m.feature.is_empty()) {
            return Err(ConfigError::Validation {
                field: "version_mappings".into(),
                reason: format!("mapping with {} path rule(s) has no feature name", m.path_mappings.len()),
            });
        }
        Ok(())
    }

    /// Built-in field mappings plus `field_mappings`.
    pub fn field_registry(&self) -> FieldMappingRegistry {
        let registry = default_registry();
        registry.register_all(self.field_mappings.iter().cloned());
        debug!(extra = self.field_mappings.len(), total = registry.len(), "field mappings ready");
        registry
    }

    /// Built-in version mappings, then `version_mappings`, then each file
    /// in `version_mapping_files` in order. Later entries replace earlier
    /// ones for the same feature.
    pub fn version_registry(&self) -> Result<VersionMappingRegistry, ConfigError> {
        let registry = default_version_registry();
        registry.register_all(self.version_mappings.iter().cloned());
        for path in &self.version_mapping_files {
            let loaded = registry.load_file(path)?;
            debug!(path = %path.display(), loaded, "loaded version mappings");
        }
        Ok(registry)
    }

    pub fn translator(&self) -> Result<Translator, ConfigError> {
        let mut translator =
            Translator::new(Arc::new(self.field_registry())).with_type_inference(self.translator.infer_types);
        if self.translator.version_mapping {
            translator = translator.with_version_registry(Arc::new(self.version_registry()?));
        }
        if let Some(version) = &self.translator.default_version {
            translator = translator.with_version(version.clone());
        }
        Ok(translator)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
