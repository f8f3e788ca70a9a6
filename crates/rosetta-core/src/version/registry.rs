// ── Version mapping registry ──
//
// Per-feature path and field overrides for RouterOS 6 vs 7, flattened into
// two direct lookup tables. Selection rule for both tables: a 7.x device
// takes the ros7 override when one is set, a 6.x device takes the ros6
// override when one is set, everything else keeps the canonical name.

use std::path::Path;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::mapping::kebab_to_camel;
use crate::model::{CanonicalCommand, DeviceVersion, Filter};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathMapping {
    #[serde(alias = "canonical_path")]
    pub canonical_path: String,
    #[serde(default, alias = "ros6_path", skip_serializing_if = "Option::is_none")]
    pub ros6_path: Option<String>,
    #[serde(default, alias = "ros7_path", skip_serializing_if = "Option::is_none")]
    pub ros7_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldVersionMapping {
    pub path: String,
    #[serde(alias = "canonical_field")]
    pub canonical_field: String,
    #[serde(default, alias = "ros6_field", skip_serializing_if = "Option::is_none")]
    pub ros6_field: Option<String>,
    #[serde(default, alias = "ros7_field", skip_serializing_if = "Option::is_none")]
    pub ros7_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// One named feature: its minimum OS version and the renames it brings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionMapping {
    pub feature: String,
    #[serde(default, alias = "min_version", skip_serializing_if = "Option::is_none")]
    pub min_version: Option<DeviceVersion>,
    #[serde(default, alias = "path_mappings", skip_serializing_if = "Vec::is_empty")]
    pub path_mappings: Vec<PathMapping>,
    #[serde(default, alias = "field_mappings", skip_serializing_if = "Vec::is_empty")]
    pub field_mappings: Vec<FieldVersionMapping>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl VersionMapping {
    pub fn new(feature: impl Into<String>) -> Self {
        Self {
            feature: feature.into(),
            min_version: None,
            path_mappings: Vec::new(),
            field_mappings: Vec::new(),
            note: None,
        }
    }
}

/// TOML files hold `[[mapping]]` tables.
#[derive(Deserialize)]
struct TomlMappings {
    #[serde(default)]
    mapping: Vec<VersionMapping>,
}

fn select<'a>(canonical: &'a str, ros6: Option<&'a str>, ros7: Option<&'a str>, version: &DeviceVersion) -> &'a str {
    let pick = if version.is_ros7() {
        ros7
    } else if version.is_ros6() {
        ros6
    } else {
        None
    };
    pick.filter(|s| !s.is_empty()).unwrap_or(canonical)
}

#[derive(Debug, Default)]
struct Tables {
    features: IndexMap<String, VersionMapping>,
    paths: IndexMap<String, PathMapping>,
    /// Keyed by `(path, canonical field)`.
    fields: IndexMap<(String, String), FieldVersionMapping>,
}

#[derive(Debug, Default)]
pub struct VersionMappingRegistry {
    tables: RwLock<Tables>,
}

impl VersionMappingRegistry {
    /// Empty registry. Use [`crate::version::default_version_registry`] for the stock set.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register(&self, mapping: VersionMapping) {
        let mut tables = self.write();
        for pm in &mapping.path_mappings {
            tables.paths.insert(pm.canonical_path.clone(), pm.clone());
        }
        for fm in &mapping.field_mappings {
            tables
                .fields
                .insert((fm.path.clone(), fm.canonical_field.clone()), fm.clone());
        }
        tables.features.insert(mapping.feature.clone(), mapping);
    }

    pub fn register_all(&self, mappings: impl IntoIterator<Item = VersionMapping>) {
        for mapping in mappings {
            self.register(mapping);
        }
    }

    /// Device path for `canonical_path` on `version`. No version, no rewrite.
    pub fn get_path(&self, canonical_path: &str, version: Option<&DeviceVersion>) -> String {
        let Some(version) = version else {
            return canonical_path.to_owned();
        };
        let tables = self.read();
        match tables.paths.get(canonical_path) {
            Some(pm) => select(canonical_path, pm.ros6_path.as_deref(), pm.ros7_path.as_deref(), version).to_owned(),
            None => canonical_path.to_owned(),
        }
    }

    /// Device field for `(path, canonical_field)` on `version`.
    pub fn get_field(&self, path: &str, canonical_field: &str, version: Option<&DeviceVersion>) -> String {
        self.lookup_field(path, canonical_field, version)
            .unwrap_or_else(|| canonical_field.to_owned())
    }

    fn lookup_field(&self, path: &str, field: &str, version: Option<&DeviceVersion>) -> Option<String> {
        let version = version?;
        let tables = self.read();
        let fm = tables.fields.get(&(path.to_owned(), field.to_owned()))?;
        Some(select(field, fm.ros6_field.as_deref(), fm.ros7_field.as_deref(), version).to_owned())
    }

    /// Unknown features, features without a minimum, and unversioned callers
    /// are all allowed.
    pub fn is_feature_available(&self, feature: &str, version: Option<&DeviceVersion>) -> bool {
        let tables = self.read();
        let Some(min) = tables.features.get(feature).and_then(|m| m.min_version.as_ref()) else {
            return true;
        };
        version.is_none_or(|v| v.is_at_least(min.major, min.minor))
    }

    /// Registered feature names, sorted.
    pub fn features(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().features.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn mapping(&self, feature: &str) -> Option<VersionMapping> {
        self.read().features.get(feature).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ── Loading ──────────────────────────────────────────────────────

    /// Register every mapping in a JSON array. Returns how many were loaded.
    pub fn load_json(&self, text: &str) -> Result<usize, CoreError> {
        let mappings: Vec<VersionMapping> = serde_json::from_str(text)?;
        let count = mappings.len();
        self.register_all(mappings);
        Ok(count)
    }

    pub fn load_toml(&self, text: &str) -> Result<usize, CoreError> {
        let parsed: TomlMappings =
            toml::from_str(text).map_err(|e| CoreError::MappingParse(e.to_string()))?;
        let count = parsed.mapping.len();
        self.register_all(parsed.mapping);
        Ok(count)
    }

    /// Load a `.toml` file as TOML and anything else as JSON.
    pub fn load_file(&self, path: &Path) -> Result<usize, CoreError> {
        let text = std::fs::read_to_string(path).map_err(|source| CoreError::MappingRead {
            path: path.to_path_buf(),
            source,
        })?;
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        if is_toml {
            self.load_toml(&text)
        } else {
            self.load_json(&text)
        }
    }
}

// ── Command rewriting ───────────────────────────────────────────────

/// Rewrite a command's path and field names for its target version.
///
/// Field overrides are looked up against the command's path *before* the
/// rewrite. Parameter keys are already device names, so a key with no
/// override of its own is retried under its camelCase logical name.
pub fn apply_version_mapping(mut cmd: CanonicalCommand, registry: &VersionMappingRegistry) -> CanonicalCommand {
    let version = cmd.version().cloned();
    let version = version.as_ref();
    let original_path = cmd.path().to_owned();

    let rewrite = |field: &str| -> String {
        registry
            .lookup_field(&original_path, field, version)
            .or_else(|| registry.lookup_field(&original_path, &kebab_to_camel(field), version))
            .unwrap_or_else(|| field.to_owned())
    };

    let params = std::mem::take(cmd.parameters_mut());
    *cmd.parameters_mut() = params.into_iter().map(|(k, v)| (rewrite(&k), v)).collect();

    let filters = std::mem::take(cmd.filters_mut());
    *cmd.filters_mut() = filters
        .into_iter()
        .map(|f| Filter {
            field: rewrite(&f.field),
            ..f
        })
        .collect();

    let proplist = std::mem::take(cmd.proplist_mut());
    *cmd.proplist_mut() = proplist.iter().map(|p| rewrite(p)).collect();

    let path = registry.get_path(&original_path, version);
    cmd.set_path(path);
    cmd
}
