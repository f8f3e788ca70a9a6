// ── Field mapping registry ──
//
// Three lookup tables over the same set of mappings:
//   path -> logical field -> mapping
//   logical field -> device field    (global fallback, path-independent)
//   path -> device field -> logical  (reverse, for responses)
//
// Built once, read by every translation. Writes take the lock exclusively;
// a poisoned lock is recovered rather than propagated since the tables are
// always left consistent between statements.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::codec::FieldType;
use super::naming::camel_to_kebab;

/// How one logical field maps onto a device field at a given path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    #[serde(alias = "logicalField")]
    pub logical_field: String,
    #[serde(alias = "deviceField")]
    pub device_field: String,
    pub path: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
}

impl FieldMapping {
    pub fn new(
        path: impl Into<String>,
        logical_field: impl Into<String>,
        device_field: impl Into<String>,
        field_type: FieldType,
    ) -> Self {
        Self {
            logical_field: logical_field.into(),
            device_field: device_field.into(),
            path: path.into(),
            field_type,
        }
    }
}

#[derive(Debug, Default)]
struct Tables {
    by_path: IndexMap<String, IndexMap<String, FieldMapping>>,
    logical_to_device: IndexMap<String, String>,
    reverse: IndexMap<String, IndexMap<String, String>>,
    count: usize,
}

#[derive(Debug, Default)]
pub struct FieldMappingRegistry {
    tables: RwLock<Tables>,
}

impl FieldMappingRegistry {
    /// Empty registry. Use [`crate::mapping::default_registry`] for the stock set.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add or replace the mapping for `(path, logical_field)`.
    pub fn register(&self, mapping: FieldMapping) {
        let mut tables = self.write();
        let Tables {
            by_path,
            logical_to_device,
            reverse,
            count,
        } = &mut *tables;

        let previous = by_path
            .entry(mapping.path.clone())
            .or_default()
            .insert(mapping.logical_field.clone(), mapping.clone());

        match previous {
            // Drop the stale reverse entry when the device name changed.
            Some(old) if old.device_field != mapping.device_field => {
                if let Some(rev) = reverse.get_mut(&old.path) {
                    if rev.get(&old.device_field) == Some(&old.logical_field) {
                        rev.shift_remove(&old.device_field);
                    }
                }
            }
            Some(_) => {}
            None => *count += 1,
        }

        logical_to_device.insert(mapping.logical_field.clone(), mapping.device_field.clone());
        reverse
            .entry(mapping.path)
            .or_default()
            .insert(mapping.device_field, mapping.logical_field);
    }

    pub fn register_all(&self, mappings: impl IntoIterator<Item = FieldMapping>) {
        for mapping in mappings {
            self.register(mapping);
        }
    }

    /// Global logical -> device lookup, ignoring path.
    pub fn device_field(&self, logical_field: &str) -> Option<String> {
        self.read().logical_to_device.get(logical_field).cloned()
    }

    pub fn logical_field(&self, path: &str, device_field: &str) -> Option<String> {
        self.read()
            .reverse
            .get(path)
            .and_then(|fields| fields.get(device_field))
            .cloned()
    }

    pub fn mapping(&self, path: &str, logical_field: &str) -> Option<FieldMapping> {
        self.read()
            .by_path
            .get(path)
            .and_then(|fields| fields.get(logical_field))
            .cloned()
    }

    /// The mapping whose device name is `device_field` at `path`.
    pub fn mapping_for_device(&self, path: &str, device_field: &str) -> Option<FieldMapping> {
        let tables = self.read();
        let logical = tables.reverse.get(path)?.get(device_field)?;
        tables.by_path.get(path)?.get(logical).cloned()
    }

    /// All mappings at `path`, keyed by logical field. Empty when none exist.
    pub fn mappings_for_path(&self, path: &str) -> IndexMap<String, FieldMapping> {
        self.read().by_path.get(path).cloned().unwrap_or_default()
    }

    /// Registered device name, else the structural kebab-case conversion.
    pub fn translate_field_name(&self, logical_field: &str) -> String {
        self.device_field(logical_field)
            .unwrap_or_else(|| camel_to_kebab(logical_field))
    }

    pub fn len(&self) -> usize {
        self.read().count
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.read().by_path.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Every mapping, grouped by path in sorted path order.
    pub fn all(&self) -> Vec<FieldMapping> {
        let tables = self.read();
        let mut paths: Vec<&String> = tables.by_path.keys().collect();
        paths.sort();
        paths
            .into_iter()
            .flat_map(|p| tables.by_path[p].values().cloned())
            .collect()
    }
}
