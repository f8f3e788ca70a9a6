// ── Translator ──
//
// Logical (camelCase, typed) <-> device (kebab-case, text) in both
// directions. Holds the field registry, an optional version registry, and
// the cached device version. All methods take `&self`; the version cache is
// an `ArcSwapOption` so the read path never locks.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tracing::{debug, trace};

use crate::error::CoreError;
use crate::mapping::{self, FieldMappingRegistry, codec, kebab_to_camel};
use crate::model::{
    Action, CanonicalCommand, CanonicalResponse, CommandMetadata, DeviceVersion, Filter, Record, ResponseData, Value,
};
use crate::version::{VersionMappingRegistry, apply_version_mapping};

/// Logical field whose value maps onto the device's inverted `disabled` flag.
const ENABLED: &str = "enabled";
const DISABLED: &str = "disabled";

/// One logical operation before translation. Field, filter, and proplist
/// names are logical (camelCase).
#[derive(Debug, Clone)]
pub struct TranslateInput {
    pub path: String,
    pub action: Action,
    pub id: Option<String>,
    pub fields: Record,
    pub filters: Record,
    pub proplist: Vec<String>,
    pub metadata: CommandMetadata,
}

impl TranslateInput {
    pub fn new(path: impl Into<String>, action: Action) -> Self {
        Self {
            path: path.into(),
            action,
            id: None,
            fields: Record::new(),
            filters: Record::new(),
            proplist: Vec::new(),
            metadata: CommandMetadata::default(),
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_filter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_proplist<S: Into<String>>(mut self, props: impl IntoIterator<Item = S>) -> Self {
        self.proplist = props.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: CommandMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

pub struct Translator {
    registry: Arc<FieldMappingRegistry>,
    versions: Option<Arc<VersionMappingRegistry>>,
    version: ArcSwapOption<DeviceVersion>,
    infer_types: bool,
}

impl Default for Translator {
    fn default() -> Self {
        Self::new(Arc::new(mapping::default_registry()))
    }
}

impl std::fmt::Debug for Translator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Translator")
            .field("mappings", &self.registry.len())
            .field("version", &self.version())
            .field("version_mapping", &self.versions.is_some())
            .field("infer_types", &self.infer_types)
            .finish()
    }
}

impl Translator {
    pub fn new(registry: Arc<FieldMappingRegistry>) -> Self {
        Self {
            registry,
            versions: None,
            version: ArcSwapOption::empty(),
            infer_types: false,
        }
    }

    /// Rewrite paths and fields for the device version on every translation.
    #[must_use]
    pub fn with_version_registry(mut self, versions: Arc<VersionMappingRegistry>) -> Self {
        self.versions = Some(versions);
        self
    }

    #[must_use]
    pub fn with_version(self, version: DeviceVersion) -> Self {
        self.set_version(Some(version));
        self
    }

    /// Guess bool/int types for fields with no registered mapping.
    #[must_use]
    pub fn with_type_inference(mut self, enabled: bool) -> Self {
        self.infer_types = enabled;
        self
    }

    pub fn registry(&self) -> &Arc<FieldMappingRegistry> {
        &self.registry
    }

    pub fn version_registry(&self) -> Option<&Arc<VersionMappingRegistry>> {
        self.versions.as_ref()
    }

    pub fn version(&self) -> Option<DeviceVersion> {
        self.version.load_full().map(|v| (*v).clone())
    }

    pub fn has_version(&self) -> bool {
        self.version.load().is_some()
    }

    pub fn set_version(&self, version: Option<DeviceVersion>) {
        self.version.store(version.map(Arc::new));
    }

    // ── Logical -> device ────────────────────────────────────────────

    pub fn translate_to_canonical(&self, input: TranslateInput) -> Result<CanonicalCommand, CoreError> {
        let TranslateInput {
            path,
            action,
            id,
            fields,
            filters,
            proplist,
            metadata,
        } = input;

        let mut builder = CanonicalCommand::builder()
            .path(path.as_str())
            .action(action)
            .maybe_version(self.version())
            .metadata(metadata);
        if let Some(id) = id {
            builder = builder.id(id);
        }

        for (logical, value) in &fields {
            let (device, value) = self.encode_field(&path, logical, value);
            builder = builder.param(device, value);
        }
        for (logical, value) in &filters {
            let (device, value) = self.encode_field(&path, logical, value);
            builder = builder.filter_eq(device, value);
        }
        if !proplist.is_empty() {
            builder = builder.proplist(proplist.iter().map(|p| self.device_name(&path, p)));
        }

        let mut cmd = builder.try_build()?;
        if let Some(versions) = &self.versions {
            cmd = apply_version_mapping(cmd, versions);
        }

        debug!(
            path = cmd.path(),
            action = %cmd.action(),
            params = cmd.parameters().len(),
            filters = cmd.filters().len(),
            "translated to canonical"
        );
        Ok(cmd)
    }

    pub fn translate_query(
        &self,
        path: &str,
        filters: Record,
        proplist: Vec<String>,
        metadata: CommandMetadata,
    ) -> Result<CanonicalCommand, CoreError> {
        self.translate_to_canonical(TranslateInput {
            filters,
            proplist,
            metadata,
            ..TranslateInput::new(path, Action::Print)
        })
    }

    pub fn translate_get(&self, path: &str, id: &str, metadata: CommandMetadata) -> Result<CanonicalCommand, CoreError> {
        self.translate_to_canonical(TranslateInput::new(path, Action::Get).with_id(id).with_metadata(metadata))
    }

    pub fn translate_create(
        &self,
        path: &str,
        fields: Record,
        metadata: CommandMetadata,
    ) -> Result<CanonicalCommand, CoreError> {
        self.translate_to_canonical(TranslateInput {
            fields,
            metadata,
            ..TranslateInput::new(path, Action::Add)
        })
    }

    pub fn translate_update(
        &self,
        path: &str,
        id: &str,
        fields: Record,
        metadata: CommandMetadata,
    ) -> Result<CanonicalCommand, CoreError> {
        self.translate_to_canonical(TranslateInput {
            fields,
            metadata,
            ..TranslateInput::new(path, Action::Set).with_id(id)
        })
    }

    pub fn translate_delete(
        &self,
        path: &str,
        id: &str,
        metadata: CommandMetadata,
    ) -> Result<CanonicalCommand, CoreError> {
        self.translate_to_canonical(TranslateInput::new(path, Action::Remove).with_id(id).with_metadata(metadata))
    }

    /// Path mapping, then the global fallback, then kebab-case.
    fn device_name(&self, path: &str, logical: &str) -> String {
        self.registry
            .mapping(path, logical)
            .map_or_else(|| self.registry.translate_field_name(logical), |m| m.device_field)
    }

    fn encode_field(&self, path: &str, logical: &str, value: &Value) -> (String, Value) {
        if logical == ENABLED {
            if let Value::Bool(enabled) = value {
                return (DISABLED.to_owned(), Value::Bool(!enabled));
            }
        }
        match self.registry.mapping(path, logical) {
            Some(m) => (m.device_field, codec::encode(value, m.field_type)),
            None => (self.registry.translate_field_name(logical), value.clone()),
        }
    }

    // ── Device -> logical ────────────────────────────────────────────

    /// Decode every record in a successful response. Failures and raw text
    /// pass through untouched.
    pub fn translate_response(&self, path: &str, response: CanonicalResponse) -> CanonicalResponse {
        if !response.success {
            return response;
        }
        let CanonicalResponse {
            success,
            data,
            id,
            error,
            metadata,
        } = response;

        let data = data.map(|data| match data {
            ResponseData::Record(record) => ResponseData::Record(self.translate_record(path, &record)),
            ResponseData::Records(records) => {
                ResponseData::Records(records.iter().map(|r| self.translate_record(path, r)).collect())
            }
            raw @ ResponseData::Raw(_) => raw,
        });

        CanonicalResponse {
            success,
            data,
            id,
            error,
            metadata,
        }
    }

    /// Pairwise `translate_response` over parallel slices.
    pub fn translate_batch_responses<P: AsRef<str>>(
        &self,
        paths: &[P],
        responses: Vec<CanonicalResponse>,
    ) -> Result<Vec<CanonicalResponse>, CoreError> {
        if paths.len() != responses.len() {
            return Err(CoreError::BatchLengthMismatch {
                paths: paths.len(),
                responses: responses.len(),
            });
        }
        Ok(paths
            .iter()
            .zip(responses)
            .map(|(path, resp)| self.translate_response(path.as_ref(), resp))
            .collect())
    }

    pub fn translate_record(&self, path: &str, record: &Record) -> Record {
        let mut out = Record::with_capacity(record.len());
        for (device, value) in record {
            let (logical, value) = self.decode_field(path, device, value);
            trace!(path, device = device.as_str(), logical = logical.as_str(), "decoded field");
            out.insert(logical, value);
        }
        out
    }

    fn decode_field(&self, path: &str, device: &str, value: &Value) -> (String, Value) {
        if device == DISABLED {
            return (ENABLED.to_owned(), invert(value));
        }
        let logical = self
            .registry
            .logical_field(path, device)
            .unwrap_or_else(|| kebab_to_camel(device));
        let value = match self.registry.mapping(path, &logical) {
            Some(m) => codec::decode(value, m.field_type),
            None if self.infer_types => codec::infer(value),
            None => value.clone(),
        };
        (logical, value)
    }
}

fn invert(value: &Value) -> Value {
    match value {
        Value::Bool(b) => Value::Bool(!b),
        Value::Str(s) => Value::Bool(!codec::parse_bool(s)),
        other => other.clone(),
    }
}

/// Structural cleanup for records that bypass the registry: `.id` becomes
/// `id` and `disabled` becomes an inverted `enabled`. Other keys are kept.
pub fn normalize_record(record: &Record) -> Record {
    record
        .iter()
        .map(|(key, value)| match key.as_str() {
            ".id" => ("id".to_owned(), value.clone()),
            DISABLED => (ENABLED.to_owned(), invert(value)),
            _ => (key.clone(), value.clone()),
        })
        .collect()
}
