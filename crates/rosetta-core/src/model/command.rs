// ── Canonical command ──
//
// Protocol-agnostic description of one operation against a device path.
// Parameter and filter keys are always device field names: translation from
// logical names happens before a command is built.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use super::value::{Record, Value};
use super::version::DeviceVersion;
use crate::error::CoreError;

// ── Action ──────────────────────────────────────────────────────────

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum Action {
    #[strum(to_string = "get")]
    Get,
    #[serde(alias = "list")]
    #[strum(to_string = "print", serialize = "list")]
    Print,
    #[strum(to_string = "add")]
    Add,
    #[strum(to_string = "set")]
    Set,
    #[strum(to_string = "remove")]
    Remove,
    #[strum(to_string = "enable")]
    Enable,
    #[strum(to_string = "disable")]
    Disable,
    #[strum(to_string = "move")]
    Move,
}

impl Action {
    /// Actions that address one existing item.
    pub fn targets_item(self) -> bool {
        matches!(
            self,
            Self::Get | Self::Set | Self::Remove | Self::Enable | Self::Disable | Self::Move
        )
    }

    /// Actions that carry parameters to the device.
    pub fn carries_parameters(self) -> bool {
        matches!(self, Self::Add | Self::Set)
    }
}

// ── Filters ─────────────────────────────────────────────────────────

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
pub enum FilterOp {
    #[default]
    #[serde(rename = "=")]
    #[strum(to_string = "=")]
    Eq,
    #[serde(rename = "!=")]
    #[strum(to_string = "!=")]
    Ne,
    #[serde(rename = ">")]
    #[strum(to_string = ">")]
    Gt,
    #[serde(rename = "<")]
    #[strum(to_string = "<")]
    Lt,
    #[serde(rename = ">=")]
    #[strum(to_string = ">=")]
    Ge,
    #[serde(rename = "<=")]
    #[strum(to_string = "<=")]
    Le,
    /// Regex / substring match.
    #[serde(rename = "~")]
    #[strum(to_string = "~")]
    Contains,
    #[serde(rename = "in")]
    #[strum(to_string = "in")]
    In,
}

impl FilterOp {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Le => "<=",
            Self::Contains => "~",
            Self::In => "in",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    #[serde(rename = "operator", default)]
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Eq, value)
    }
}

// ── Metadata ────────────────────────────────────────────────────────

/// Opaque request context. Carried through untouched for logging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub router_id: Option<String>,
}

impl CommandMetadata {
    pub fn is_empty(&self) -> bool {
        self.request_id.is_none()
            && self.operation_name.is_none()
            && self.field_path.is_none()
            && self.router_id.is_none()
    }
}

// ── CanonicalCommand ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalCommand {
    path: String,
    action: Action,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Record::is_empty")]
    parameters: Record,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    filters: Vec<Filter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    proplist: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<DeviceVersion>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "duration_text")]
    timeout: Option<Duration>,
    #[serde(default, skip_serializing_if = "CommandMetadata::is_empty")]
    metadata: CommandMetadata,
}

impl CanonicalCommand {
    pub fn builder() -> CommandBuilder {
        CommandBuilder::default()
    }

    // ── Shorthand builders ──────────────────────────────────────────

    pub fn print(path: impl Into<String>) -> CommandBuilder {
        CommandBuilder::default().path(path).action(Action::Print)
    }

    pub fn get(path: impl Into<String>, id: impl Into<String>) -> CommandBuilder {
        CommandBuilder::default().path(path).action(Action::Get).id(id)
    }

    pub fn add(path: impl Into<String>) -> CommandBuilder {
        CommandBuilder::default().path(path).action(Action::Add)
    }

    pub fn set(path: impl Into<String>, id: impl Into<String>) -> CommandBuilder {
        CommandBuilder::default().path(path).action(Action::Set).id(id)
    }

    pub fn remove(path: impl Into<String>, id: impl Into<String>) -> CommandBuilder {
        CommandBuilder::default().path(path).action(Action::Remove).id(id)
    }

    /// No implicit parameters: the `disabled=no` flag is a formatter concern.
    pub fn enable(path: impl Into<String>, id: impl Into<String>) -> CommandBuilder {
        CommandBuilder::default().path(path).action(Action::Enable).id(id)
    }

    pub fn disable(path: impl Into<String>, id: impl Into<String>) -> CommandBuilder {
        CommandBuilder::default().path(path).action(Action::Disable).id(id)
    }

    pub fn move_item(path: impl Into<String>, id: impl Into<String>) -> CommandBuilder {
        CommandBuilder::default().path(path).action(Action::Move).id(id)
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn parameters(&self) -> &Record {
        &self.parameters
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn proplist(&self) -> &[String] {
        &self.proplist
    }

    pub fn version(&self) -> Option<&DeviceVersion> {
        self.version.as_ref()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn metadata(&self) -> &CommandMetadata {
        &self.metadata
    }

    /// Request context is the one part a caller may fill in after the
    /// command is built, e.g. stamping a request id on loaded commands.
    pub fn metadata_mut(&mut self) -> &mut CommandMetadata {
        &mut self.metadata
    }

    // Field rewriting is reserved for version mapping inside the crate.
    pub(crate) fn set_path(&mut self, path: String) {
        self.path = path;
    }

    pub(crate) fn parameters_mut(&mut self) -> &mut Record {
        &mut self.parameters
    }

    pub(crate) fn filters_mut(&mut self) -> &mut Vec<Filter> {
        &mut self.filters
    }

    pub(crate) fn proplist_mut(&mut self) -> &mut Vec<String> {
        &mut self.proplist
    }
}

// ── Builder ─────────────────────────────────────────────────────────

/// Fluent builder for [`CanonicalCommand`].
///
/// `build()` treats a missing path or action as a programming error and
/// panics; use `try_build()` when the inputs come from outside the program.
#[derive(Debug, Clone, Default)]
pub struct CommandBuilder {
    path: Option<String>,
    action: Option<Action>,
    id: Option<String>,
    parameters: Record,
    filters: Vec<Filter>,
    proplist: Vec<String>,
    version: Option<DeviceVersion>,
    timeout: Option<Duration>,
    metadata: CommandMetadata,
}

impl CommandBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Merge parameters; later keys overwrite earlier ones.
    pub fn params<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.parameters
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn filter(mut self, field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::new(field, op, value));
        self
    }

    pub fn filter_eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(field, FilterOp::Eq, value)
    }

    pub fn filters(mut self, filters: impl IntoIterator<Item = Filter>) -> Self {
        self.filters.extend(filters);
        self
    }

    pub fn proplist<S: Into<String>>(mut self, props: impl IntoIterator<Item = S>) -> Self {
        self.proplist = props.into_iter().map(Into::into).collect();
        self
    }

    pub fn version(mut self, version: DeviceVersion) -> Self {
        self.version = Some(version);
        self
    }

    pub fn maybe_version(mut self, version: Option<DeviceVersion>) -> Self {
        self.version = version;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn metadata(mut self, metadata: CommandMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn request_id(mut self, id: impl Into<String>) -> Self {
        self.metadata.request_id = Some(id.into());
        self
    }

    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        self.metadata.operation_name = Some(name.into());
        self
    }

    pub fn field_path(mut self, path: impl Into<String>) -> Self {
        self.metadata.field_path = Some(path.into());
        self
    }

    pub fn router_id(mut self, id: impl Into<String>) -> Self {
        self.metadata.router_id = Some(id.into());
        self
    }

    pub fn try_build(self) -> Result<CanonicalCommand, CoreError> {
        let path = self
            .path
            .filter(|p| !p.is_empty())
            .ok_or(CoreError::MissingField("path"))?;
        let action = self.action.ok_or(CoreError::MissingField("action"))?;

        Ok(CanonicalCommand {
            path,
            action,
            id: self.id.filter(|id| !id.is_empty()),
            parameters: self.parameters,
            filters: self.filters,
            proplist: self.proplist,
            version: self.version,
            timeout: self.timeout.filter(|t| !t.is_zero()),
            metadata: self.metadata,
        })
    }

    pub fn build(self) -> CanonicalCommand {
        match self.try_build() {
            Ok(cmd) => cmd,
            Err(err) => panic!("CommandBuilder::build: {err}"),
        }
    }
}

// ── Serde helpers ───────────────────────────────────────────────────

/// Optional durations as humantime text ("30s", "1m 30s").
mod duration_text {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_str(&humantime::format_duration(*d).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        let text: Option<String> = Option::deserialize(deserializer)?;
        text.map(|t| humantime::parse_duration(&t).map_err(serde::de::Error::custom))
            .transpose()
    }
}
