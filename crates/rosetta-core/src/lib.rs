//! Command/response translation layer for RouterOS devices.
//!
//! Logical operations (camelCase fields, typed values) are translated into a
//! protocol-neutral [`CanonicalCommand`], rewritten for the device's OS
//! generation, and rendered for one of three wire formats: binary API
//! sentences, REST requests, or CLI scripts. Device replies travel the same
//! road backwards into a [`CanonicalResponse`] with logical field names.
//!
//! Nothing here performs I/O; transports live behind the `RouterPort`
//! contract in `rosetta-port`.

pub mod classify;
pub mod error;
pub mod format;
pub mod mapping;
pub mod model;
pub mod translator;
pub mod version;

pub use classify::classify_message;
pub use error::CoreError;
pub use format::{Formatter, Rendered, formatter_for};
pub use mapping::{FieldMapping, FieldMappingRegistry, FieldType};
pub use model::{
    Action, CanonicalCommand, CanonicalResponse, CommandBuilder, CommandError, CommandMetadata, DeviceVersion,
    ErrorCategory, Filter, FilterOp, Protocol, Record, ResponseData, ResponseMetadata, Value,
};
pub use translator::{TranslateInput, Translator, normalize_record};
pub use version::{VersionMapping, VersionMappingRegistry, apply_version_mapping};
