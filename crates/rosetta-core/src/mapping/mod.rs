//! Logical <-> device field names and typed value transcoding.

pub mod codec;
mod defaults;
pub mod naming;
mod registry;

pub use codec::FieldType;
pub use defaults::{default_field_mappings, default_registry};
pub use naming::{camel_to_kebab, kebab_to_camel};
pub use registry::{FieldMapping, FieldMappingRegistry};
