//! RouterOS 6 / 7 path and field rewriting, plus feature gating.

mod defaults;
mod registry;

pub use defaults::{default_version_mappings, default_version_registry};
pub use registry::{
    FieldVersionMapping, PathMapping, VersionMapping, VersionMappingRegistry, apply_version_mapping,
};
