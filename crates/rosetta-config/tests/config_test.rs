#![allow(clippy::unwrap_used)]
// Config loading from files and registry construction.

use std::io::Write;
use std::path::Path;

use pretty_assertions::assert_eq;
use tempfile::{NamedTempFile, TempDir};

use rosetta_config::{ConfigError, load_config};
use rosetta_core::{Action, DeviceVersion, FieldType, TranslateInput, Value};

fn write_config(text: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file
}

// ── Loading ─────────────────────────────────────────────────────────

#[test]
fn test_explicit_missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let err = load_config(Some(&dir.path().join("absent.toml"))).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound { .. }));
}

#[test]
fn test_file_values_override_defaults() {
    let file = write_config(
        r#"
[translator]
default_version = "6.49"
infer_types = true

[output]
format = "json"
"#,
    );
    let config = load_config(Some(file.path())).unwrap();
    assert_eq!(config.translator.default_version, Some(DeviceVersion::new(6, 49)));
    assert!(config.translator.infer_types);
    assert!(config.translator.version_mapping);
    assert_eq!(config.output.format, "json");
    assert_eq!(config.output.color, "auto");
}

#[test]
fn test_invalid_field_mapping_rejected() {
    let file = write_config(
        r#"
[[field_mappings]]
path = "/ip/route"
logical_field = ""
device_field = "dst-address"
"#,
    );
    let err = load_config(Some(file.path())).unwrap_err();
    assert!(matches!(err, ConfigError::Validation { .. }), "{err}");
}

#[test]
fn test_malformed_toml_is_a_figment_error() {
    let file = write_config("[translator\ninfer_types = true");
    let err = load_config(Some(file.path())).unwrap_err();
    assert!(matches!(err, ConfigError::Figment(_)), "{err}");
}

// ── Registries ──────────────────────────────────────────────────────

#[test]
fn test_extra_field_mapping_used_by_translator() {
    let file = write_config(
        r#"
[[field_mappings]]
path = "/ip/route"
logical_field = "destination"
device_field = "dst-address"
type = "ip"

[[field_mappings]]
path = "/ip/route"
logical_field = "distance"
device_field = "distance"
type = "int"
"#,
    );
    let config = load_config(Some(file.path())).unwrap();
    let registry = config.field_registry();
    assert_eq!(registry.mapping("/ip/route", "distance").unwrap().field_type, FieldType::Int);
    // built-ins survive
    assert!(registry.mapping("/interface", "macAddress").is_some());

    let translator = config.translator().unwrap();
    let cmd = translator
        .translate_to_canonical(
            TranslateInput::new("/ip/route", Action::Add)
                .with_field("destination", "10.0.0.0/8")
                .with_field("distance", 2),
        )
        .unwrap();
    assert_eq!(cmd.parameters()["dst-address"], Value::from("10.0.0.0/8"));
    assert_eq!(cmd.parameters()["distance"], Value::Int(2));
}

#[test]
fn test_version_mapping_files_load_in_order() {
    let dir = TempDir::new().unwrap();
    let json = dir.path().join("extra.json");
    std::fs::write(
        &json,
        r#"[{"feature": "zerotier", "minVersion": "7.1",
             "pathMappings": [{"canonicalPath": "/zerotier", "ros7Path": "/zerotier/interface"}]}]"#,
    )
    .unwrap();
    let toml_file = dir.path().join("override.toml");
    std::fs::write(
        &toml_file,
        r#"
[[mapping]]
feature = "container"
minVersion = "7.6"
"#,
    )
    .unwrap();

    let file = write_config(&format!(
        "version_mapping_files = [{:?}, {:?}]\n\n[[version_mappings]]\nfeature = \"lte\"\nminVersion = \"7.2\"\n",
        path_str(&json),
        path_str(&toml_file),
    ));
    let config = load_config(Some(file.path())).unwrap();
    let registry = config.version_registry().unwrap();

    let v7_4 = DeviceVersion::new(7, 4);
    assert!(registry.is_feature_available("zerotier", Some(&v7_4)));
    assert!(!registry.is_feature_available("lte", Some(&DeviceVersion::new(7, 1))));
    // the file replaced the built-in 7.4 floor
    assert!(!registry.is_feature_available("container", Some(&v7_4)));
    assert_eq!(registry.get_path("/zerotier", Some(&v7_4)), "/zerotier/interface");
}

#[test]
fn test_missing_mapping_file_reports_path() {
    let file = write_config("version_mapping_files = [\"/nonexistent/rosetta/mappings.json\"]\n");
    let config = load_config(Some(file.path())).unwrap();
    let err = config.version_registry().unwrap_err();
    assert!(err.to_string().contains("/nonexistent/rosetta/mappings.json"), "{err}");
}

#[test]
fn test_default_version_seeds_translator() {
    let file = write_config("[translator]\ndefault_version = \"7.13\"\n");
    let translator = load_config(Some(file.path())).unwrap().translator().unwrap();
    assert_eq!(translator.version(), Some(DeviceVersion::new(7, 13)));

    let cmd = translator
        .translate_to_canonical(TranslateInput::new("/interface/wireless", Action::Print))
        .unwrap();
    assert_eq!(cmd.path(), "/interface/wifiwave2");
}

#[test]
fn test_version_mapping_can_be_disabled() {
    let file = write_config("[translator]\ndefault_version = \"7.13\"\nversion_mapping = false\n");
    let translator = load_config(Some(file.path())).unwrap().translator().unwrap();
    assert!(translator.version_registry().is_none());
    let cmd = translator
        .translate_to_canonical(TranslateInput::new("/interface/wireless", Action::Print))
        .unwrap();
    assert_eq!(cmd.path(), "/interface/wireless");
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
