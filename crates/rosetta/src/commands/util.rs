//! Shared helpers for command handlers.

use std::io::Read;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::CliError;

/// Read a whole input file, or stdin for `-`.
pub fn read_input(path: &Path) -> Result<String, CliError> {
    let result = if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text).map(|_| text)
    } else {
        std::fs::read_to_string(path)
    };
    result.map_err(|source| CliError::Input {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse a JSON or YAML document; JSON is recognized by its leading brace
/// or bracket.
pub fn parse_document<T: DeserializeOwned>(text: &str) -> Result<T, CliError> {
    let trimmed = text.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        Ok(serde_json::from_str(trimmed)?)
    } else {
        Ok(serde_yaml::from_str(text)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rosetta_core::{Action, CanonicalCommand};

    use super::*;

    #[test]
    fn documents_parse_as_json_or_yaml() {
        let from_json: CanonicalCommand = parse_document(r#" {"path": "/interface", "action": "print"}"#).unwrap();
        let from_yaml: CanonicalCommand = parse_document("path: /interface\naction: print\n").unwrap();
        assert_eq!(from_json, from_yaml);
        assert_eq!(from_yaml.action(), Action::Print);
    }

    #[test]
    fn malformed_json_names_the_format() {
        let err = parse_document::<CanonicalCommand>("{\"path\": ").unwrap_err();
        assert!(err.to_string().starts_with("Invalid JSON"), "{err}");
    }
}
