//! YAML loading with source-annotated diagnostics

mod diagnostics;

pub use diagnostics::{YamlError, YamlSyntaxError};

use serde::de::DeserializeOwned;
use std::path::Path;

/// Read and deserialize a YAML file, reporting syntax and shape errors with
/// the offending location highlighted
pub fn parse_yaml_file<T: DeserializeOwned>(path: &Path) -> Result<T, YamlError> {
    let content = std::fs::read_to_string(path).map_err(|source| YamlError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_yaml_str(&content, &path.display().to_string())
}

/// Deserialize YAML text; `filename` is only used in diagnostics
pub fn parse_yaml_str<T: DeserializeOwned>(content: &str, filename: &str) -> Result<T, YamlError> {
    serde_yml::from_str(content)
        .map_err(|e| YamlSyntaxError::from_serde_error(&e, content, filename).into())
}
