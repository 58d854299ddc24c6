//! Project discovery and structure
//!
//! A project is any directory holding a `.qf/` folder; its `config.yaml`
//! is the project layer of [`Config`](crate::core::Config).

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the per-project configuration directory
pub const PROJECT_DIR: &str = ".qf";

/// Represents a QuoteForge project
#[derive(Debug)]
pub struct Project {
    /// Root directory of the project (parent of .qf/)
    root: PathBuf,
}

impl Project {
    /// Find project root by walking up from the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let current = std::env::current_dir().map_err(|e| ProjectError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find project root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        loop {
            if current.join(PROJECT_DIR).is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(ProjectError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create `.qf/config.yaml` at the given path
    pub fn init(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        if root.join(PROJECT_DIR).exists() {
            return Err(ProjectError::AlreadyExists(root));
        }

        Self::write_structure(root)
    }

    /// Initialize even if .qf/ exists, resetting its config.yaml
    pub fn init_force(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        Self::write_structure(root)
    }

    fn write_structure(root: PathBuf) -> Result<Self, ProjectError> {
        let project = Self { root };
        std::fs::create_dir_all(project.qf_dir())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;
        std::fs::write(project.config_path(), Self::default_config())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;
        Ok(project)
    }

    fn default_config() -> &'static str {
        r#"# QuoteForge project configuration
# Environment variables (QF_MATERIALS_URL, QF_PROCESSES_URL,
# QF_REFRESH_MINUTES, QF_UNITS, QF_ON_UNRESOLVED) take precedence.

# Catalog tables: http(s) URLs or local CSV paths
# endpoints:
#   materials: https://example.com/materials.csv
#   processes: https://example.com/processes.csv

# Minutes a fetched catalog is reused before refetching
# refresh_rate_minutes: 15

# Display units for sessions and output (imperial, metric)
# units: imperial

# Unknown material or process in a part: skip or reject
# on_unresolved: skip

# HTTP timeout for catalog fetches, 0 for none
# fetch_timeout_seconds: 30

# Default output format (auto, json, yaml, csv, md)
# default_format: auto
"#
    }

    /// Get the project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .qf configuration directory
    pub fn qf_dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.qf_dir().join("config.yaml")
    }
}

/// Errors that can occur during project operations
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("not a QuoteForge project (searched from {searched_from:?}). Run 'qf init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("QuoteForge project already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}
