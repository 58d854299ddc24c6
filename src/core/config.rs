//! Configuration management with layered hierarchy

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::catalog::{EndpointSource, FetchError, DEFAULT_REFRESH_MINUTES};
use crate::core::engine::UnresolvedPolicy;
use crate::core::units::UnitSystem;
use crate::core::Project;

/// Default transport timeout for HTTP catalog fetches
pub const DEFAULT_FETCH_TIMEOUT_SECONDS: u64 = 30;

/// Every settable key with a short description
pub const KEYS: &[(&str, &str)] = &[
    (
        "refresh_rate_minutes",
        "Minutes a fetched catalog stays fresh (default 15)",
    ),
    ("endpoints.materials", "URL or file path of the materials CSV"),
    ("endpoints.processes", "URL or file path of the processes CSV"),
    ("units", "Display units: imperial or metric"),
    (
        "on_unresolved",
        "Unknown material/process: skip or reject (default skip)",
    ),
    (
        "fetch_timeout_seconds",
        "HTTP timeout for catalog fetches, 0 for none (default 30)",
    ),
    ("default_format", "Default output format (auto, json, yaml, csv, md)"),
];

/// Catalog table addresses
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub materials: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub processes: Option<String>,
}

/// QuoteForge configuration with layered hierarchy
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Catalog freshness window in minutes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_rate_minutes: Option<u64>,

    pub endpoints: Endpoints,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<UnitSystem>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_unresolved: Option<UnresolvedPolicy>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch_timeout_seconds: Option<u64>,

    /// Default output format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_format: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        let project_config = Project::discover()
            .ok()
            .map(|project| project.config_path());
        Self::load_from(
            Self::global_config_path().as_deref(),
            project_config.as_deref(),
            |name| std::env::var(name).ok(),
        )
    }

    /// Merge defaults, a global file, a project file and the environment
    ///
    /// Missing files are skipped. A file that does not parse is skipped with
    /// a warning rather than failing the command.
    pub fn load_from(
        global: Option<&Path>,
        project: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let mut config = Config::default();

        for path in [global, project].into_iter().flatten() {
            if let Some(layer) = Self::read_file(path) {
                config.merge(layer);
            }
        }

        config.apply_env(env);
        config
    }

    fn read_file(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot read config file");
                return None;
            }
        };
        // a fresh `qf init` config is all comments
        let has_content = contents.lines().any(|line| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        });
        if !has_content {
            return None;
        }
        match serde_yml::from_str::<Config>(&contents) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), "loaded config layer");
                Some(config)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring malformed config file");
                None
            }
        }
    }

    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(url) = env("QF_MATERIALS_URL") {
            self.endpoints.materials = Some(url);
        }
        if let Some(url) = env("QF_PROCESSES_URL") {
            self.endpoints.processes = Some(url);
        }
        if let Some(value) = env("QF_REFRESH_MINUTES") {
            match value.trim().parse() {
                Ok(minutes) => self.refresh_rate_minutes = Some(minutes),
                Err(_) => tracing::warn!(%value, "ignoring invalid QF_REFRESH_MINUTES"),
            }
        }
        if let Some(value) = env("QF_UNITS") {
            match value.parse() {
                Ok(units) => self.units = Some(units),
                Err(_) => tracing::warn!(%value, "ignoring invalid QF_UNITS"),
            }
        }
        if let Some(value) = env("QF_ON_UNRESOLVED") {
            match value.parse() {
                Ok(policy) => self.on_unresolved = Some(policy),
                Err(_) => tracing::warn!(%value, "ignoring invalid QF_ON_UNRESOLVED"),
            }
        }
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "quoteforge")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.refresh_rate_minutes.is_some() {
            self.refresh_rate_minutes = other.refresh_rate_minutes;
        }
        if other.endpoints.materials.is_some() {
            self.endpoints.materials = other.endpoints.materials;
        }
        if other.endpoints.processes.is_some() {
            self.endpoints.processes = other.endpoints.processes;
        }
        if other.units.is_some() {
            self.units = other.units;
        }
        if other.on_unresolved.is_some() {
            self.on_unresolved = other.on_unresolved;
        }
        if other.fetch_timeout_seconds.is_some() {
            self.fetch_timeout_seconds = other.fetch_timeout_seconds;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
    }

    pub fn refresh_rate_minutes(&self) -> u64 {
        self.refresh_rate_minutes.unwrap_or(DEFAULT_REFRESH_MINUTES)
    }

    pub fn units(&self) -> UnitSystem {
        self.units.unwrap_or_default()
    }

    pub fn on_unresolved(&self) -> UnresolvedPolicy {
        self.on_unresolved.unwrap_or_default()
    }

    /// HTTP timeout; `0` disables it
    pub fn fetch_timeout(&self) -> Option<Duration> {
        match self
            .fetch_timeout_seconds
            .unwrap_or(DEFAULT_FETCH_TIMEOUT_SECONDS)
        {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Build the catalog transport for the configured endpoints
    pub fn endpoint_source(&self) -> Result<EndpointSource, FetchError> {
        EndpointSource::new(
            self.endpoints.materials.clone(),
            self.endpoints.processes.clone(),
            self.fetch_timeout(),
        )
    }

    /// Effective value of a key, defaults included, as shown by `qf config show`
    pub fn value(&self, key: &str) -> Option<String> {
        match key {
            "refresh_rate_minutes" => Some(self.refresh_rate_minutes().to_string()),
            "endpoints.materials" => self.endpoints.materials.clone(),
            "endpoints.processes" => self.endpoints.processes.clone(),
            "units" => Some(self.units().to_string()),
            "on_unresolved" => Some(self.on_unresolved().to_string()),
            "fetch_timeout_seconds" => Some(
                self.fetch_timeout_seconds
                    .unwrap_or(DEFAULT_FETCH_TIMEOUT_SECONDS)
                    .to_string(),
            ),
            "default_format" => self.default_format.clone(),
            _ => None,
        }
    }

    pub fn is_valid_key(key: &str) -> bool {
        KEYS.iter().any(|(k, _)| *k == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults() {
        let config = Config::load_from(None, None, no_env);
        assert_eq!(config.refresh_rate_minutes(), 15);
        assert_eq!(config.units(), UnitSystem::Imperial);
        assert_eq!(config.on_unresolved(), UnresolvedPolicy::Skip);
        assert_eq!(config.fetch_timeout(), Some(Duration::from_secs(30)));
        assert!(config.endpoints.materials.is_none());
    }

    #[test]
    fn test_project_overrides_global() {
        let dir = tempdir().unwrap();
        let global = dir.path().join("global.yaml");
        let project = dir.path().join("project.yaml");
        std::fs::write(
            &global,
            "refresh_rate_minutes: 60\nendpoints:\n  materials: https://example.com/m.csv\n  processes: https://example.com/p.csv\n",
        )
        .unwrap();
        std::fs::write(&project, "refresh_rate_minutes: 5\nendpoints:\n  processes: ./p.csv\n")
            .unwrap();

        let config = Config::load_from(Some(&global), Some(&project), no_env);
        assert_eq!(config.refresh_rate_minutes(), 5);
        assert_eq!(
            config.endpoints.materials.as_deref(),
            Some("https://example.com/m.csv")
        );
        assert_eq!(config.endpoints.processes.as_deref(), Some("./p.csv"));
    }

    #[test]
    fn test_env_wins() {
        let dir = tempdir().unwrap();
        let project = dir.path().join("config.yaml");
        std::fs::write(&project, "units: imperial\non_unresolved: skip\n").unwrap();

        let env: HashMap<&str, &str> = [
            ("QF_MATERIALS_URL", "/tmp/m.csv"),
            ("QF_REFRESH_MINUTES", "2"),
            ("QF_UNITS", "metric"),
            ("QF_ON_UNRESOLVED", "reject"),
        ]
        .into_iter()
        .collect();

        let config = Config::load_from(None, Some(&project), |name| {
            env.get(name).map(|v| v.to_string())
        });
        assert_eq!(config.endpoints.materials.as_deref(), Some("/tmp/m.csv"));
        assert_eq!(config.refresh_rate_minutes(), 2);
        assert_eq!(config.units(), UnitSystem::Metric);
        assert_eq!(config.on_unresolved(), UnresolvedPolicy::Reject);
    }

    #[test]
    fn test_invalid_env_ignored() {
        let config = Config::load_from(None, None, |name| match name {
            "QF_REFRESH_MINUTES" => Some("soon".to_string()),
            "QF_UNITS" => Some("cubits".to_string()),
            _ => None,
        });
        assert_eq!(config.refresh_rate_minutes(), 15);
        assert_eq!(config.units(), UnitSystem::Imperial);
    }

    #[test]
    fn test_malformed_file_skipped() {
        let dir = tempdir().unwrap();
        let project = dir.path().join("config.yaml");
        std::fs::write(&project, "refresh_rate_minutes: [not, a, number]\n").unwrap();

        let config = Config::load_from(None, Some(&project), no_env);
        assert_eq!(config.refresh_rate_minutes(), 15);
    }

    #[test]
    fn test_zero_timeout_disables() {
        let config = Config {
            fetch_timeout_seconds: Some(0),
            ..Default::default()
        };
        assert_eq!(config.fetch_timeout(), None);
    }

    #[test]
    fn test_value_lookup() {
        let config = Config::default();
        assert_eq!(config.value("units").as_deref(), Some("imperial"));
        assert_eq!(config.value("on_unresolved").as_deref(), Some("skip"));
        assert_eq!(config.value("endpoints.materials"), None);
        assert_eq!(config.value("nonsense"), None);
        assert!(Config::is_valid_key("endpoints.processes"));
        assert!(!Config::is_valid_key("author"));
    }
}
