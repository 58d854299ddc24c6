//! Quote session - the parts being quoted and the user's overrides
//!
//! A session file is what the user edits between runs. Volumes and material
//! rate overrides are written in the session's unit system and converted to
//! canonical units when the session is loaded into an [`OverrideStore`].

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use thiserror::Error;

use crate::core::overrides::{LineItemOverride, OverrideError, OverrideField, OverrideStore};
use crate::core::units::UnitSystem;
use crate::entities::material::is_material_key;
use crate::entities::part::PartConfig;
use crate::yaml::{parse_yaml_file, YamlError};

#[derive(Debug, Error, Diagnostic)]
pub enum SessionError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Yaml(#[from] YamlError),

    #[error("part name '{0}' appears more than once")]
    #[diagnostic(
        code(qf::session::duplicate_part),
        help("Part names identify overrides, so each part needs a unique name")
    )]
    DuplicatePart(String),

    #[error("invalid override for part '{part}', line item '{key}'")]
    #[diagnostic(code(qf::session::invalid_override))]
    Override {
        part: String,
        key: String,
        #[source]
        #[diagnostic_source]
        source: OverrideError,
    },
}

/// One part in a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartEntry {
    /// Part name, also its identity for overrides
    pub name: String,

    /// Volume in the session's unit system, as reported by the geometry service
    pub volume: f64,

    #[serde(flatten)]
    pub config: PartConfig,

    /// Overrides by line-item key, in the session's unit system
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub overrides: BTreeMap<String, LineItemOverride>,
}

impl PartEntry {
    /// Volume in in^3
    pub fn canonical_volume(&self, units: UnitSystem) -> f64 {
        units.volume_from_display(self.volume)
    }
}

/// A set of parts quoted together
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuoteSession {
    /// Units for volumes and material rate overrides; the configured
    /// default applies when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<UnitSystem>,

    #[serde(default)]
    pub parts: Vec<PartEntry>,
}

impl QuoteSession {
    /// Load and check a session file
    pub fn load(path: &Path) -> Result<Self, SessionError> {
        let session: QuoteSession = parse_yaml_file(path)?;
        session.check_unique_names()?;
        Ok(session)
    }

    fn check_unique_names(&self) -> Result<(), SessionError> {
        let mut seen = HashSet::new();
        for part in &self.parts {
            if !seen.insert(part.name.as_str()) {
                return Err(SessionError::DuplicatePart(part.name.clone()));
            }
        }
        Ok(())
    }

    pub fn unit_system(&self) -> UnitSystem {
        self.units.unwrap_or_default()
    }

    pub fn part(&self, name: &str) -> Option<&PartEntry> {
        self.parts.iter().find(|p| p.name == name)
    }

    /// Build the session's override store in canonical units
    pub fn override_store(&self) -> Result<OverrideStore, SessionError> {
        let mut store = OverrideStore::new();
        let units = self.unit_system();
        for part in &self.parts {
            for (key, item) in &part.overrides {
                for (field, value) in item.fields() {
                    set_display_override(&mut store, units, &part.name, key, field, value)
                        .map_err(|source| SessionError::Override {
                            part: part.name.clone(),
                            key: key.clone(),
                            source,
                        })?;
                }
            }
        }
        Ok(store)
    }
}

/// Store an override typed in display units
///
/// Only material rates carry a mass unit; process rates ($/hr) and times
/// are the same in every unit system.
pub fn set_display_override(
    store: &mut OverrideStore,
    units: UnitSystem,
    part_id: &str,
    line_item_key: &str,
    field: OverrideField,
    value: f64,
) -> Result<(), OverrideError> {
    let canonical = if field == OverrideField::Rate && is_material_key(line_item_key) {
        units.material_rate_from_display(value)
    } else {
        value
    };
    store.set(part_id, line_item_key, field, canonical)
}
