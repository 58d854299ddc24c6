//! Field-level overrides of catalog rates
//!
//! Overrides are keyed by part and line item, and each field is overridden
//! independently: overriding a process's rate leaves its setup and run
//! times on catalog defaults. Values are always canonical units; converting
//! from whatever the user typed is the caller's job.

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// An overridable field of a line item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideField {
    Rate,
    SetupTimeMinutes,
    RunTimeMinutes,
}

impl std::fmt::Display for OverrideField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverrideField::Rate => write!(f, "rate"),
            OverrideField::SetupTimeMinutes => write!(f, "setup_time_minutes"),
            OverrideField::RunTimeMinutes => write!(f, "run_time_minutes"),
        }
    }
}

impl std::str::FromStr for OverrideField {
    type Err = OverrideError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rate" => Ok(OverrideField::Rate),
            "setup_time_minutes" | "setup_time_mins" | "setup" => {
                Ok(OverrideField::SetupTimeMinutes)
            }
            "run_time_minutes" | "run_time_mins" | "run" => Ok(OverrideField::RunTimeMinutes),
            _ => Err(OverrideError::UnknownField(s.to_string())),
        }
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum OverrideError {
    #[error("invalid override value {value} for {field}")]
    #[diagnostic(
        code(qf::overrides::invalid_value),
        help("Override values must be finite and not negative")
    )]
    InvalidValue { field: OverrideField, value: f64 },

    #[error("unknown override field '{0}'")]
    #[diagnostic(
        code(qf::overrides::unknown_field),
        help("Use rate, setup_time_minutes, or run_time_minutes")
    )]
    UnknownField(String),
}

/// The sparse set of overridden fields for one line item
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItemOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup_time_minutes: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_time_minutes: Option<f64>,
}

impl LineItemOverride {
    pub fn get(&self, field: OverrideField) -> Option<f64> {
        match field {
            OverrideField::Rate => self.rate,
            OverrideField::SetupTimeMinutes => self.setup_time_minutes,
            OverrideField::RunTimeMinutes => self.run_time_minutes,
        }
    }

    fn slot(&mut self, field: OverrideField) -> &mut Option<f64> {
        match field {
            OverrideField::Rate => &mut self.rate,
            OverrideField::SetupTimeMinutes => &mut self.setup_time_minutes,
            OverrideField::RunTimeMinutes => &mut self.run_time_minutes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rate.is_none() && self.setup_time_minutes.is_none() && self.run_time_minutes.is_none()
    }

    /// Set fields as `(field, value)` pairs
    pub fn fields(&self) -> impl Iterator<Item = (OverrideField, f64)> + '_ {
        [
            OverrideField::Rate,
            OverrideField::SetupTimeMinutes,
            OverrideField::RunTimeMinutes,
        ]
        .into_iter()
        .filter_map(|field| self.get(field).map(|v| (field, v)))
    }
}

/// Session-lifetime override storage
#[derive(Debug, Clone, Default)]
pub struct OverrideStore {
    parts: HashMap<String, BTreeMap<String, LineItemOverride>>,
}

impl OverrideStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override one field of one line item (canonical units)
    pub fn set(
        &mut self,
        part_id: &str,
        line_item_key: &str,
        field: OverrideField,
        value: f64,
    ) -> Result<(), OverrideError> {
        if !value.is_finite() || value < 0.0 {
            return Err(OverrideError::InvalidValue { field, value });
        }

        let entry = self
            .parts
            .entry(part_id.to_string())
            .or_default()
            .entry(line_item_key.to_string())
            .or_default();
        *entry.slot(field) = Some(value);
        Ok(())
    }

    pub fn get(&self, part_id: &str, line_item_key: &str, field: OverrideField) -> Option<f64> {
        self.parts
            .get(part_id)
            .and_then(|items| items.get(line_item_key))
            .and_then(|item| item.get(field))
    }

    /// The override if present, else the catalog default
    pub fn get_effective(
        &self,
        part_id: &str,
        line_item_key: &str,
        field: OverrideField,
        catalog_default: f64,
    ) -> f64 {
        self.get(part_id, line_item_key, field)
            .unwrap_or(catalog_default)
    }

    /// Drop a single field, returning it to the catalog default
    pub fn unset(&mut self, part_id: &str, line_item_key: &str, field: OverrideField) {
        if let Some(items) = self.parts.get_mut(part_id) {
            if let Some(item) = items.get_mut(line_item_key) {
                *item.slot(field) = None;
                if item.is_empty() {
                    items.remove(line_item_key);
                }
            }
            if items.is_empty() {
                self.parts.remove(part_id);
            }
        }
    }

    /// Remove every override for a part; a no-op when there are none
    pub fn clear(&mut self, part_id: &str) {
        if self.parts.remove(part_id).is_some() {
            tracing::debug!(part = part_id, "cleared overrides");
        }
    }

    pub fn has_overrides(&self, part_id: &str) -> bool {
        self.parts.get(part_id).map_or(false, |items| !items.is_empty())
    }

    /// Read-only view of one part's overrides
    pub fn for_part<'a>(&'a self, part_id: &str) -> PartOverrides<'a> {
        PartOverrides {
            items: self.parts.get(part_id),
        }
    }
}

/// Overrides for a single part, as consumed by the cost engine
#[derive(Debug, Clone, Copy, Default)]
pub struct PartOverrides<'a> {
    items: Option<&'a BTreeMap<String, LineItemOverride>>,
}

impl<'a> PartOverrides<'a> {
    /// A view with no overrides
    pub fn none() -> Self {
        Self::default()
    }

    pub fn get(&self, line_item_key: &str, field: OverrideField) -> Option<f64> {
        self.items
            .and_then(|items| items.get(line_item_key))
            .and_then(|item| item.get(field))
    }

    pub fn effective(&self, line_item_key: &str, field: OverrideField, catalog_default: f64) -> f64 {
        self.get(line_item_key, field).unwrap_or(catalog_default)
    }

    /// Overridden line items in key order
    pub fn iter(&self) -> impl Iterator<Item = (&'a String, &'a LineItemOverride)> {
        self.items.into_iter().flat_map(|items| items.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_precedence() {
        let mut store = OverrideStore::new();
        assert_eq!(store.get_effective("A", "Machining", OverrideField::Rate, 150.0), 150.0);

        store.set("A", "Machining", OverrideField::Rate, 120.0).unwrap();
        assert_eq!(store.get_effective("A", "Machining", OverrideField::Rate, 150.0), 120.0);
        // other fields stay on catalog defaults
        assert_eq!(
            store.get_effective("A", "Machining", OverrideField::SetupTimeMinutes, 20.0),
            20.0
        );
        // other parts are unaffected
        assert_eq!(store.get("B", "Machining", OverrideField::Rate), None);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut store = OverrideStore::new();
        store.clear("A");

        store.set("A", "Material: Steel", OverrideField::Rate, 2.0).unwrap();
        store.set("A", "Welding", OverrideField::RunTimeMinutes, 45.0).unwrap();
        assert!(store.has_overrides("A"));

        store.clear("A");
        store.clear("A");
        assert!(!store.has_overrides("A"));
        assert_eq!(store.get("A", "Welding", OverrideField::RunTimeMinutes), None);
    }

    #[test]
    fn test_unset_single_field() {
        let mut store = OverrideStore::new();
        store.set("A", "Welding", OverrideField::Rate, 80.0).unwrap();
        store.set("A", "Welding", OverrideField::SetupTimeMinutes, 5.0).unwrap();

        store.unset("A", "Welding", OverrideField::Rate);
        assert_eq!(store.get("A", "Welding", OverrideField::Rate), None);
        assert_eq!(store.get("A", "Welding", OverrideField::SetupTimeMinutes), Some(5.0));

        store.unset("A", "Welding", OverrideField::SetupTimeMinutes);
        assert!(!store.has_overrides("A"));
    }

    #[test]
    fn test_rejects_invalid_values() {
        let mut store = OverrideStore::new();
        assert!(store.set("A", "Welding", OverrideField::Rate, -1.0).is_err());
        assert!(store.set("A", "Welding", OverrideField::Rate, f64::NAN).is_err());
        assert!(store.set("A", "Welding", OverrideField::Rate, 0.0).is_ok());
    }

    #[test]
    fn test_part_view() {
        let mut store = OverrideStore::new();
        store.set("A", "Turning", OverrideField::RunTimeMinutes, 12.0).unwrap();

        let view = store.for_part("A");
        assert_eq!(view.effective("Turning", OverrideField::RunTimeMinutes, 60.0), 12.0);
        assert_eq!(view.iter().count(), 1);

        let empty = store.for_part("missing");
        assert_eq!(empty.effective("Turning", OverrideField::RunTimeMinutes, 60.0), 60.0);
        assert_eq!(PartOverrides::none().iter().count(), 0);
    }

    #[test]
    fn test_field_from_str() {
        assert_eq!("rate".parse::<OverrideField>().unwrap(), OverrideField::Rate);
        assert_eq!(
            "setup_time_mins".parse::<OverrideField>().unwrap(),
            OverrideField::SetupTimeMinutes
        );
        assert!("density".parse::<OverrideField>().is_err());
    }
}
