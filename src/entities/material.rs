//! Material catalog rows

use serde::{Deserialize, Serialize};

/// Prefix of every material line-item key
pub const MATERIAL_KEY_PREFIX: &str = "Material: ";

/// One row of the materials catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRate {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Density in lb/in^3
    pub density: f64,

    /// Cost in $/lb
    pub cost_per_unit_mass: f64,

    /// Listed ahead of other materials in selection lists
    #[serde(default)]
    pub priority: bool,
}

impl MaterialRate {
    pub fn new(name: impl Into<String>, density: f64, cost_per_unit_mass: f64) -> Self {
        Self {
            name: name.into(),
            category: None,
            density,
            cost_per_unit_mass,
            priority: false,
        }
    }

    /// The catalog tuple consumed by the cost engine
    pub fn rates(&self) -> (f64, f64) {
        (self.density, self.cost_per_unit_mass)
    }
}

/// Line-item key used for a material's breakdown row and its overrides
pub fn material_line_key(material_name: &str) -> String {
    format!("{}{}", MATERIAL_KEY_PREFIX, material_name)
}

/// Whether a line-item key refers to a material charge
pub fn is_material_key(key: &str) -> bool {
    key.starts_with(MATERIAL_KEY_PREFIX)
}
