//! Unit systems for display and data entry
//!
//! The engine, the catalog and the override store all work in imperial
//! units (in^3, lb, $/lb). Metric values only exist at the edges: session
//! input is converted to canonical units on the way in and results are
//! converted for display on the way out.

use serde::{Deserialize, Serialize};

/// Kilograms per pound (exact)
pub const KG_PER_LB: f64 = 0.453_592_37;

/// Cubic centimetres per cubic inch (exact)
pub const CM3_PER_IN3: f64 = 16.387_064;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Imperial,
    Metric,
}

impl UnitSystem {
    pub fn mass_label(&self) -> &'static str {
        match self {
            UnitSystem::Imperial => "lb",
            UnitSystem::Metric => "kg",
        }
    }

    pub fn volume_label(&self) -> &'static str {
        match self {
            UnitSystem::Imperial => "in^3",
            UnitSystem::Metric => "cm^3",
        }
    }

    pub fn material_rate_label(&self) -> &'static str {
        match self {
            UnitSystem::Imperial => "$/lb",
            UnitSystem::Metric => "$/kg",
        }
    }

    pub fn density_label(&self) -> &'static str {
        match self {
            UnitSystem::Imperial => "lb/in^3",
            UnitSystem::Metric => "g/cm^3",
        }
    }

    /// Canonical lb/in^3 -> display density
    pub fn density_to_display(&self, lb_per_in3: f64) -> f64 {
        match self {
            UnitSystem::Imperial => lb_per_in3,
            UnitSystem::Metric => lb_per_in3 * KG_PER_LB * 1000.0 / CM3_PER_IN3,
        }
    }

    /// Canonical lb -> display mass
    pub fn weight_to_display(&self, lb: f64) -> f64 {
        match self {
            UnitSystem::Imperial => lb,
            UnitSystem::Metric => lb * KG_PER_LB,
        }
    }

    /// Display volume -> canonical in^3
    pub fn volume_from_display(&self, value: f64) -> f64 {
        match self {
            UnitSystem::Imperial => value,
            UnitSystem::Metric => value / CM3_PER_IN3,
        }
    }

    /// Canonical $/lb -> display rate
    pub fn material_rate_to_display(&self, per_lb: f64) -> f64 {
        match self {
            UnitSystem::Imperial => per_lb,
            UnitSystem::Metric => per_lb / KG_PER_LB,
        }
    }

    /// Display rate -> canonical $/lb
    pub fn material_rate_from_display(&self, value: f64) -> f64 {
        match self {
            UnitSystem::Imperial => value,
            UnitSystem::Metric => value * KG_PER_LB,
        }
    }
}

impl std::fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnitSystem::Imperial => write!(f, "imperial"),
            UnitSystem::Metric => write!(f, "metric"),
        }
    }
}

impl std::str::FromStr for UnitSystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "imperial" => Ok(UnitSystem::Imperial),
            "metric" => Ok(UnitSystem::Metric),
            _ => Err(format!("Unknown unit system: {}. Use imperial or metric", s)),
        }
    }
}
