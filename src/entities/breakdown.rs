//! Cost breakdown results

use serde::{Deserialize, Serialize};

use crate::entities::material::is_material_key;

/// Unit of a line item's rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateUnit {
    /// Dollars per unit of mass (canonical: $/lb)
    #[serde(rename = "$/mass")]
    PerMass,
    #[serde(rename = "$/hour")]
    PerHour,
}

impl std::fmt::Display for RateUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RateUnit::PerMass => write!(f, "$/mass"),
            RateUnit::PerHour => write!(f, "$/hour"),
        }
    }
}

/// One row of a part's cost breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostLineItem {
    /// `"Material: <name>"` or the process display name
    pub line_item_key: String,

    pub unit: RateUnit,

    /// Effective rate after overrides
    pub rate: f64,

    /// None for material rows
    pub setup_time_minutes: Option<f64>,

    /// None for material rows
    pub run_time_minutes: Option<f64>,

    pub setup_cost: f64,

    pub run_cost_per_part: f64,

    pub batch_total_cost: f64,
}

impl CostLineItem {
    pub fn is_material(&self) -> bool {
        is_material_key(&self.line_item_key)
    }
}

/// Full cost result for one part and batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartCostResult {
    /// Part weight in lb
    pub weight: f64,

    pub quantity: u32,

    pub per_part_cost: f64,

    pub total_cost_batch: f64,

    /// Material first, then processes in costing order
    pub breakdown: Vec<CostLineItem>,
}

impl PartCostResult {
    /// Batch material cost across all material rows
    pub fn material_cost(&self) -> f64 {
        self.breakdown
            .iter()
            .filter(|item| item.is_material())
            .map(|item| item.batch_total_cost)
            .sum()
    }

    /// Batch process cost across all process rows
    pub fn process_cost(&self) -> f64 {
        self.breakdown
            .iter()
            .filter(|item| !item.is_material())
            .map(|item| item.batch_total_cost)
            .sum()
    }

    pub fn line_item(&self, key: &str) -> Option<&CostLineItem> {
        self.breakdown.iter().find(|item| item.line_item_key == key)
    }
}
