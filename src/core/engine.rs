//! Cost engine - part breakdown and batch totals
//!
//! A breakdown is a pure function of the part configuration, its volume, the
//! catalog rates and the part's overrides. Line items come out in a fixed
//! order: material, then cutting, then each flagged process in declared
//! order, then finishing.
//!
//! Material is charged per part (`weight * rate`). Processes are charged a
//! setup cost once per batch plus a run cost per part:
//!
//! ```text
//! setup_cost        = setup_time_minutes * rate / 60
//! run_cost_per_part = run_time_minutes * rate / 60
//! batch_total       = setup_cost + run_cost_per_part * quantity
//! ```

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::catalog::CatalogError;
use crate::core::overrides::{OverrideField, PartOverrides};
use crate::core::rates::RateResolver;
use crate::entities::breakdown::{CostLineItem, PartCostResult, RateUnit};
use crate::entities::material::material_line_key;
use crate::entities::part::PartConfig;

/// What to do when a selected material or process is not in the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnresolvedPolicy {
    /// Leave the line item out and keep going
    #[default]
    Skip,
    /// Fail the breakdown
    Reject,
}

impl std::fmt::Display for UnresolvedPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnresolvedPolicy::Skip => write!(f, "skip"),
            UnresolvedPolicy::Reject => write!(f, "reject"),
        }
    }
}

impl std::str::FromStr for UnresolvedPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "skip" => Ok(UnresolvedPolicy::Skip),
            "reject" => Ok(UnresolvedPolicy::Reject),
            _ => Err(format!("Unknown unresolved policy: {}. Use skip or reject", s)),
        }
    }
}

/// Catalog entry kinds, for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateKind {
    Material,
    Process,
}

impl std::fmt::Display for RateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RateKind::Material => write!(f, "material"),
            RateKind::Process => write!(f, "process"),
        }
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum EngineError {
    #[error("invalid part configuration: {0}")]
    #[diagnostic(code(qf::engine::invalid_configuration))]
    InvalidConfiguration(String),

    #[error("{kind} '{name}' not found in the catalog")]
    #[diagnostic(
        code(qf::engine::not_found),
        help("Names match the catalog exactly, including case. Set `on_unresolved: skip` to leave unknown entries out instead")
    )]
    NotFound { kind: RateKind, name: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Catalog(#[from] CatalogError),
}

/// Computes part cost breakdowns from catalog rates and overrides
pub struct CostEngine<'a> {
    rates: RateResolver<'a>,
    policy: UnresolvedPolicy,
}

impl<'a> CostEngine<'a> {
    pub fn new(rates: RateResolver<'a>) -> Self {
        Self {
            rates,
            policy: UnresolvedPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: UnresolvedPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn rates(&self) -> &RateResolver<'a> {
        &self.rates
    }

    /// Compute the ordered breakdown and totals for one part
    pub fn calculate_part_breakdown(
        &self,
        config: &PartConfig,
        volume: f64,
        overrides: PartOverrides<'_>,
    ) -> Result<PartCostResult, EngineError> {
        validate(config, volume)?;

        let quantity = config.quantity;
        let qty = f64::from(quantity);
        let mut breakdown = Vec::new();
        let mut weight = 0.0;

        if let Some(ref material) = config.material {
            match self.rates.get_material_rate(material)? {
                Some((density, base_rate)) => {
                    weight = volume * density;
                    let key = material_line_key(material);
                    let rate = overrides.effective(&key, OverrideField::Rate, base_rate);

                    if weight > 0.0 {
                        let per_part = weight * rate;
                        breakdown.push(CostLineItem {
                            line_item_key: key,
                            unit: RateUnit::PerMass,
                            rate,
                            setup_time_minutes: None,
                            run_time_minutes: None,
                            setup_cost: 0.0,
                            run_cost_per_part: per_part,
                            batch_total_cost: weight * rate * qty,
                        });
                    }
                }
                None => self.unresolved(RateKind::Material, material)?,
            }
        }

        for name in config.selected_processes() {
            let Some((setup, rate, run)) = self.rates.get_process_rates(name)? else {
                self.unresolved(RateKind::Process, name)?;
                continue;
            };

            let setup_time = overrides.effective(name, OverrideField::SetupTimeMinutes, setup);
            let rate = overrides.effective(name, OverrideField::Rate, rate);
            let run_time = overrides.effective(name, OverrideField::RunTimeMinutes, run);

            let setup_cost = setup_time * rate / 60.0;
            let run_cost_per_part = run_time * rate / 60.0;

            breakdown.push(CostLineItem {
                line_item_key: name.to_string(),
                unit: RateUnit::PerHour,
                rate,
                setup_time_minutes: Some(setup_time),
                run_time_minutes: Some(run_time),
                setup_cost,
                run_cost_per_part,
                batch_total_cost: setup_cost + run_cost_per_part * qty,
            });
        }

        let total_cost_batch: f64 = breakdown.iter().map(|item| item.batch_total_cost).sum();
        let per_part_cost = if quantity > 0 {
            total_cost_batch / qty
        } else {
            0.0
        };

        Ok(PartCostResult {
            weight,
            quantity,
            per_part_cost,
            total_cost_batch,
            breakdown,
        })
    }

    fn unresolved(&self, kind: RateKind, name: &str) -> Result<(), EngineError> {
        match self.policy {
            UnresolvedPolicy::Skip => {
                tracing::debug!(%kind, name, "not in catalog, skipping");
                Ok(())
            }
            UnresolvedPolicy::Reject => Err(EngineError::NotFound {
                kind,
                name: name.to_string(),
            }),
        }
    }
}

fn validate(config: &PartConfig, volume: f64) -> Result<(), EngineError> {
    if config.quantity < 1 {
        return Err(EngineError::InvalidConfiguration(
            "quantity must be at least 1".to_string(),
        ));
    }
    if !volume.is_finite() || volume < 0.0 {
        return Err(EngineError::InvalidConfiguration(format!(
            "volume must be a finite, non-negative number (got {})",
            volume
        )));
    }
    Ok(())
}
