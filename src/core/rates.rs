//! Rate lookup against the current catalog snapshots

use crate::core::catalog::{CatalogError, CatalogProvider};
use crate::entities::material::MaterialRate;
use crate::entities::process::{ProcessCategory, ProcessRate};

/// Looks up base rates by exact, case-sensitive name
///
/// When a name appears more than once the first row wins.
pub struct RateResolver<'a> {
    catalog: &'a dyn CatalogProvider,
}

impl<'a> RateResolver<'a> {
    pub fn new(catalog: &'a dyn CatalogProvider) -> Self {
        Self { catalog }
    }

    /// Full catalog row for a material
    pub fn material(&self, name: &str) -> Result<Option<MaterialRate>, CatalogError> {
        let materials = self.catalog.get_materials()?;
        Ok(materials.iter().find(|m| m.name == name).cloned())
    }

    /// Full catalog row for a process
    pub fn process(&self, name: &str) -> Result<Option<ProcessRate>, CatalogError> {
        let processes = self.catalog.get_processes()?;
        Ok(processes.iter().find(|p| p.name == name).cloned())
    }

    /// `(density, cost_per_unit_mass)` for a material
    pub fn get_material_rate(&self, name: &str) -> Result<Option<(f64, f64)>, CatalogError> {
        Ok(self.material(name)?.map(|m| m.rates()))
    }

    /// `(setup_time_minutes, hourly_rate, run_time_minutes)` for a process
    pub fn get_process_rates(&self, name: &str) -> Result<Option<(f64, f64, f64)>, CatalogError> {
        Ok(self.process(name)?.map(|p| p.rates()))
    }

    /// Materials for a selection list, priority rows first, otherwise catalog order
    pub fn materials_by_priority(&self) -> Result<Vec<MaterialRate>, CatalogError> {
        let mut materials = self.catalog.get_materials()?.rows.clone();
        // stable sort keeps catalog order within each group
        materials.sort_by_key(|m| !m.priority);
        Ok(materials)
    }

    /// Processes in catalog order, optionally limited to one category
    pub fn processes(
        &self,
        category: Option<&ProcessCategory>,
    ) -> Result<Vec<ProcessRate>, CatalogError> {
        let processes = self.catalog.get_processes()?;
        Ok(processes
            .iter()
            .filter(|p| category.map_or(true, |c| &p.category == c))
            .cloned()
            .collect())
    }
}
