//! CSV parsing for catalog tables

use csv::StringRecord;
use std::collections::HashMap;

use super::source::FetchError;
use crate::entities::material::MaterialRate;
use crate::entities::process::{ProcessCategory, ProcessRate};

/// Build a map from header name to column index
fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.to_lowercase().trim().to_string(), i))
        .collect()
}

/// Find the first of several accepted header spellings
fn find_column(
    header_map: &HashMap<String, usize>,
    names: &[&'static str],
) -> Option<usize> {
    names.iter().find_map(|name| header_map.get(*name).copied())
}

fn require_column(
    header_map: &HashMap<String, usize>,
    names: &[&'static str],
) -> Result<usize, FetchError> {
    find_column(header_map, names).ok_or(FetchError::MissingColumn { column: names[0] })
}

fn get_field(record: &StringRecord, idx: Option<usize>) -> Option<&str> {
    idx.and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Rates, times and densities must be finite and non-negative
fn parse_number(value: &str) -> Option<f64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

fn get_number(record: &StringRecord, idx: Option<usize>) -> Option<f64> {
    get_field(record, idx).and_then(parse_number)
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "yes" | "y" | "1" | "x")
}

fn reader(text: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(text.as_bytes())
}

/// Parse the materials table
///
/// Rows without a name, or whose density or cost is not a finite
/// non-negative number, are skipped.
pub fn parse_materials(text: &str) -> Result<Vec<MaterialRate>, FetchError> {
    let mut rdr = reader(text);
    let header_map = build_header_map(rdr.headers()?);

    let name_col = require_column(&header_map, &["name"])?;
    let density_col = require_column(&header_map, &["density", "density (lb/in^3)"])?;
    let cost_col = require_column(&header_map, &["cost_per_unit_mass", "cost_per_lb"])?;
    let category_col = find_column(&header_map, &["category"]);
    let priority_col = find_column(&header_map, &["priority"]);

    let mut materials = Vec::new();
    for (row, result) in rdr.records().enumerate() {
        let record = result?;
        let line = row + 2;

        let Some(name) = get_field(&record, Some(name_col)) else {
            tracing::warn!(line, "skipping material row without a name");
            continue;
        };
        let (Some(density), Some(cost)) = (
            get_number(&record, Some(density_col)),
            get_number(&record, Some(cost_col)),
        ) else {
            tracing::warn!(line, material = name, "skipping material row with invalid rates");
            continue;
        };

        materials.push(MaterialRate {
            name: name.to_string(),
            category: get_field(&record, category_col).map(str::to_string),
            density,
            cost_per_unit_mass: cost,
            priority: get_field(&record, priority_col).map_or(false, parse_flag),
        });
    }

    Ok(materials)
}

/// Parse the processes table
///
/// `run_time_mins` is optional, both as a column and per cell; a cell that
/// is present but invalid skips the row like any other bad number.
pub fn parse_processes(text: &str) -> Result<Vec<ProcessRate>, FetchError> {
    let mut rdr = reader(text);
    let header_map = build_header_map(rdr.headers()?);

    let name_col = require_column(&header_map, &["name"])?;
    let category_col = require_column(&header_map, &["category"])?;
    let setup_col = require_column(&header_map, &["setup_time_mins", "setup_time_minutes"])?;
    let rate_col = require_column(&header_map, &["hourly_rate"])?;
    let run_col = find_column(&header_map, &["run_time_mins", "run_time_minutes"]);

    let mut processes = Vec::new();
    for (row, result) in rdr.records().enumerate() {
        let record = result?;
        let line = row + 2;

        let Some(name) = get_field(&record, Some(name_col)) else {
            tracing::warn!(line, "skipping process row without a name");
            continue;
        };
        let (Some(setup), Some(rate)) = (
            get_number(&record, Some(setup_col)),
            get_number(&record, Some(rate_col)),
        ) else {
            tracing::warn!(line, process = name, "skipping process row with invalid rates");
            continue;
        };
        let run = match get_field(&record, run_col) {
            None => None,
            Some(cell) => match parse_number(cell) {
                Some(run) => Some(run),
                None => {
                    tracing::warn!(line, process = name, "skipping process row with invalid run time");
                    continue;
                }
            },
        };

        processes.push(ProcessRate::new(
            name,
            ProcessCategory::from_catalog(get_field(&record, Some(category_col)).unwrap_or("")),
            setup,
            rate,
            run,
        ));
    }

    Ok(processes)
}
