//! Export formatter - flattens part results into tabular records
//!
//! Every record carries the same fixed base columns in declared order,
//! followed by one column per process line item seen across the whole
//! export, sorted by name. Records are built as sparse maps first and only
//! expanded to the full column set at the end, so a part that lacks a value
//! gets an explicit empty cell rather than a shorter row.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use tabled::{builder::Builder, settings::Style};

use crate::entities::breakdown::PartCostResult;
use crate::entities::part::{PartConfig, ProcessFlag};

/// Sentinel for an unselected process
pub const NONE_SENTINEL: &str = "None";

/// Value written for a selected boolean process
pub const SELECTED: &str = "Yes";

pub const COL_PART_NAME: &str = "Part Name";
pub const COL_QUANTITY: &str = "Quantity";
pub const COL_MATERIAL: &str = "Material";
pub const COL_WEIGHT: &str = "Weight (lb)";
pub const COL_MATERIAL_COST: &str = "Material Cost ($)";
pub const COL_PER_PART: &str = "Per-Part Cost ($)";
pub const COL_TOTAL: &str = "Total Batch Cost ($)";
pub const COL_CUTTING: &str = "Cutting";
pub const COL_FINISHING: &str = "Finishing";

/// Fixed base columns in emission order
pub fn base_columns() -> Vec<&'static str> {
    let mut columns = vec![
        COL_PART_NAME,
        COL_QUANTITY,
        COL_MATERIAL,
        COL_WEIGHT,
        COL_MATERIAL_COST,
        COL_PER_PART,
        COL_TOTAL,
        COL_CUTTING,
    ];
    columns.extend(ProcessFlag::ALL.iter().map(|flag| flag.display_name()));
    columns.push(COL_FINISHING);
    columns
}

/// Name of the dynamic cost column for a process line item
pub fn process_cost_column(process_name: &str) -> String {
    format!("Cost: {} ($)", process_name)
}

/// One input row: a named part with its configuration and result
#[derive(Debug, Clone, Copy)]
pub struct ExportRow<'a> {
    pub name: &'a str,
    pub config: &'a PartConfig,
    pub result: &'a PartCostResult,
}

/// A single cell
#[derive(Debug, Clone, PartialEq)]
pub enum FlatValue {
    Text(String),
    Integer(u64),
    /// Dollar amount
    Money(f64),
    /// Weight in lb
    Weight(f64),
    Empty,
}

impl FlatValue {
    /// Text rendering used by the CSV and Markdown sinks
    pub fn render(&self) -> String {
        match self {
            FlatValue::Text(s) => s.clone(),
            FlatValue::Integer(n) => n.to_string(),
            FlatValue::Money(v) => format!("{:.2}", v),
            FlatValue::Weight(v) => format!("{:.3}", v),
            FlatValue::Empty => String::new(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FlatValue::Money(v) | FlatValue::Weight(v) => Some(*v),
            FlatValue::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }
}

impl Serialize for FlatValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FlatValue::Text(s) => serializer.serialize_str(s),
            FlatValue::Integer(n) => serializer.serialize_u64(*n),
            FlatValue::Money(v) | FlatValue::Weight(v) => serializer.serialize_f64(*v),
            FlatValue::Empty => serializer.serialize_none(),
        }
    }
}

/// One flattened part, values in column order
#[derive(Debug, Clone, PartialEq)]
pub struct FlatRecord {
    pub values: Vec<(String, FlatValue)>,
}

impl FlatRecord {
    pub fn get(&self, column: &str) -> Option<&FlatValue> {
        self.values
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }
}

impl Serialize for FlatRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (column, value) in &self.values {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// Flattened export: the column layout plus one record per part
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatTable {
    pub columns: Vec<String>,
    pub records: Vec<FlatRecord>,
}

impl FlatTable {
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        self.write_delimited(writer, b',')
    }

    /// CSV with a custom delimiter (`b'\t'` for TSV)
    pub fn write_delimited<W: Write>(&self, writer: W, delimiter: u8) -> Result<(), csv::Error> {
        let mut wtr = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(writer);
        wtr.write_record(&self.columns)?;
        for record in &self.records {
            wtr.write_record(record.values.iter().map(|(_, value)| value.render()))?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn to_csv_string(&self) -> Result<String, csv::Error> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    pub fn to_markdown(&self) -> String {
        let mut builder = Builder::default();
        builder.push_record(self.columns.iter().cloned());
        for record in &self.records {
            builder.push_record(record.values.iter().map(|(_, value)| value.render()));
        }
        builder.build().with(Style::markdown()).to_string()
    }
}

fn select_value(selection: Option<&str>) -> FlatValue {
    FlatValue::Text(selection.unwrap_or(NONE_SENTINEL).to_string())
}

/// Sparse record for one part: base values plus its own process columns
fn sparse_record(row: &ExportRow<'_>) -> BTreeMap<String, FlatValue> {
    let mut record = BTreeMap::new();
    let result = row.result;

    record.insert(COL_PART_NAME.to_string(), FlatValue::Text(row.name.to_string()));
    record.insert(COL_QUANTITY.to_string(), FlatValue::Integer(u64::from(result.quantity)));
    if let Some(ref material) = row.config.material {
        record.insert(COL_MATERIAL.to_string(), FlatValue::Text(material.clone()));
        record.insert(COL_WEIGHT.to_string(), FlatValue::Weight(result.weight));
    }
    record.insert(COL_PER_PART.to_string(), FlatValue::Money(result.per_part_cost));
    record.insert(COL_TOTAL.to_string(), FlatValue::Money(result.total_cost_batch));
    record.insert(COL_CUTTING.to_string(), select_value(row.config.cutting.as_deref()));
    for flag in ProcessFlag::ALL {
        let value = if row.config.has_flag(flag) {
            FlatValue::Text(SELECTED.to_string())
        } else {
            FlatValue::Text(NONE_SENTINEL.to_string())
        };
        record.insert(flag.display_name().to_string(), value);
    }
    record.insert(COL_FINISHING.to_string(), select_value(row.config.finishing.as_deref()));

    let mut material_cost = None;
    for item in &result.breakdown {
        if item.is_material() {
            *material_cost.get_or_insert(0.0) += item.batch_total_cost;
            continue;
        }
        let column = process_cost_column(&item.line_item_key);
        let total = match record.get(&column).and_then(FlatValue::as_f64) {
            Some(existing) => existing + item.batch_total_cost,
            None => item.batch_total_cost,
        };
        record.insert(column, FlatValue::Money(total));
    }
    // a selected material always gets a cost, 0.00 when it went unpriced
    if material_cost.is_some() || row.config.material.is_some() {
        record.insert(
            COL_MATERIAL_COST.to_string(),
            FlatValue::Money(material_cost.unwrap_or(0.0)),
        );
    }

    record
}

/// Flatten parts into a table with a stable column layout
pub fn flatten(rows: &[ExportRow<'_>]) -> FlatTable {
    let base = base_columns();
    let sparse: Vec<BTreeMap<String, FlatValue>> = rows.iter().map(sparse_record).collect();

    // BTreeSet keeps dynamic columns sorted
    let dynamic: BTreeSet<&String> = sparse
        .iter()
        .flat_map(|record| record.keys())
        .filter(|key| !base.contains(&key.as_str()))
        .collect();

    let columns: Vec<String> = base
        .iter()
        .map(|c| c.to_string())
        .chain(dynamic.into_iter().cloned())
        .collect();

    let records = sparse
        .iter()
        .map(|record| FlatRecord {
            values: columns
                .iter()
                .map(|column| {
                    let value = record.get(column).cloned().unwrap_or(FlatValue::Empty);
                    (column.clone(), value)
                })
                .collect(),
        })
        .collect();

    FlatTable { columns, records }
}
