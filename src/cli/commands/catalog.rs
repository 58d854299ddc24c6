//! `qf catalog` command - Inspect the rate catalog

use clap::Subcommand;
use console::style;
use miette::Result;
use serde::Serialize;

use crate::cli::helpers::{
    open_catalog, render_structured, render_table, resolve_format, truncate_str,
};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::catalog::{CatalogProvider, CatalogTable};
use crate::core::rates::RateResolver;
use crate::core::Config;
use crate::entities::process::ProcessCategory;

#[derive(Subcommand, Debug)]
pub enum CatalogCommands {
    /// List materials, priority materials first
    Materials(MaterialsArgs),

    /// List manufacturing processes
    Processes(ProcessesArgs),

    /// Fetch both tables and report their state
    Status,
}

#[derive(clap::Args, Debug)]
pub struct MaterialsArgs {
    /// Only materials in this category (case-insensitive)
    #[arg(long, short = 'c')]
    pub category: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ProcessesArgs {
    /// Only processes in this category (cutting, machining, fabrication, finishing, ...)
    #[arg(long, short = 'c')]
    pub category: Option<String>,
}

/// Run a catalog subcommand
pub fn run(cmd: CatalogCommands, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let format = resolve_format(global, &config);

    match cmd {
        CatalogCommands::Materials(args) => run_materials(args, &config, format),
        CatalogCommands::Processes(args) => run_processes(args, &config, format),
        CatalogCommands::Status => run_status(&config, format),
    }
}

/// A material row in display units
#[derive(Debug, Serialize)]
struct MaterialRow {
    name: String,
    category: Option<String>,
    density: f64,
    density_unit: &'static str,
    cost_per_unit_mass: f64,
    cost_unit: &'static str,
    priority: bool,
}

fn run_materials(args: MaterialsArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let cache = open_catalog(config)?;
    let resolver = RateResolver::new(&cache);
    let units = config.units();

    let rows: Vec<MaterialRow> = resolver
        .materials_by_priority()?
        .into_iter()
        .filter(|m| match (&args.category, &m.category) {
            (Some(wanted), Some(category)) => category.eq_ignore_ascii_case(wanted),
            (Some(_), None) => false,
            (None, _) => true,
        })
        .map(|m| MaterialRow {
            density: units.density_to_display(m.density),
            density_unit: units.density_label(),
            cost_per_unit_mass: units.material_rate_to_display(m.cost_per_unit_mass),
            cost_unit: units.material_rate_label(),
            name: m.name,
            category: m.category,
            priority: m.priority,
        })
        .collect();

    if let Some(out) = render_structured(format, &rows)? {
        print!("{}", out);
        return Ok(());
    }

    let density_header = format!("Density ({})", units.density_label());
    let cost_header = format!("Cost ({})", units.material_rate_label());
    let headers = [
        "Name",
        "Category",
        density_header.as_str(),
        cost_header.as_str(),
        "Priority",
    ];
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            vec![
                r.name.clone(),
                r.category.clone().unwrap_or_default(),
                format!("{:.4}", r.density),
                format!("{:.2}", r.cost_per_unit_mass),
                if r.priority { "*" } else { "" }.to_string(),
            ]
        })
        .collect();

    print!("{}", render_table(format, &headers, &cells)?);
    print_summary(format, rows.len(), "material");
    Ok(())
}

fn run_processes(args: ProcessesArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let cache = open_catalog(config)?;
    let resolver = RateResolver::new(&cache);
    let wanted = args
        .category
        .as_deref()
        .map(ProcessCategory::from_catalog);

    let rows = resolver.processes(wanted.as_ref())?;

    if let Some(out) = render_structured(format, &rows)? {
        print!("{}", out);
        return Ok(());
    }

    let headers = [
        "Name",
        "Category",
        "Setup (min)",
        "Run (min)",
        "Rate ($/hr)",
    ];
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|p| {
            vec![
                p.name.clone(),
                p.category.to_string(),
                format!("{:.1}", p.setup_time_minutes),
                format!("{:.1}", p.run_time_minutes),
                format!("{:.2}", p.hourly_rate),
            ]
        })
        .collect();

    print!("{}", render_table(format, &headers, &cells)?);
    print_summary(format, rows.len(), "process");
    Ok(())
}

#[derive(Debug, Serialize)]
struct StatusRow {
    table: CatalogTable,
    endpoint: Option<String>,
    rows: Option<usize>,
    fetched_at: Option<String>,
    error: Option<String>,
}

fn run_status(config: &Config, format: OutputFormat) -> Result<()> {
    let cache = open_catalog(config)?;

    let errors = [
        cache.get_materials().err().map(|e| e.to_string()),
        cache.get_processes().err().map(|e| e.to_string()),
    ];

    let rows: Vec<StatusRow> = cache
        .status()
        .into_iter()
        .zip(errors)
        .map(|(status, error)| StatusRow {
            endpoint: match status.table {
                CatalogTable::Materials => config.endpoints.materials.clone(),
                CatalogTable::Processes => config.endpoints.processes.clone(),
            },
            table: status.table,
            rows: status.rows,
            fetched_at: status.fetched_at.map(|t| t.to_rfc3339()),
            error,
        })
        .collect();

    if let Some(out) = render_structured(format, &rows)? {
        print!("{}", out);
    } else {
        let headers = ["Table", "Endpoint", "Rows", "Fetched", "State"];
        let cells: Vec<Vec<String>> = rows
            .iter()
            .map(|r| {
                vec![
                    r.table.to_string(),
                    r.endpoint
                        .as_deref()
                        .map(|e| truncate_str(e, 48))
                        .unwrap_or_else(|| "(not set)".to_string()),
                    r.rows.map(|n| n.to_string()).unwrap_or_default(),
                    r.fetched_at.clone().unwrap_or_default(),
                    match &r.error {
                        Some(e) => truncate_str(e, 60),
                        None => "ok".to_string(),
                    },
                ]
            })
            .collect();
        print!("{}", render_table(format, &headers, &cells)?);

        if format == OutputFormat::Auto {
            println!(
                "{} refresh every {} min, units {}",
                style("Cache:").dim(),
                config.refresh_rate_minutes(),
                config.units()
            );
        }
    }

    if rows.iter().any(|r| r.error.is_some()) {
        return Err(miette::miette!(
            help = "Check the endpoints with `qf config show`",
            "catalog unavailable"
        ));
    }
    Ok(())
}

fn print_summary(format: OutputFormat, count: usize, noun: &str) {
    if format == OutputFormat::Auto {
        println!("{}", style(format!("{} {}(s)", count, noun)).dim());
    }
}
