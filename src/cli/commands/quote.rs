//! `qf quote` command - Price a session and print per-part breakdowns

use console::style;
use miette::{Result, WrapErr};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::cli::helpers::{
    format_material_rate, format_money, open_catalog, parse_override_spec, render_structured,
    render_table, resolve_format, OverrideSpec,
};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::engine::CostEngine;
use crate::core::overrides::{OverrideField, OverrideStore, PartOverrides};
use crate::core::rates::RateResolver;
use crate::core::units::UnitSystem;
use crate::core::Config;
use crate::entities::breakdown::{CostLineItem, PartCostResult};
use crate::entities::session::{set_display_override, PartEntry, QuoteSession};

/// Session-scoped overrides given on the command line
#[derive(clap::Args, Debug, Default)]
pub struct OverrideArgs {
    /// Override a line item: PART::KEY::FIELD=VALUE (FIELD: rate, setup, run)
    #[arg(long = "set", value_name = "PART::KEY::FIELD=VALUE", value_parser = parse_override_spec)]
    pub set: Vec<OverrideSpec>,

    /// Drop every override of a part, including ones from the session file
    #[arg(long = "clear", value_name = "PART")]
    pub clear: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct QuoteArgs {
    /// Session file (YAML)
    pub session: PathBuf,

    #[command(flatten)]
    pub overrides: OverrideArgs,
}

/// A session with its overrides applied and every part priced
pub struct PricedSession {
    pub session: QuoteSession,
    pub store: OverrideStore,
    pub results: Vec<PartCostResult>,
}

impl PricedSession {
    pub fn units(&self) -> UnitSystem {
        self.session.unit_system()
    }

    pub fn parts(&self) -> impl Iterator<Item = (&PartEntry, &PartCostResult)> {
        self.session.parts.iter().zip(&self.results)
    }
}

/// Load a session, apply command-line overrides and price every part
///
/// `--set` is applied before `--clear`, so clearing a part wins.
pub fn price_session(path: &Path, overrides: &OverrideArgs, config: &Config) -> Result<PricedSession> {
    let mut session = QuoteSession::load(path)?;
    session.units.get_or_insert(config.units());
    let units = session.unit_system();

    let mut store = session.override_store()?;
    for spec in &overrides.set {
        if session.part(&spec.part).is_none() {
            return Err(miette::miette!(
                help = "Part names are matched exactly, as written in the session file",
                "--set names unknown part '{}'",
                spec.part
            ));
        }
        set_display_override(
            &mut store,
            units,
            &spec.part,
            &spec.line_item_key,
            spec.field,
            spec.value,
        )?;
    }
    for part in &overrides.clear {
        if session.part(part).is_none() {
            tracing::warn!(part = %part, "--clear names a part that is not in the session");
        }
        store.clear(part);
    }

    let cache = open_catalog(config)?;
    let engine = CostEngine::new(RateResolver::new(&cache)).with_policy(config.on_unresolved());

    let mut results = Vec::with_capacity(session.parts.len());
    for part in &session.parts {
        let result = engine
            .calculate_part_breakdown(
                &part.config,
                part.canonical_volume(units),
                store.for_part(&part.name),
            )
            .wrap_err_with(|| format!("cannot price part '{}'", part.name))?;
        results.push(result);
    }

    Ok(PricedSession {
        session,
        store,
        results,
    })
}

/// One priced part for `-f json` / `-f yaml`
///
/// Values are canonical (lb, $/lb) apart from `display_weight`.
#[derive(Debug, Serialize)]
struct QuotedPart<'a> {
    name: &'a str,
    units: UnitSystem,
    display_weight: f64,
    #[serde(flatten)]
    result: &'a PartCostResult,
}

pub fn run(args: QuoteArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let format = resolve_format(global, &config);
    let priced = price_session(&args.session, &args.overrides, &config)?;
    let units = priced.units();

    let quoted: Vec<QuotedPart<'_>> = priced
        .parts()
        .map(|(part, result)| QuotedPart {
            name: &part.name,
            units,
            display_weight: units.weight_to_display(result.weight),
            result,
        })
        .collect();
    if let Some(out) = render_structured(format, &quoted)? {
        print!("{}", out);
        return Ok(());
    }

    if format == OutputFormat::Csv || format == OutputFormat::Tsv {
        return Err(miette::miette!(
            help = "Use `qf export` for flat CSV/TSV records",
            "qf quote prints breakdowns as tables, JSON or YAML"
        ));
    }

    let mut grand_total = 0.0;
    let mut any_override = false;
    for (part, result) in priced.parts() {
        let overrides = priced.store.for_part(&part.name);
        any_override |= priced.store.has_overrides(&part.name);
        print_part(part, result, overrides, units, format)?;
        grand_total += result.total_cost_batch;
    }

    if priced.results.len() > 1 {
        println!(
            "{} {}",
            style("Session total:").bold(),
            style(format_money(grand_total)).green().bold()
        );
    }
    if any_override && format == OutputFormat::Auto {
        println!("{}", style("* overridden value").dim());
    }

    Ok(())
}

fn print_part(
    part: &PartEntry,
    result: &PartCostResult,
    overrides: PartOverrides<'_>,
    units: UnitSystem,
    format: OutputFormat,
) -> Result<()> {
    let heading = format!(
        "{} (qty {}, {:.3} {})",
        part.name,
        result.quantity,
        units.weight_to_display(result.weight),
        units.mass_label()
    );
    if format == OutputFormat::Md {
        println!("## {}\n", heading);
    } else {
        println!("{}", style(heading).bold().cyan());
    }

    let headers = [
        "Line Item",
        "Rate",
        "Setup (min)",
        "Run (min)",
        "Setup Cost",
        "Run Cost/Part",
        "Batch Total",
    ];
    let rows: Vec<Vec<String>> = result
        .breakdown
        .iter()
        .map(|item| line_item_row(item, overrides, units))
        .collect();

    if rows.is_empty() {
        println!("  {}", style("(no priced line items)").dim());
    } else {
        print!("{}", render_table(format, &headers, &rows)?);
    }

    println!(
        "Per part: {}  Batch: {}",
        style(format_money(result.per_part_cost)).yellow(),
        style(format_money(result.total_cost_batch)).green()
    );
    println!();
    Ok(())
}

fn line_item_row(item: &CostLineItem, overrides: PartOverrides<'_>, units: UnitSystem) -> Vec<String> {
    let mark = |field: OverrideField| {
        if overrides.get(&item.line_item_key, field).is_some() {
            "*"
        } else {
            ""
        }
    };
    let minutes = |value: Option<f64>, field: OverrideField| {
        value
            .map(|m| format!("{:.1}{}", m, mark(field)))
            .unwrap_or_default()
    };

    let rate = if item.is_material() {
        format_material_rate(units, item.rate)
    } else {
        format!("{}/hr", format_money(item.rate))
    };

    vec![
        item.line_item_key.clone(),
        format!("{}{}", rate, mark(OverrideField::Rate)),
        minutes(item.setup_time_minutes, OverrideField::SetupTimeMinutes),
        minutes(item.run_time_minutes, OverrideField::RunTimeMinutes),
        format_money(item.setup_cost),
        format_money(item.run_cost_per_part),
        format_money(item.batch_total_cost),
    ]
}
