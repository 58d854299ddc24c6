//! Shared helper functions for CLI commands
//!
//! This module contains utility functions that are used across multiple
//! command modules to avoid code duplication.

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use tabled::{builder::Builder, settings::Style};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::catalog::{CatalogCache, EndpointSource};
use crate::core::overrides::OverrideField;
use crate::core::units::UnitSystem;
use crate::core::Config;

/// Resolve `auto` against the configured `default_format`
pub fn resolve_format(global: &GlobalOpts, config: &Config) -> OutputFormat {
    if global.format != OutputFormat::Auto {
        return global.format;
    }
    config
        .default_format
        .as_deref()
        .and_then(|name| <OutputFormat as clap::ValueEnum>::from_str(name, true).ok())
        .unwrap_or(OutputFormat::Auto)
}

/// Build the session's catalog cache from configuration
pub fn open_catalog(config: &Config) -> Result<CatalogCache<EndpointSource>> {
    let source = config.endpoint_source().into_diagnostic()?;
    tracing::debug!(?source, minutes = config.refresh_rate_minutes(), "catalog configured");
    Ok(CatalogCache::new(source, config.refresh_rate_minutes()))
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

pub fn format_money(value: f64) -> String {
    format!("${:.2}", value)
}

/// Canonical $/lb shown in display units, e.g. "$11.02/kg"
pub fn format_material_rate(units: UnitSystem, per_lb: f64) -> String {
    format!(
        "{}/{}",
        format_money(units.material_rate_to_display(per_lb)),
        units.mass_label()
    )
}

/// Render rows as a terminal table, Markdown, CSV or TSV
///
/// JSON and YAML are structured rather than tabular; callers serialize
/// their own rows for those.
pub fn render_table(format: OutputFormat, headers: &[&str], rows: &[Vec<String>]) -> Result<String> {
    match format {
        OutputFormat::Csv | OutputFormat::Tsv => {
            let delimiter = if format == OutputFormat::Tsv { b'\t' } else { b',' };
            let mut buf = Vec::new();
            {
                let mut wtr = csv::WriterBuilder::new()
                    .delimiter(delimiter)
                    .from_writer(&mut buf);
                wtr.write_record(headers).into_diagnostic()?;
                for row in rows {
                    wtr.write_record(row).into_diagnostic()?;
                }
                wtr.flush().into_diagnostic()?;
            }
            Ok(String::from_utf8_lossy(&buf).into_owned())
        }
        _ => {
            let mut builder = Builder::default();
            builder.push_record(headers.iter().copied());
            for row in rows {
                builder.push_record(row.iter().cloned());
            }
            let mut table = builder.build();
            if format == OutputFormat::Md {
                table.with(Style::markdown());
            } else {
                table.with(Style::rounded());
            }
            Ok(format!("{}\n", table))
        }
    }
}

/// Serialize for `-f json` / `-f yaml`; `None` for the tabular formats
pub fn render_structured<T: Serialize + ?Sized>(
    format: OutputFormat,
    value: &T,
) -> Result<Option<String>> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value).into_diagnostic()?;
            Ok(Some(format!("{}\n", json)))
        }
        OutputFormat::Yaml => Ok(Some(serde_yml::to_string(value).into_diagnostic()?)),
        _ => Ok(None),
    }
}

/// Write to a file, or stdout when no path is given
pub fn write_output(content: &str, output_path: Option<PathBuf>) -> Result<()> {
    if let Some(path) = output_path {
        let mut file = std::fs::File::create(&path).into_diagnostic()?;
        file.write_all(content.as_bytes()).into_diagnostic()?;
        eprintln!(
            "{} Written to {}",
            style("✓").green(),
            style(path.display()).cyan()
        );
    } else {
        print!("{}", content);
    }
    Ok(())
}

/// `PART::KEY::FIELD=VALUE` from `--set`
#[derive(Debug, Clone, PartialEq)]
pub struct OverrideSpec {
    pub part: String,
    pub line_item_key: String,
    pub field: OverrideField,
    pub value: f64,
}

/// clap value parser for `--set`
///
/// The line-item key may itself contain `::`; the part is everything
/// before the first separator and the field everything after the last.
pub fn parse_override_spec(s: &str) -> Result<OverrideSpec, String> {
    let (target, value) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("expected PART::KEY::FIELD=VALUE, got '{}'", s))?;
    let (part_key, field) = target
        .rsplit_once("::")
        .ok_or_else(|| format!("expected PART::KEY::FIELD=VALUE, got '{}'", s))?;
    let (part, key) = part_key
        .split_once("::")
        .ok_or_else(|| format!("expected PART::KEY::FIELD=VALUE, got '{}'", s))?;

    if part.trim().is_empty() || key.trim().is_empty() {
        return Err(format!("part and line item must not be empty in '{}'", s));
    }

    let field: OverrideField = field.trim().parse().map_err(|e| format!("{}", e))?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", value.trim()))?;

    Ok(OverrideSpec {
        part: part.trim().to_string(),
        line_item_key: key.trim().to_string(),
        field,
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
        assert_eq!(truncate_str("µµµµµµ", 5), "µµ...");
    }

    #[test]
    fn test_format_material_rate() {
        assert_eq!(format_material_rate(UnitSystem::Imperial, 5.0), "$5.00/lb");
        assert_eq!(format_material_rate(UnitSystem::Metric, 5.0), "$11.02/kg");
    }

    #[test]
    fn test_parse_override_spec() {
        let spec = parse_override_spec("Bracket::Machining::rate=120").unwrap();
        assert_eq!(spec.part, "Bracket");
        assert_eq!(spec.line_item_key, "Machining");
        assert_eq!(spec.field, OverrideField::Rate);
        assert_eq!(spec.value, 120.0);

        let spec =
            parse_override_spec("Part A::Material: Test Metal::rate=5.5").unwrap();
        assert_eq!(spec.part, "Part A");
        assert_eq!(spec.line_item_key, "Material: Test Metal");
    }

    #[test]
    fn test_parse_override_spec_rejects_malformed() {
        assert!(parse_override_spec("Bracket::Machining=120").is_err());
        assert!(parse_override_spec("Bracket::Machining::rate").is_err());
        assert!(parse_override_spec("Bracket::Machining::speed=1").is_err());
        assert!(parse_override_spec("Bracket::Machining::rate=fast").is_err());
        assert!(parse_override_spec("::Machining::rate=1").is_err());
    }

    #[test]
    fn test_render_csv_and_md() {
        let rows = vec![vec!["Steel".to_string(), "1,5".to_string()]];
        let csv = render_table(OutputFormat::Csv, &["Name", "Cost"], &rows).unwrap();
        assert_eq!(csv, "Name,Cost\nSteel,\"1,5\"\n");

        let tsv = render_table(OutputFormat::Tsv, &["Name", "Cost"], &rows).unwrap();
        assert_eq!(tsv, "Name\tCost\nSteel\t1,5\n");

        let md = render_table(OutputFormat::Md, &["Name", "Cost"], &rows).unwrap();
        assert!(md.contains("| Name"));
        assert!(md.contains("Steel"));
    }

    #[test]
    fn test_resolve_format_uses_config_default() {
        let global = GlobalOpts {
            format: OutputFormat::Auto,
            quiet: false,
            verbose: false,
        };
        let config = Config {
            default_format: Some("json".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_format(&global, &config), OutputFormat::Json);

        let explicit = GlobalOpts {
            format: OutputFormat::Md,
            ..global
        };
        assert_eq!(resolve_format(&explicit, &config), OutputFormat::Md);
    }
}
