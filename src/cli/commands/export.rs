//! `qf export` command - Flatten a priced session into records

use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::commands::quote::{price_session, OverrideArgs};
use crate::cli::helpers::{resolve_format, write_output};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::export::{flatten, ExportRow, FlatTable};
use crate::core::Config;

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    /// Session file (YAML)
    pub session: PathBuf,

    /// Output to file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: OverrideArgs,
}

pub fn run(args: ExportArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let format = resolve_format(global, &config);
    let priced = price_session(&args.session, &args.overrides, &config)?;

    let rows: Vec<ExportRow<'_>> = priced
        .parts()
        .map(|(part, result)| ExportRow {
            name: &part.name,
            config: &part.config,
            result,
        })
        .collect();
    let table = flatten(&rows);
    tracing::info!(
        records = table.records.len(),
        columns = table.columns.len(),
        "export flattened"
    );

    let content = render(&table, format)?;
    write_output(&content, args.output)
}

/// Render the flat table; `auto` means CSV
fn render(table: &FlatTable, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Auto | OutputFormat::Csv => table.to_csv_string().into_diagnostic(),
        OutputFormat::Tsv => {
            let mut buf = Vec::new();
            table.write_delimited(&mut buf, b'\t').into_diagnostic()?;
            Ok(String::from_utf8_lossy(&buf).into_owned())
        }
        OutputFormat::Md => Ok(format!("{}\n", table.to_markdown())),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&table.records).into_diagnostic()?;
            Ok(format!("{}\n", json))
        }
        OutputFormat::Yaml => serde_yml::to_string(&table.records).into_diagnostic(),
    }
}
