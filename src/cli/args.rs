//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};

use crate::cli::commands::{
    catalog::CatalogCommands, completions::CompletionsArgs, config::ConfigCommands,
    export::ExportArgs, init::InitArgs, quote::QuoteArgs,
};

#[derive(Parser)]
#[command(name = "qf")]
#[command(author, version, about = "QuoteForge manufacturing cost estimator")]
#[command(long_about = "Estimates part cost from volume, material and manufacturing processes, using a periodically refreshed rate catalog with per-line-item overrides.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Only log errors
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Log debug detail (cache hits, fetches, skipped rows)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a QuoteForge project (.qf/config.yaml)
    Init(InitArgs),

    /// Inspect the materials and processes catalog
    #[command(subcommand)]
    Catalog(CatalogCommands),

    /// Price every part of a session and print the breakdowns
    Quote(QuoteArgs),

    /// Export a session as flat records (CSV, Markdown, JSON)
    Export(ExportArgs),

    /// View and modify configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pick per command (tables for the terminal, CSV for export)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
}
