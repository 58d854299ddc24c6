//! `qf config` command - Configuration management
//!
//! Shows the effective configuration and edits the project or global file.

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use serde_yml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::helpers::{render_structured, resolve_format};
use crate::cli::GlobalOpts;
use crate::core::config::KEYS;
use crate::core::project::Project;
use crate::core::Config;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration values
    Show(ShowArgs),

    /// Set a configuration value
    Set(SetArgs),

    /// Unset (remove) a configuration value
    Unset(UnsetArgs),

    /// Show paths to configuration files
    Path,

    /// List all available configuration keys
    Keys,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Show only this key's value
    pub key: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Configuration key (e.g., endpoints.materials, refresh_rate_minutes)
    pub key: String,

    /// Value to set
    pub value: String,

    /// Set in global (user) config instead of project config
    #[arg(long, short = 'g')]
    pub global: bool,
}

#[derive(clap::Args, Debug)]
pub struct UnsetArgs {
    /// Configuration key to remove
    pub key: String,

    /// Remove from global (user) config instead of project config
    #[arg(long, short = 'g')]
    pub global: bool,
}

/// Run a config subcommand
pub fn run(cmd: ConfigCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ConfigCommands::Show(args) => run_show(args, global),
        ConfigCommands::Set(args) => run_set(args),
        ConfigCommands::Unset(args) => run_unset(args),
        ConfigCommands::Path => run_path(),
        ConfigCommands::Keys => run_keys(),
    }
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();

    if let Some(key) = &args.key {
        check_key(key)?;
        return match config.value(key) {
            Some(v) => {
                println!("{}", v);
                Ok(())
            }
            None => Err(miette::miette!("Key '{}' is not set", key)),
        };
    }

    if let Some(out) = render_structured(resolve_format(global, &config), &config)? {
        print!("{}", out);
        return Ok(());
    }

    println!("{}", style("Effective Configuration").bold().underlined());
    println!();
    for (key, _) in KEYS {
        match config.value(key) {
            Some(v) => println!("  {}: {}", style(key).cyan(), style(v).yellow()),
            None => println!("  {}: {}", style(key).cyan(), style("(not set)").dim()),
        }
    }

    println!();
    println!("{}", style("Config Sources (in priority order):").dim());
    println!("  1. Environment variables (QF_MATERIALS_URL, QF_PROCESSES_URL, QF_REFRESH_MINUTES, QF_UNITS, QF_ON_UNRESOLVED)");
    println!("  2. Project config (.qf/config.yaml)");
    println!("  3. Global config (~/.config/quoteforge/config.yaml)");

    Ok(())
}

fn run_set(args: SetArgs) -> Result<()> {
    check_key(&args.key)?;
    let config_path = config_path(args.global)?;

    let mut root = read_mapping(&config_path)?;
    set_nested_value(&mut root, &args.key, parse_scalar(&args.value));

    // reject values the loader would ignore
    serde_yml::from_value::<Config>(root.clone()).map_err(|e| {
        miette::miette!(
            help = "See `qf config keys` for the accepted values",
            "invalid value '{}' for {}: {}",
            args.value,
            args.key,
            e
        )
    })?;

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent).into_diagnostic()?;
    }
    let yaml = serde_yml::to_string(&root).into_diagnostic()?;
    fs::write(&config_path, yaml).into_diagnostic()?;

    let scope = if args.global { "global" } else { "project" };
    println!(
        "{} Set {} {} {} in {} config",
        style("✓").green(),
        style(&args.key).cyan(),
        style("→").dim(),
        style(&args.value).yellow(),
        scope
    );

    Ok(())
}

fn run_unset(args: UnsetArgs) -> Result<()> {
    check_key(&args.key)?;
    let config_path = config_path(args.global)?;

    if !config_path.exists() {
        return Err(miette::miette!(
            "Config file does not exist: {}",
            config_path.display()
        ));
    }

    let mut root = read_mapping(&config_path)?;
    if !unset_nested_value(&mut root, &args.key) {
        return Err(miette::miette!("Key '{}' not found in config", args.key));
    }

    let yaml = serde_yml::to_string(&root).into_diagnostic()?;
    fs::write(&config_path, yaml).into_diagnostic()?;

    let scope = if args.global { "global" } else { "project" };
    println!(
        "{} Removed {} from {} config",
        style("✓").green(),
        style(&args.key).cyan(),
        scope
    );

    Ok(())
}

fn run_path() -> Result<()> {
    let global_path = global_config_path()?;

    println!("{}", style("Configuration file paths:").bold());
    println!();
    println!("  {} {}", style("Global:").cyan(), global_path.display());
    print_exists(global_path.exists());

    println!();
    match project_config_path() {
        Ok(path) => {
            println!("  {} {}", style("Project:").cyan(), path.display());
            print_exists(path.exists());
        }
        Err(_) => println!(
            "  {} {}",
            style("Project:").cyan(),
            style("(not in a QuoteForge project)").dim()
        ),
    }

    Ok(())
}

fn run_keys() -> Result<()> {
    println!("{}", style("Available configuration keys:").bold());
    println!();

    for (key, description) in KEYS {
        println!("  {:<24} {}", style(key).cyan(), style(description).dim());
    }

    println!();
    println!(
        "{}",
        style("Use 'qf config set <key> <value>' to set a value.").dim()
    );

    Ok(())
}

// Helper functions

fn print_exists(exists: bool) {
    if exists {
        println!("          {}", style("(exists)").green());
    } else {
        println!("          {}", style("(not created)").dim());
    }
}

fn check_key(key: &str) -> Result<()> {
    if Config::is_valid_key(key) {
        Ok(())
    } else {
        Err(miette::miette!(
            help = "Run `qf config keys` to list the available keys",
            "unknown configuration key '{}'",
            key
        ))
    }
}

fn config_path(global: bool) -> Result<PathBuf> {
    if global {
        global_config_path()
    } else {
        project_config_path()
    }
}

fn global_config_path() -> Result<PathBuf> {
    Config::global_config_path()
        .ok_or_else(|| miette::miette!("Could not determine global config directory"))
}

fn project_config_path() -> Result<PathBuf> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    Ok(project.config_path())
}

/// Existing file as a mapping; missing, empty or comment-only files are empty
fn read_mapping(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Ok(Value::Mapping(Mapping::new()));
    }
    let content = fs::read_to_string(path).into_diagnostic()?;
    let parsed: Value = serde_yml::from_str(&content).unwrap_or(Value::Null);
    match parsed {
        Value::Mapping(_) => Ok(parsed),
        _ => Ok(Value::Mapping(Mapping::new())),
    }
}

/// Numbers stay numbers so typed keys deserialize; everything else is text
fn parse_scalar(value: &str) -> Value {
    match serde_yml::from_str::<Value>(value) {
        Ok(v @ Value::Number(_)) => v,
        _ => Value::String(value.to_string()),
    }
}

fn set_nested_value(root: &mut Value, key: &str, value: Value) {
    let mut current = root;
    let mut parts = key.split('.').peekable();

    while let Some(part) = parts.next() {
        let Value::Mapping(map) = current else {
            return;
        };
        let map_key = Value::String(part.to_string());

        if parts.peek().is_none() {
            map.insert(map_key, value);
            return;
        }

        let child = map
            .entry(map_key)
            .or_insert_with(|| Value::Mapping(Mapping::new()));
        if !child.is_mapping() {
            *child = Value::Mapping(Mapping::new());
        }
        current = child;
    }
}

fn unset_nested_value(root: &mut Value, key: &str) -> bool {
    let (parents, last) = key.rsplit_once('.').unwrap_or(("", key));

    let mut current = root;
    if !parents.is_empty() {
        for part in parents.split('.') {
            let Value::Mapping(map) = current else {
                return false;
            };
            match map.get_mut(Value::String(part.to_string())) {
                Some(next) => current = next,
                None => return false,
            }
        }
    }

    match current {
        Value::Mapping(map) => map.remove(Value::String(last.to_string())).is_some(),
        _ => false,
    }
}
