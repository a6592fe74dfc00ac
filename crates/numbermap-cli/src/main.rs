use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use numbermap_catalog::{map_table, ColumnMetadata, MetadataSource, MockSourceBuilder, TableIdentifier};
use numbermap_core::{ConnectorConfig, TypeCode};
use numbermap_engine::{ColumnMapper, RawValue, Resolution};

const DEFAULT_CONFIG: &str = "numbermap.toml";

/// numbermap - map source NUMBER columns onto fixed target types
#[derive(Parser)]
#[command(name = "numbermap")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: numbermap.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override a config key, e.g. --set number.decimal.round-mode=HALF_UP
    #[arg(long = "set", value_name = "KEY=VALUE", global = true)]
    overrides: Vec<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the target type chosen for a column declaration
    Resolve {
        /// Column size reported by the driver (0 when undeclared)
        #[arg(short, long, allow_hyphen_values = true)]
        precision: i32,

        /// Decimal digits reported by the driver (-127 when undeclared)
        #[arg(short, long, allow_hyphen_values = true)]
        scale: i32,

        /// Driver type code (default: NUMERIC)
        #[arg(short, long, default_value_t = TypeCode::NUMERIC.0, allow_hyphen_values = true)]
        type_code: i32,

        /// Print the mapping as JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert literal values through the column's converter
    Convert {
        #[arg(short, long, allow_hyphen_values = true)]
        precision: i32,

        #[arg(short, long, allow_hyphen_values = true)]
        scale: i32,

        /// Decimal literals to convert
        #[arg(required = true, allow_hyphen_values = true)]
        values: Vec<String>,
    },

    /// Validate the configuration and print the effective settings
    Check,

    /// Map every column of a table described in a metadata file
    Map {
        /// JSON file: table FQN to its column metadata
        #[arg(short, long)]
        metadata: PathBuf,

        /// Table to map, as database.schema.table
        #[arg(short, long)]
        table: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "warn" }));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = load_config(cli.config.as_deref(), &cli.overrides, cli.verbose)?;
    tracing::debug!(properties = ?config.to_properties(), "loaded configuration");

    match cli.command {
        Commands::Resolve {
            precision,
            scale,
            type_code,
            json,
        } => resolve_command(&config, TypeCode(type_code), precision, scale, json),
        Commands::Convert {
            precision,
            scale,
            values,
        } => convert_command(&config, precision, scale, &values),
        Commands::Check => check_command(&config),
        Commands::Map { metadata, table } => map_command(&config, &metadata, &table, cli.verbose).await,
    }
}

fn load_config(path: Option<&Path>, overrides: &[String], verbose: bool) -> Result<ConnectorConfig> {
    let mut config = if let Some(config_path) = path {
        ConnectorConfig::from_file(config_path)?
    } else if Path::new(DEFAULT_CONFIG).exists() {
        ConnectorConfig::from_file(Path::new(DEFAULT_CONFIG))?
    } else {
        if verbose {
            eprintln!("{}", "No config file found, using defaults".yellow());
        }
        ConnectorConfig::default()
    };

    for pair in overrides {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("Invalid --set '{}': expected KEY=VALUE", pair))?;
        config.apply(key.trim(), value.trim())?;
    }

    Ok(config)
}

/// Resolve command - print the target type for one declaration
fn resolve_command(config: &ConnectorConfig, type_code: TypeCode, precision: i32, scale: i32, json: bool) -> Result<()> {
    let mapper = ColumnMapper::new(&config.policy);
    let resolution = mapper.map_column("column", type_code, precision, scale)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&resolution)?);
        return Ok(());
    }

    match &resolution {
        Resolution::Mapped(mapping) => {
            println!("{} {}", "Target:".green().bold(), mapping.target_type());
            println!("{} {}", "Converter:".cyan(), mapping.converter);
            if !mapping.stages.is_empty() {
                println!("{} {}", "Stages:".cyan(), mapping.stages.join(" -> "));
            }
        }
        Resolution::Excluded { reason } => {
            println!("{} {}", "Excluded:".yellow().bold(), reason);
        }
    }

    Ok(())
}

/// Convert command - run literals through the resolved converter
fn convert_command(config: &ConnectorConfig, precision: i32, scale: i32, values: &[String]) -> Result<()> {
    let mapper = ColumnMapper::new(&config.policy);
    let mapping = match mapper.map_column("column", TypeCode::NUMERIC, precision, scale)? {
        Resolution::Mapped(mapping) => mapping,
        Resolution::Excluded { reason } => {
            anyhow::bail!("Column is excluded from the target schema: {}", reason);
        }
    };

    eprintln!("{} {} via {}", "Converting to".cyan(), mapping.target_type(), mapping.converter);

    let mut failures = 0;
    for literal in values {
        let result = RawValue::number(literal).and_then(|raw| mapping.converter.convert(&raw));
        match result {
            Ok(value) => println!("{} {} {}", literal, "->".dimmed(), value),
            Err(e) => {
                failures += 1;
                println!("{} {} {}", literal, "->".dimmed(), e.to_string().red());
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} values failed to convert", failures, values.len());
    }

    Ok(())
}

/// Check command - run deferred validation and print the effective settings
fn check_command(config: &ConnectorConfig) -> Result<()> {
    config.policy.validate()?;

    for (key, value) in config.to_properties() {
        println!("{} = {}", key.cyan(), value);
    }

    eprintln!("{}", "✓ Configuration is valid".green());
    Ok(())
}

/// Map command - map a table read from a JSON metadata file
async fn map_command(config: &ConnectorConfig, metadata: &Path, table: &str, verbose: bool) -> Result<()> {
    let table = TableIdentifier::parse(table)
        .ok_or_else(|| anyhow::anyhow!("Invalid table '{}': expected database.schema.table", table))?;

    let content = std::fs::read_to_string(metadata)
        .with_context(|| format!("Failed to read metadata file {}", metadata.display()))?;
    let tables: HashMap<String, Vec<ColumnMetadata>> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse metadata file {}", metadata.display()))?;

    let mut builder = MockSourceBuilder::new();
    for (fqn, columns) in tables {
        let id = TableIdentifier::parse(&fqn)
            .ok_or_else(|| anyhow::anyhow!("Invalid table '{}' in metadata file", fqn))?;
        builder = builder.with_table(&id.database, &id.schema, &id.table, columns);
    }
    let source = builder.build();

    if verbose {
        eprintln!("{} {} from {}", "Mapping".cyan(), table, source.name());
    }

    let mapped = map_table(&source, &table, config).await?;

    for column in &mapped.columns {
        let nullable = if column.nullable { "" } else { " NOT NULL" };
        println!("{:<24} {}{}", column.name, column.target_type(), nullable);
    }
    for column in &mapped.skipped {
        println!("{:<24} {} ({})", column.name, "skipped".yellow(), column.reason);
    }

    Ok(())
}
