//! SchemaGraph Core CLI - Inspect schema metadata stores
//!
//! Commands:
//! - `init` - Write a local `.schemagraph/config.toml`
//! - `schemas` - List the schemas in a store
//! - `schema` - Show one schema, optionally loading all of its classes
//! - `class` - Show one class with its properties and constraints
//! - `stats` - Show reader cache statistics

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use schemagraph_config::{ConfigLoader, ConfigOverrides, LogFormat, SchemaGraphConfig};
use schemagraph_core::{
    ClassId, EcClass, PropertyType, ReaderStats, RelationshipEnd, SchemaReader,
    SchemaReaderOptions, SqliteStore,
};

/// SchemaGraph Core - Inspect schema metadata stores
#[derive(Parser)]
#[command(name = "schemagraph-core")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Metadata database (overrides `store.path` from config)
    #[arg(long, global = true, env = "SCHEMAGRAPH_DB")]
    db: Option<PathBuf>,

    /// Skip navigation property validation
    #[arg(long, global = true)]
    no_validate_navigation: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the effective configuration to `.schemagraph/config.toml`
    Init {
        /// Overwrite an existing local config
        #[arg(long)]
        force: bool,
    },

    /// List all schemas in the store
    Schemas,

    /// Show a schema
    Schema {
        /// Schema name
        name: String,

        /// Load every class and enumeration of the schema
        #[arg(long)]
        all: bool,
    },

    /// Show a class
    Class {
        /// Schema name
        schema: String,

        /// Class name
        class: String,
    },

    /// Show reader cache statistics
    Stats {
        /// Fully load every schema first
        #[arg(long)]
        all: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let workspace_root = std::env::current_dir().context("Failed to determine current directory")?;
    let overrides = ConfigOverrides {
        store_path: cli.db.clone(),
        validate_navigation: cli.no_validate_navigation.then_some(false),
        log_level: cli.verbose.then(|| "debug".to_string()),
    };
    let loader = ConfigLoader::new();
    let config = loader
        .load(&workspace_root, Some(&overrides))
        .context("Failed to load configuration")?;

    // Setup logging
    let level = config
        .logging
        .level
        .parse::<Level>()
        .unwrap_or(Level::INFO);
    let builder = FmtSubscriber::builder().with_max_level(level);
    match config.logging.format {
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish())?,
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
    }

    let open = || open_reader(&config, &workspace_root);

    match cli.command {
        Commands::Init { force } => cmd_init(&loader, &workspace_root, &config, force),
        Commands::Schemas => cmd_schemas(&open()?, cli.json),
        Commands::Schema { name, all } => cmd_schema(&open()?, &name, all, cli.json),
        Commands::Class { schema, class } => cmd_class(&open()?, &schema, &class, cli.json),
        Commands::Stats { all } => cmd_stats(&open()?, all, cli.json),
    }
}

/// Open the configured store and wrap it in a reader
fn open_reader(
    config: &SchemaGraphConfig,
    workspace_root: &Path,
) -> Result<SchemaReader<SqliteStore>> {
    let path = config.store_path(workspace_root);
    info!("Opening metadata store {:?}", path);

    let store = if path.exists() {
        SqliteStore::open_with_mode(&path, config.store.read_only)
            .with_context(|| format!("Failed to open {:?}", path))?
    } else if config.store.read_only {
        anyhow::bail!("Metadata store not found: {:?}", path);
    } else {
        SqliteStore::create(&path).with_context(|| format!("Failed to create {:?}", path))?
    };
    store
        .set_cache_size_kb(config.store.cache_size_kb)
        .context("Failed to configure store")?;

    Ok(SchemaReader::with_options(
        store,
        SchemaReaderOptions::from(&config.reader),
    ))
}

/// Write the local config file
fn cmd_init(
    loader: &ConfigLoader,
    workspace_root: &Path,
    config: &SchemaGraphConfig,
    force: bool,
) -> Result<()> {
    let (path, written) = loader
        .init_local(workspace_root, config, force)
        .context("Failed to write local configuration")?;

    if written {
        info!("Wrote configuration to {:?}", path);
        println!("Initialized {}", path.display());
    } else {
        println!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    Ok(())
}

/// List all schemas
fn cmd_schemas(reader: &SchemaReader<SqliteStore>, json_output: bool) -> Result<()> {
    let keys = reader.schema_keys().context("Failed to list schemas")?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&keys)?);
        return Ok(());
    }

    println!("\nSchemas");
    println!("=======");
    for key in &keys {
        println!(
            "  {}.{:02}.{:02}  {}",
            key.name,
            key.version_major,
            key.version_minor,
            key.display_label.as_deref().unwrap_or("")
        );
    }
    println!("\n{} schema(s)", keys.len());
    Ok(())
}

/// Show one schema
fn cmd_schema(
    reader: &SchemaReader<SqliteStore>,
    name: &str,
    all: bool,
    json_output: bool,
) -> Result<()> {
    let start = Instant::now();

    let schema = reader
        .get_schema_by_name(name, all)
        .with_context(|| format!("Failed to load schema {}", name))?
        .with_context(|| format!("Schema not found: {}", name))?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&*schema)?);
        return Ok(());
    }

    println!("\nSchema {}", schema.full_name());
    println!("{}", "=".repeat("Schema ".len() + schema.full_name().len()));
    println!("  Label: {}", schema.display_label());
    if let Some(alias) = schema.alias() {
        println!("  Alias: {}", alias);
    }
    if let Some(description) = schema.description() {
        println!("  Description: {}", description);
    }

    if !schema.references().is_empty() {
        println!();
        println!("References:");
        for id in schema.references() {
            let referenced = reader.get_schema(*id, false)?;
            println!("  {}", referenced.full_name());
        }
    }

    if !schema.custom_attributes().is_empty() {
        println!();
        println!("Custom Attributes:");
        for attribute in schema.custom_attributes() {
            println!("  {}", attribute.class_name());
        }
    }

    let classes = reader.class_keys(schema.id())?;
    println!();
    println!("Classes ({}):", classes.len());
    for key in &classes {
        println!("  {}", key.name);
    }

    if all {
        println!();
        println!(
            "Fully loaded: {} ({:.2}s)",
            reader.is_fully_loaded(schema.id()),
            start.elapsed().as_secs_f64()
        );
    }

    Ok(())
}

/// Show one class
fn cmd_class(
    reader: &SchemaReader<SqliteStore>,
    schema_name: &str,
    class_name: &str,
    json_output: bool,
) -> Result<()> {
    let class = reader
        .get_class_by_name(schema_name, class_name)
        .with_context(|| format!("Failed to load class {}:{}", schema_name, class_name))?
        .with_context(|| format!("Class not found: {}:{}", schema_name, class_name))?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&*class)?);
        return Ok(());
    }

    print_class(reader, &class)
}

fn print_class(reader: &SchemaReader<SqliteStore>, class: &EcClass) -> Result<()> {
    let schema = reader.get_schema(class.schema_id(), false)?;

    println!("\n{}:{}", schema.name(), class.name());
    println!("  Type: {}", class.class_type().as_str());
    println!("  Modifier: {:?}", class.modifier());
    if let Some(description) = class.description() {
        println!("  Description: {}", description);
    }

    if !class.base_classes().is_empty() {
        println!();
        println!("Base Classes:");
        for id in class.base_classes() {
            println!("  {}", qualified_name(reader, *id)?);
        }
    }

    if !class.properties().is_empty() {
        println!();
        println!("Properties:");
        for property in class.properties() {
            let readonly = if property.is_readonly() { " (readonly)" } else { "" };
            println!(
                "  {}: {}{}",
                property.name(),
                describe_type(reader, property.property_type())?,
                readonly
            );
        }
    }

    if !class.custom_attributes().is_empty() {
        println!();
        println!("Custom Attributes:");
        for attribute in class.custom_attributes() {
            println!(
                "  {} {}",
                attribute.class_name(),
                serde_json::Value::Object(attribute.values().clone())
            );
        }
    }

    if let Some(relationship) = class.relationship() {
        println!();
        println!(
            "Relationship: {:?}, {:?}",
            relationship.strength, relationship.strength_direction
        );
        for end in [RelationshipEnd::Source, RelationshipEnd::Target] {
            let constraint = relationship.constraint(end);
            let polymorphic = if constraint.is_polymorphic() {
                "polymorphic"
            } else {
                "exact"
            };
            println!(
                "  {} {} {}:",
                end.as_str(),
                constraint.cardinality(),
                polymorphic
            );
            for constraint_class in constraint.classes() {
                println!("    {}", qualified_name(reader, constraint_class.class_id)?);
            }
        }
    }

    Ok(())
}

fn qualified_name(reader: &SchemaReader<SqliteStore>, id: ClassId) -> Result<String> {
    let class = reader.get_class(id)?;
    let schema = reader.get_schema(class.schema_id(), false)?;
    Ok(format!("{}:{}", schema.name(), class.name()))
}

fn describe_type(
    reader: &SchemaReader<SqliteStore>,
    property_type: &PropertyType,
) -> Result<String> {
    let description = match property_type {
        PropertyType::Primitive(primitive) => primitive.as_str().to_string(),
        PropertyType::Enumeration(id) => reader.get_enumeration(*id)?.name().to_string(),
        PropertyType::Struct(id) => qualified_name(reader, *id)?,
        PropertyType::PrimitiveArray { element, bounds } => {
            format!("{}[{}..{}]", element.as_str(), bounds.min_occurs, upper(bounds.max_occurs))
        }
        PropertyType::StructArray { element, bounds } => format!(
            "{}[{}..{}]",
            qualified_name(reader, *element)?,
            bounds.min_occurs,
            upper(bounds.max_occurs)
        ),
        PropertyType::Navigation {
            relationship,
            direction,
        } => format!(
            "navigation via {} ({:?})",
            qualified_name(reader, *relationship)?,
            direction
        ),
    };
    Ok(description)
}

fn upper(max: Option<u32>) -> String {
    max.map_or_else(|| "N".to_string(), |m| m.to_string())
}

/// Cache statistics output
#[derive(Debug, Serialize)]
struct StatsOutput {
    schemas_in_store: usize,
    #[serde(flatten)]
    reader: ReaderStats,
}

/// Show reader cache statistics
fn cmd_stats(reader: &SchemaReader<SqliteStore>, all: bool, json_output: bool) -> Result<()> {
    let start = Instant::now();
    let keys = reader.schema_keys().context("Failed to list schemas")?;

    if all {
        for key in &keys {
            reader
                .ensure_all_classes_loaded(key.id)
                .with_context(|| format!("Failed to load schema {}", key.name))?;
        }
        info!(
            "Loaded {} schema(s) in {:.2}s",
            keys.len(),
            start.elapsed().as_secs_f64()
        );
    }

    let stats = StatsOutput {
        schemas_in_store: keys.len(),
        reader: reader.stats(),
    };

    if json_output {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("\nReader Statistics");
    println!("=================");
    println!("  Schemas in store: {}", stats.schemas_in_store);
    println!("  Cached schemas: {}", stats.reader.cached_schemas);
    println!("  Fully loaded schemas: {}", stats.reader.fully_loaded_schemas);
    println!("  Cached classes: {}", stats.reader.cached_classes);
    println!("  Cached enumerations: {}", stats.reader.cached_enumerations);
    println!(
        "  Cache hits/misses: {}/{} ({:.1}%)",
        stats.reader.hits,
        stats.reader.misses,
        stats.reader.hit_rate * 100.0
    );

    Ok(())
}
