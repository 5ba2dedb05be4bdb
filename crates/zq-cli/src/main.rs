//! # zq-cli
//!
//! Command-line driver for the Zephyr to qTest mapping engine.
//!
//! Reads Zephyr records exported as JSON, runs them through the mapping
//! registry or the entity transformers, and writes JSON. Logs go to stderr
//! so stdout stays machine-readable.

mod config;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use zq_mapping::{MappingRegistry, RuleDsl, new_default_registry};
use zq_model::{EntityKind, Record};
use zq_transform::{InMemoryLookup, MappingLookup, NoLookup, TransformContext, Transformers};

use crate::config::CliConfig;

#[derive(Parser)]
#[command(name = "zq")]
#[command(about = "Zephyr to qTest entity mapping")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log engine decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Transform test cases, test cycles or test executions
    Transform {
        /// Entity kind of the input records
        #[arg(short, long)]
        kind: EntityKind,

        /// JSON file holding one record or a list of records
        input: PathBuf,

        /// Output file path; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Treat missing data as errors
        #[arg(long)]
        strict: bool,

        /// Leave attachments out
        #[arg(long)]
        no_attachments: bool,

        /// Project key for cross-reference lookups
        #[arg(long)]
        project_key: Option<String>,

        /// JSON id mapping table
        #[arg(long)]
        mappings: Option<PathBuf>,

        /// Rule override file
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Exit with an error status when any record fails
        #[arg(long)]
        fail_on_error: bool,
    },

    /// Map records of any kind with the registry rules alone
    Map {
        /// Entity kind of the input records
        #[arg(short, long)]
        kind: EntityKind,

        /// JSON file holding one record or a list of records
        input: PathBuf,

        /// Output file path; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Rule override file
        #[arg(long)]
        rules: Option<PathBuf>,
    },

    /// Print the effective rules as YAML
    Rules {
        /// Rule override file
        #[arg(long)]
        rules: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => CliConfig::load(path)?,
        None => CliConfig::default(),
    };

    match cli.command {
        Commands::Transform {
            kind,
            input,
            output,
            strict,
            no_attachments,
            project_key,
            mappings,
            rules,
            fail_on_error,
        } => {
            let mut settings = config.transformer.clone();
            settings.strict_mode |= strict;
            settings.include_attachments &= !no_attachments;
            if project_key.is_some() {
                settings.project_key = project_key;
            }

            let registry = build_registry(rules.as_deref().or(config.rules.as_deref()))?;
            let lookup = build_lookup(mappings.as_deref().or(config.mappings.as_deref()))?;
            let transformers =
                Transformers::new(TransformContext::new(Arc::new(registry), lookup, settings));

            let (records, single) = read_records(&input)?;
            info!(%kind, count = records.len(), input = %input.display(), "transforming");
            let results = transformers.transform_batch(kind, &records);
            let failed = results.iter().filter(|r| !r.success).count();

            if single {
                write_json(output.as_deref(), &results[0])?;
            } else {
                write_json(output.as_deref(), &results)?;
            }
            if fail_on_error && failed > 0 {
                bail!("{failed} of {} records failed to transform", results.len());
            }
        }
        Commands::Map {
            kind,
            input,
            output,
            rules,
        } => {
            let registry = build_registry(rules.as_deref().or(config.rules.as_deref()))?;
            let (records, single) = read_records(&input)?;
            let mut mapped = Vec::with_capacity(records.len());
            for (index, record) in records.iter().enumerate() {
                let target = registry
                    .map(kind, record)
                    .with_context(|| format!("mapping record {index} as {kind}"))?;
                mapped.push(target);
            }

            if single {
                write_json(output.as_deref(), &mapped[0])?;
            } else {
                write_json(output.as_deref(), &mapped)?;
            }
        }
        Commands::Rules { rules } => {
            let registry = build_registry(rules.as_deref().or(config.rules.as_deref()))?;
            print!("{}", RuleDsl::to_yaml(&registry.to_rule_set())?);
        }
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "error" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_registry(rules: Option<&Path>) -> anyhow::Result<MappingRegistry> {
    let mut registry = new_default_registry();
    if let Some(path) = rules {
        registry
            .load_overrides(path)
            .with_context(|| format!("loading rule overrides from {}", path.display()))?;
    }
    Ok(registry)
}

fn build_lookup(mappings: Option<&Path>) -> anyhow::Result<Arc<dyn MappingLookup>> {
    let lookup: Arc<dyn MappingLookup> = match mappings {
        Some(path) => Arc::new(InMemoryLookup::load_from_file(path)?),
        None => Arc::new(NoLookup),
    };
    Ok(lookup)
}

/// Read one record or a list of records; the flag tells which it was
fn read_records(path: &Path) -> anyhow::Result<(Vec<Record>, bool)> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading input {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("parsing input {}", path.display()))?;

    match value {
        Value::Object(record) => Ok((vec![record], true)),
        Value::Array(items) => {
            let mut records = Vec::with_capacity(items.len());
            for (index, item) in items.into_iter().enumerate() {
                match item {
                    Value::Object(record) => records.push(record),
                    other => bail!(
                        "record {index} in {} is not an object: {other}",
                        path.display()
                    ),
                }
            }
            Ok((records, false))
        }
        other => bail!(
            "{} must hold a JSON object or a list of objects, found {other}",
            path.display()
        ),
    }
}

fn write_json<T: Serialize + ?Sized>(output: Option<&Path>, value: &T) -> anyhow::Result<()> {
    let mut rendered = serde_json::to_string_pretty(value)?;
    rendered.push('\n');
    match output {
        Some(path) => std::fs::write(path, rendered)
            .with_context(|| format!("writing output {}", path.display()))?,
        None => print!("{rendered}"),
    }
    Ok(())
}
