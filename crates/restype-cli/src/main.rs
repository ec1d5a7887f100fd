//! # restype-cli
//!
//! Command-line interface for validating resource-type manifests and
//! printing canonical type descriptors.

mod config;
mod manifest;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use config::CliConfig;
use manifest::{ResourceManifest, SchemaDocument};
use restype_schema::{ReferenceRegistry, TypeRegistry};
use restype_validation::{FailureReport, RegistryLoader, SchemaEngine};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "restype")]
#[command(about = "Resource-type schema validator")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate every schema in a manifest
    Validate {
        /// Manifest file path
        manifest: PathBuf,

        /// Registry catalog of built-in types
        #[arg(short, long)]
        registry: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Print the canonical descriptor of one schema as JSON
    Describe {
        /// Manifest file path
        manifest: PathBuf,

        /// Resource type name
        #[arg(short = 't', long = "type")]
        type_name: String,

        /// API version
        #[arg(short, long)]
        api_version: String,

        /// Registry catalog of built-in types
        #[arg(short, long)]
        registry: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Outcome of one schema in `validate --format json`
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SchemaOutcome<'a> {
    id: String,
    #[serde(rename = "type")]
    type_name: &'a str,
    api_version: &'a str,
    accepted: bool,
    failures: FailureReport,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "debug" } else { "warn" })
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = match &cli.config {
        Some(path) => CliConfig::load(path)?,
        None => CliConfig::default(),
    };

    match cli.command {
        Commands::Validate {
            manifest,
            registry,
            format,
        } => {
            let engine = build_engine(&config, registry.as_deref())?;
            validate(&engine, &manifest, format)
        }
        Commands::Describe {
            manifest,
            type_name,
            api_version,
            registry,
        } => {
            let engine = build_engine(&config, registry.as_deref())?;
            describe(&engine, &manifest, &type_name, &api_version)
        }
    }
}

fn build_engine(config: &CliConfig, registry: Option<&Path>) -> Result<SchemaEngine> {
    let catalog = registry.or(config.registry.as_deref());

    let registry = match catalog {
        Some(path) => {
            let mut loader = RegistryLoader::new().with_config(config.engine.clone());
            if let Some(namespaces) = &config.allowed_namespaces {
                loader = loader.with_namespaces(namespaces.iter().cloned());
            }
            loader
                .load_file(path)
                .with_context(|| format!("Failed to load registry {}", path.display()))?
        }
        None => TypeRegistry::new(config.allowed_namespaces.iter().flatten().cloned()),
    };
    debug!(
        types = registry.len(),
        namespaces = registry.allowed_namespaces().len(),
        "Registry ready"
    );

    Ok(SchemaEngine::with_config(
        Arc::new(registry),
        config.engine.clone(),
    ))
}

fn validate(engine: &SchemaEngine, path: &Path, format: OutputFormat) -> Result<ExitCode> {
    let manifest = ResourceManifest::load(path)?;
    info!("Validating manifest {}", path.display());

    let outcomes: Vec<SchemaOutcome<'_>> = manifest
        .documents()
        .map(|document| {
            let id = manifest.document_id(&document);
            let failures = engine.validate_document(&id, document.schema);
            SchemaOutcome {
                id,
                type_name: document.type_name,
                api_version: document.api_version,
                accepted: failures.is_empty(),
                failures,
            }
        })
        .collect();
    let rejected = outcomes.iter().filter(|o| !o.accepted).count();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcomes)?),
        OutputFormat::Text => {
            for outcome in &outcomes {
                if outcome.accepted {
                    println!("{}: ok", outcome.id);
                } else {
                    println!(
                        "{}: rejected ({} failure(s))\n{}",
                        outcome.id,
                        outcome.failures.len(),
                        outcome.failures
                    );
                }
            }
            println!(
                "Schemas: {}, accepted: {}, rejected: {}",
                outcomes.len(),
                outcomes.len() - rejected,
                rejected
            );
        }
    }

    Ok(if rejected == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn describe(
    engine: &SchemaEngine,
    path: &Path,
    type_name: &str,
    api_version: &str,
) -> Result<ExitCode> {
    let manifest = ResourceManifest::load(path)?;
    let document: SchemaDocument<'_> = manifest.document(type_name, api_version)?;
    let id = manifest.document_id(&document);

    match engine.compile_document(&id, document.schema) {
        Ok(descriptor) => {
            println!("{}", serde_json::to_string_pretty(descriptor.as_ref())?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => match err.report() {
            Some(report) => {
                println!("{id}: rejected ({} failure(s))\n{report}", report.len());
                Ok(ExitCode::from(1))
            }
            None => Err(anyhow::Error::new(err).context(format!("Failed to compile {id}"))),
        },
    }
}
