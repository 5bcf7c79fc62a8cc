mod output;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use rayon::prelude::*;
use schema_link_catalog::{LinkConfig, ModelCatalog, read_file};
use schema_link_core::{
    ComposedSchema, Document, ModelInstance, UnknownFields, ValidateOptions, validate_and_build,
};
use tracing::{Level, debug};

use crate::output::{InstanceFormat, OutputFormat, format_instance, format_schema};

#[derive(Debug, Parser)]
#[command(name = "schema-link")]
#[command(about = "Compose linked model schemas and validate flat documents against them")]
#[command(version)]
struct Cli {
    /// Log composition and validation details to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load a catalog, compose every model and print a summary.
    Check(CheckArgs),
    /// Print the composed schema of one model.
    Compose(ComposeArgs),
    /// Validate flat documents and print the built instances.
    Validate(ValidateArgs),
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Catalog file (.json, .yaml, .yml) or directory of model files.
    catalog: PathBuf,
}

#[derive(Debug, Args)]
struct ComposeArgs {
    /// Catalog file or directory of model files.
    #[arg(long)]
    catalog: PathBuf,
    /// Model to compose.
    model: String,
    /// Output format.
    #[arg(long, default_value = "table")]
    format: OutputFormat,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    /// Catalog file or directory; overrides the catalogs of --config.
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// Model the documents are validated against.
    #[arg(long)]
    model: String,
    /// Link configuration YAML.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Drop undeclared fields instead of rejecting them.
    #[arg(long)]
    drop_unknown: bool,
    /// Do not fill nested link fields from sibling model values.
    #[arg(long)]
    no_inherit: bool,
    /// Do not share equal linked instances.
    #[arg(long)]
    no_reconcile: bool,
    /// Number of parallel validation jobs (default: number of CPUs).
    #[arg(long)]
    jobs: Option<usize>,
    /// Output format for built instances.
    #[arg(long, default_value = "json")]
    format: InstanceFormat,
    /// JSON or YAML documents to validate.
    #[arg(required = true)]
    documents: Vec<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    let result = match cli.command {
        Command::Check(args) => run_check(args),
        Command::Compose(args) => run_compose(args),
        Command::Validate(args) => run_validate(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn load_catalog(path: &Path) -> Result<ModelCatalog, String> {
    let result = if path.is_dir() {
        ModelCatalog::from_dir(path)
    } else {
        ModelCatalog::from_file(path)
    };
    result.map_err(|e| format!("failed to load catalog '{}': {e}", path.display()))
}

fn run_check(args: CheckArgs) -> Result<(), String> {
    let catalog = load_catalog(&args.catalog)?;

    println!(
        "{}: {} models composed",
        args.catalog.display(),
        catalog.len()
    );
    for name in catalog.models() {
        let Some(schema) = catalog.get(name) else {
            continue;
        };
        let links: Vec<&str> = schema.links().iter().map(|l| l.name.as_str()).collect();
        if links.is_empty() {
            println!("  {name}: {} fields", schema.len());
        } else {
            println!(
                "  {name}: {} fields (links: {})",
                schema.len(),
                links.join(", ")
            );
        }
    }
    Ok(())
}

fn run_compose(args: ComposeArgs) -> Result<(), String> {
    let catalog = load_catalog(&args.catalog)?;
    let schema = catalog
        .get(&args.model)
        .ok_or_else(|| format!("unknown model '{}'", args.model))?;
    print!("{}", format_schema(schema, args.format)?);
    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<(), String> {
    let config = match &args.config {
        Some(path) => Some(
            LinkConfig::load(path)
                .map_err(|e| format!("failed to load config '{}': {e}", path.display()))?,
        ),
        None => None,
    };

    let catalog = match (&args.catalog, &config, &args.config) {
        (Some(path), _, _) => load_catalog(path)?,
        (None, Some(config), Some(config_path)) => {
            let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
            config
                .load_catalog(base_dir)
                .map_err(|e| format!("failed to load catalog from config: {e}"))?
        }
        _ => return Err("either --catalog or --config is required".to_string()),
    };

    let mut options = config
        .as_ref()
        .map(|c| c.validation)
        .unwrap_or_default();
    if args.drop_unknown {
        options.unknown_fields = UnknownFields::Drop;
    }
    if args.no_inherit {
        options.inherit_links = false;
    }
    if args.no_reconcile {
        options.reconcile = false;
    }

    let schema = catalog
        .get(&args.model)
        .ok_or_else(|| format!("unknown model '{}'", args.model))?;
    debug!(model = %args.model, documents = args.documents.len(), ?options, "validating documents");

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.jobs.unwrap_or(0))
        .build()
        .map_err(|e| format!("Failed to create thread pool: {e}"))?;

    let outcomes: Vec<(&PathBuf, Result<ModelInstance, String>)> = pool.install(|| {
        args.documents
            .par_iter()
            .map(|path| (path, validate_document(path, schema, &options)))
            .collect()
    });

    let mut failed = 0usize;
    for (path, outcome) in &outcomes {
        match outcome {
            Ok(instance) => {
                if outcomes.len() > 1 {
                    println!("# {}", path.display());
                }
                print!("{}", format_instance(instance, args.format)?);
            }
            Err(err) => {
                failed += 1;
                eprintln!("{}: {err}", path.display());
            }
        }
    }

    eprintln!(
        "Validated {}/{} documents against {}",
        outcomes.len() - failed,
        outcomes.len(),
        args.model
    );
    if failed > 0 {
        return Err(format!("{failed} document(s) failed validation"));
    }
    Ok(())
}

fn validate_document(
    path: &Path,
    schema: &ComposedSchema,
    options: &ValidateOptions,
) -> Result<ModelInstance, String> {
    let document: Document = read_file(path).map_err(|e| format!("failed to read document: {e}"))?;
    validate_and_build(schema, &document, options).map_err(|failure| failure.to_string())
}
