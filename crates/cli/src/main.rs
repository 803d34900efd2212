//! sdkgen CLI
//!
//! Command-line interface for generating Rust client crates from AWS service
//! definitions.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use sdkgen_common::{naming, Manifest, Matcher, ServiceDefinition};
use sdkgen_generator::{
    DryRunWriter, GenerationOptions, ServiceGenerator, WorkspaceGenerator,
};
use sdkgen_parser::ServiceParser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sdkgen")]
#[command(version, about = "Generate Rust client crates from AWS service definitions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a service definition and display a summary
    #[command(after_help = "EXAMPLES:\n  \
        # Summarize a service\n  \
        sdkgen parse --definition dynamodb/api-2.json\n\n  \
        # Include paginators and waiters\n  \
        sdkgen parse --definition dynamodb/api-2.json \\\n    \
        --paginators dynamodb/paginators-1.json \\\n    \
        --waiters dynamodb/waiters-2.json --verbose")]
    Parse {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Generate a client crate for one service
    #[command(after_help = "EXAMPLES:\n  \
        # Generate a DynamoDB client\n  \
        sdkgen generate \\\n    \
        --definition dynamodb/api-2.json \\\n    \
        --paginators dynamodb/paginators-1.json \\\n    \
        --waiters dynamodb/waiters-2.json \\\n    \
        --output ./aws-lite-dynamo-db\n\n  \
        # Only a few operations, without writing anything\n  \
        sdkgen generate --definition dynamodb/api-2.json \\\n    \
        --operations GetItem,PutItem --output ./out --dry-run")]
    Generate {
        #[command(flatten)]
        source: SourceArgs,

        /// Operations to generate (comma-separated, defaults to all)
        #[arg(long, value_delimiter = ',')]
        operations: Vec<String>,

        /// Package name of the generated crate
        #[arg(long)]
        crate_name: Option<String>,

        /// Version written into the generated Cargo.toml
        #[arg(long, default_value = "0.1.0")]
        crate_version: String,

        /// Output directory of the generated crate
        #[arg(short, long)]
        output: PathBuf,

        /// List the files that would be generated without writing them
        #[arg(long)]
        dry_run: bool,
    },

    /// Generate a workspace of client crates from a manifest
    #[command(after_help = "EXAMPLES:\n  \
        # Generate every service listed in the manifest\n  \
        sdkgen generate-all --manifest services.yaml --output ./clients\n\n  \
        # Only services whose name contains 'dynamo' or 'sqs'\n  \
        sdkgen generate-all --manifest services.yaml --filter dynamo,sqs")]
    GenerateAll {
        /// Path to the YAML manifest
        #[arg(short, long)]
        manifest: PathBuf,

        /// Only generate services whose name contains one of these (comma-separated)
        #[arg(long, value_delimiter = ',')]
        filter: Option<Vec<String>>,

        /// Output directory (overrides the manifest's `output`)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// List the files that would be generated without writing them
        #[arg(long)]
        dry_run: bool,
    },
}

/// Files describing one service
#[derive(clap::Args)]
struct SourceArgs {
    /// Path to api-2.json
    #[arg(short, long)]
    definition: PathBuf,

    /// Path to paginators-1.json
    #[arg(long)]
    paginators: Option<PathBuf>,

    /// Path to waiters-2.json
    #[arg(long)]
    waiters: Option<PathBuf>,

    /// Service name (defaults to the snake_case service id)
    #[arg(long)]
    service: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Parse { source } => parse_command(&source, cli.verbose),
        Commands::Generate {
            source,
            operations,
            crate_name,
            crate_version,
            output,
            dry_run,
        } => {
            let options = GenerationOptions {
                crate_name,
                crate_version,
                operations,
                ..GenerationOptions::default()
            };
            generate_command(&source, options, &output, dry_run)
        }
        Commands::GenerateAll {
            manifest,
            filter,
            output,
            dry_run,
        } => generate_all_command(&manifest, filter.as_deref(), output.as_deref(), dry_run),
    }
}

/// Install the log subscriber; `RUST_LOG` wins over `--verbose`
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_service(source: &SourceArgs) -> Result<ServiceDefinition> {
    println!(
        "{} Parsing service definition: {}",
        "→".cyan(),
        source.definition.display()
    );

    let mut parser = ServiceParser::from_file(&source.definition).with_context(|| {
        format!(
            "Failed to load service definition: {}",
            source.definition.display()
        )
    })?;

    if let Some(name) = &source.service {
        parser = parser.with_service_name(name);
    }
    if let Some(path) = &source.paginators {
        parser = parser
            .with_paginators_file(path)
            .with_context(|| format!("Failed to load paginators: {}", path.display()))?;
    }
    if let Some(path) = &source.waiters {
        parser = parser
            .with_waiters_file(path)
            .with_context(|| format!("Failed to load waiters: {}", path.display()))?;
    }

    parser.parse().context("Failed to parse service definition")
}

fn parse_command(source: &SourceArgs, verbose: bool) -> Result<()> {
    let service = load_service(source)?;

    println!("\n{}", "✓ Parse successful!".green().bold());
    println!("\n{}", "Service Information:".bold());
    println!("  Name: {}", service.name.yellow());
    println!("  Full name: {}", service.metadata.service_full_name);
    println!("  API version: {}", service.metadata.api_version);
    println!("  Protocol: {}", service.metadata.protocol.name());
    println!("  Endpoint prefix: {}", service.metadata.endpoint_prefix);
    println!("  Operations: {}", service.operations.len());
    println!("  Shapes: {}", service.shapes.len());
    println!("  Paginators: {}", service.paginators.len());
    println!("  Waiters: {}", service.waiters.len());

    if verbose {
        println!("\n{}", "Operations:".bold());
        for operation in service.operations.values() {
            let marker = if operation.deprecated {
                " (deprecated)".dimmed().to_string()
            } else {
                String::new()
            };
            println!(
                "  {} {} {} {}{}",
                "•".cyan(),
                operation.name.yellow(),
                operation.http.method,
                operation.http.request_uri,
                marker
            );
        }

        if !service.paginators.is_empty() {
            println!("\n{}", "Paginators:".bold());
            for paginator in service.paginators.values() {
                let tokens: Vec<String> = paginator
                    .output_tokens
                    .iter()
                    .map(ToString::to_string)
                    .collect();
                println!(
                    "  {} {} ({} ← {})",
                    "•".cyan(),
                    paginator.operation.yellow(),
                    paginator.input_tokens.join(", "),
                    tokens.join(", ")
                );
            }
        }

        if !service.waiters.is_empty() {
            println!("\n{}", "Waiters:".bold());
            for waiter in service.waiters.values() {
                println!(
                    "  {} {} on {} (every {}s, {} attempts)",
                    "•".cyan(),
                    waiter.name.yellow(),
                    waiter.operation,
                    waiter.delay,
                    waiter.max_attempts
                );
                for acceptor in &waiter.acceptors {
                    if let Matcher::Unsupported { matcher, reason } = &acceptor.matcher {
                        println!(
                            "    {} unsupported {} acceptor: {}",
                            "⚠".yellow(),
                            matcher,
                            reason
                        );
                    }
                }
            }
        }
    }

    Ok(())
}

fn generate_command(
    source: &SourceArgs,
    options: GenerationOptions,
    output: &Path,
    dry_run: bool,
) -> Result<()> {
    let service = load_service(source)?;

    println!(
        "{} Parsed {} operations and {} shapes from {}",
        "✓".green(),
        service.operations.len(),
        service.shapes.len(),
        service.name.yellow()
    );

    let generator =
        ServiceGenerator::new(service, options).context("Failed to create generator")?;

    println!(
        "{} Generating crate {}...",
        "→".cyan(),
        generator.crate_name().yellow()
    );

    let files = if dry_run {
        let writer = DryRunWriter::new();
        let files = generator
            .generate_with_writer(output, &writer)
            .context("Failed to generate crate")?;
        print_dry_run(&writer);
        files
    } else {
        generator
            .generate_to_directory(output)
            .context("Failed to generate crate")?
    };

    println!("\n{}", "✓ Generation complete!".green().bold());
    println!("  {} files in {}", files.len(), output.display());

    if !dry_run {
        println!("\n{}", "Next steps:".bold());
        println!("  1. Review generated files in {}", output.display());
        println!("  2. Build the crate: cd {} && cargo build", output.display());
    }

    Ok(())
}

fn generate_all_command(
    manifest_path: &Path,
    filter: Option<&[String]>,
    output: Option<&Path>,
    dry_run: bool,
) -> Result<()> {
    println!(
        "{} Loading manifest: {}",
        "→".cyan(),
        manifest_path.display()
    );

    let manifest = Manifest::load(manifest_path)
        .with_context(|| format!("Failed to load manifest: {}", manifest_path.display()))?;

    let output = match (output, &manifest.output) {
        (Some(dir), _) => dir.to_path_buf(),
        (None, Some(dir)) => manifest.resolve(dir),
        (None, None) => {
            anyhow::bail!("No output directory: pass --output or set `output` in the manifest")
        }
    };

    let selected: Vec<_> = manifest.filtered_services(filter).collect();
    if selected.is_empty() {
        anyhow::bail!("No service in the manifest matches the filter");
    }

    println!(
        "{} Generating {} of {} services",
        "→".cyan(),
        selected.len(),
        manifest.services.len()
    );

    let total = selected.len();
    let services = selected
        .into_iter()
        .enumerate()
        .map(|(i, (name, entry))| {
            let source = manifest.resolve(&entry.source);
            println!(
                "{} Parsing service {}/{}: {}",
                "→".cyan(),
                i + 1,
                total,
                name.yellow()
            );

            let mut parser = ServiceParser::from_file(&source)
                .with_context(|| format!("Failed to load {}", source.display()))?
                .with_service_name(&naming::to_snake_case(name));
            if let Some(path) = &entry.pagination {
                let path = manifest.resolve(path);
                parser = parser
                    .with_paginators_file(&path)
                    .with_context(|| format!("Failed to load paginators: {}", path.display()))?;
            }
            if let Some(path) = &entry.waiter {
                let path = manifest.resolve(path);
                parser = parser
                    .with_waiters_file(&path)
                    .with_context(|| format!("Failed to load waiters: {}", path.display()))?;
            }

            let service = parser
                .parse()
                .with_context(|| format!("Failed to parse service {}", name))?;

            let options = GenerationOptions {
                crate_name: Some(manifest.crate_name(name)),
                crate_version: manifest.crate_version.clone(),
                operations: entry.methods.clone(),
                ..GenerationOptions::default()
            };

            Ok::<_, anyhow::Error>((service, options))
        })
        .collect::<Result<Vec<_>>>()?;

    let generator = WorkspaceGenerator::new(services).context("Failed to create generator")?;

    println!(
        "\n{} {}",
        "→".cyan(),
        "Generating workspace files...".bold()
    );

    let files = if dry_run {
        let writer = DryRunWriter::new();
        let files = generator
            .generate_with_writer(&output, &writer)
            .context("Failed to generate workspace")?;
        print_dry_run(&writer);
        files
    } else {
        generator
            .generate_to_directory(&output)
            .context("Failed to generate workspace")?
    };

    println!("\n{}", "✓ Generation complete!".green().bold());
    println!("  {} files in {}", files.len(), output.display());

    Ok(())
}

fn print_dry_run(writer: &DryRunWriter) {
    println!("\n{}", "Dry run, nothing was written:".bold());
    for file in writer.files() {
        println!("  📄 {}", file.display());
    }
    println!("  {} bytes total", writer.total_bytes());
}
