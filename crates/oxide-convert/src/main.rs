//! oxide-convert CLI
//!
//! Command-line driver for converting a JSON source schema.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use oxide_convert::prelude::*;

/// Schema-to-DDL conversion kernel for database migrations.
#[derive(Parser)]
#[command(name = "oxide-convert")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a source schema and print the target schema as JSON.
    Convert {
        /// Source schema (JSON).
        #[arg(short, long)]
        input: PathBuf,

        /// Conversion options (JSON).
        #[arg(short, long)]
        options: Option<PathBuf>,

        /// Expression verifier command line.
        #[arg(long, env = "OXIDE_CONVERT_VERIFIER")]
        verifier: Option<String>,

        /// Pretty-print the output.
        #[arg(long)]
        pretty: bool,
    },

    /// Show how names would be sanitized and quoted.
    Sanitize {
        /// Names to sanitize.
        #[arg(required = true)]
        names: Vec<String>,

        /// Maximum identifier length.
        #[arg(long, default_value_t = oxide_convert::names::DEFAULT_MAX_IDENTIFIER_LENGTH)]
        max_length: usize,
    },
}

/// What `convert` prints.
#[derive(Serialize)]
struct Report {
    #[serde(flatten)]
    converted: ConvertedSchema,
    summary: ConversionSummary,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Convert {
            input,
            options,
            verifier,
            pretty,
        } => {
            let options = match options {
                Some(path) => ConvertOptions::from_json_file(&path)?,
                None => ConvertOptions::default(),
            };
            let source = SourceSchema::from_json_str(&tokio::fs::read_to_string(&input).await?)?;
            info!(
                input = %input.display(),
                tables = source.tables.len(),
                sequences = source.sequences.len(),
                "Loaded source schema"
            );

            let mut converter = SchemaConverter::new(options)?;
            match verifier.as_deref().and_then(CommandAccessor::from_command_line) {
                Some(accessor) => {
                    info!(verifier = %accessor.program(), "Using expression verifier");
                    converter = converter.with_accessor(Arc::new(accessor));
                }
                None => info!("No verifier configured, check expressions are not verified"),
            }

            let mut ctx = converter.context(source);
            let summary = converter.run(&mut ctx).await?;
            if summary.needs_attention {
                warn!(
                    dropped = summary.dropped_check_constraints,
                    "Some check constraints were dropped, see diagnostics"
                );
            }

            let report = Report {
                converted: ctx.into_converted(),
                summary,
            };
            let json = if pretty {
                serde_json::to_string_pretty(&report)?
            } else {
                serde_json::to_string(&report)?
            };
            println!("{}", json);
        }

        Commands::Sanitize { names, max_length } => {
            let mut registry = NameRegistry::new(max_length);
            for name in &names {
                let sanitized = registry.register(&sanitize_name(name, max_length));
                println!("{:<32} {:<32} {}", name, sanitized, quote_if_needed(name));
            }
        }
    }

    Ok(())
}
