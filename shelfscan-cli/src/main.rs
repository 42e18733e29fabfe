//! Shelfscan CLI - Command-line front end for the book catalog

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shelfscan_core::CatalogConfig;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "shelfscan")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Catalog directory (overrides config and environment)
    #[arg(long, global = true, value_name = "DIR")]
    store: Option<PathBuf>,

    /// Configuration file (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every book in the catalog
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one catalog entry
    Show {
        /// ISBN of the entry
        isbn: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a new entry
    Add {
        /// ISBN of the book
        #[arg(long)]
        isbn: Option<String>,

        #[command(flatten)]
        fields: commands::FieldArgs,

        /// Fill the entry from the online lookup before applying edits
        #[arg(long)]
        lookup: bool,
    },

    /// Edit an existing entry
    Edit {
        /// ISBN of the entry
        isbn: String,

        #[command(flatten)]
        fields: commands::FieldArgs,
    },

    /// Delete an entry
    Delete {
        /// ISBN of the entry
        isbn: String,
    },

    /// Read barcodes from stdin and catalog the first one
    Scan {
        /// Show the resolved entry without saving it
        #[arg(long)]
        dry_run: bool,
    },

    /// Look up an ISBN without touching the catalog
    Lookup {
        /// ISBN to resolve
        isbn: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write the stored cover image of an entry to a file
    ExportCover {
        /// ISBN of the entry
        isbn: String,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        "shelfscan_cli=debug,shelfscan_core=debug"
    } else {
        "shelfscan_cli=info"
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config =
        CatalogConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(store) = cli.store {
        config.storage_path = store;
    }
    tracing::debug!(store = %config.storage_path.display(), "using catalog");

    match cli.command {
        Commands::List { json } => commands::list(&config, json).await,

        Commands::Show { isbn, json } => commands::show(&config, &isbn, json).await,

        Commands::Add {
            isbn,
            fields,
            lookup,
        } => commands::add(&config, isbn, &fields, lookup).await,

        Commands::Edit { isbn, fields } => commands::edit(&config, &isbn, &fields).await,

        Commands::Delete { isbn } => commands::delete(&config, &isbn).await,

        Commands::Scan { dry_run } => commands::scan(&config, dry_run).await,

        Commands::Lookup { isbn, json } => commands::lookup(&config, &isbn, json).await,

        Commands::ExportCover { isbn, output } => {
            commands::export_cover(&config, &isbn, &output).await
        }
    }
}
