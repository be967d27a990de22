//! Lexicache CLI
//!
//! Command-line access to a lexicache offline cache.
//!
//! # Commands
//!
//! - `status` - Show cache status and metadata
//! - `download` - Download the dataset into the cache
//! - `check` - Ask the origin for a newer dataset
//! - `refresh` - Download only if the origin has a newer dataset
//! - `clear` - Drop the cached dataset
//! - `entry`, `entries`, `categories`, `conversations` - Read cached records
//! - `inspect` - Show journal statistics

mod commands;

use clap::{Parser, Subcommand};
use commands::{Context, OutputFormat};
use lexicache_store::{Locale, StoreConfig, DEFAULT_BATCH_SIZE};
use lexicache_sync::{SyncConfig, DEFAULT_VERSION_HEADER};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Offline cache for the lexicache reference dataset.
#[derive(Parser, Debug)]
#[command(name = "lexicache")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Dataset endpoint URL
    #[arg(global = true, short, long, env = "LEXICACHE_ENDPOINT")]
    endpoint: Option<String>,

    /// Path to the cache directory
    #[arg(global = true, short, long, default_value = "lexicache-data")]
    path: PathBuf,

    /// Response header carrying the dataset version
    #[arg(global = true, long, default_value = DEFAULT_VERSION_HEADER)]
    version_header: String,

    /// Entries written per store transaction during a download
    #[arg(global = true, long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    /// Output format
    #[arg(global = true, short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show cache status and metadata
    Status,

    /// Download the dataset into the cache
    Download,

    /// Ask the origin whether a newer dataset exists
    Check,

    /// Download only if the origin has a newer dataset
    Refresh,

    /// Drop the cached dataset
    Clear,

    /// Show one entry
    Entry {
        /// Entry id
        id: String,

        /// Display language (ko, en)
        #[arg(short, long, default_value_t = Locale::En)]
        locale: Locale,
    },

    /// List entries of a category
    Entries {
        /// Category id
        category: String,

        /// Display language (ko, en)
        #[arg(short, long, default_value_t = Locale::En)]
        locale: Locale,
    },

    /// List categories
    Categories {
        /// Display language (ko, en)
        #[arg(short, long, default_value_t = Locale::En)]
        locale: Locale,
    },

    /// List conversations of a category
    Conversations {
        /// Category id
        category: String,

        /// Display language (ko, en)
        #[arg(short, long, default_value_t = Locale::En)]
        locale: Locale,
    },

    /// Show journal statistics
    Inspect,

    /// Show version information
    Version,
}

impl Cli {
    fn context(&self) -> Context {
        let config = SyncConfig::new(self.endpoint.clone().unwrap_or_default())
            .with_version_header(self.version_header.clone())
            .with_store(StoreConfig::at_path(self.path.clone()).batch_size(self.batch_size));
        Context::new(config, self.endpoint.is_some(), self.format)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let ctx = cli.context();
    match cli.command {
        Commands::Status => commands::cache::status(&ctx).await?,
        Commands::Download => commands::cache::download(&ctx).await?,
        Commands::Check => commands::cache::check(&ctx).await?,
        Commands::Refresh => commands::cache::refresh(&ctx).await?,
        Commands::Clear => commands::cache::clear(&ctx).await?,
        Commands::Entry { id, locale } => commands::read::entry(&ctx, &id, locale).await?,
        Commands::Entries { category, locale } => {
            commands::read::entries(&ctx, &category, locale).await?
        }
        Commands::Categories { locale } => commands::read::categories(&ctx, locale).await?,
        Commands::Conversations { category, locale } => {
            commands::read::conversations(&ctx, &category, locale).await?
        }
        Commands::Inspect => commands::inspect::run(&cli.path, cli.format).await?,
        Commands::Version => {
            println!("lexicache CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("lexicache store v{}", lexicache_store::VERSION);
            println!("Journal format v{}", lexicache_store::FRAME_VERSION);
        }
    }

    Ok(())
}
