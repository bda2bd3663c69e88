//! Aviário CLI - browse the catalog and replay shopping sessions.
//!
//! # Usage
//!
//! ```bash
//! # List the catalog, cheapest first
//! aviario catalog --sort price-low
//!
//! # Search within a category
//! aviario catalog --search belga --category canários
//!
//! # Category counts
//! aviario categories
//!
//! # Replay a scripted session and print the final cart as JSON
//! aviario session demos/session.yaml --json
//! ```
//!
//! # Commands
//!
//! - `catalog` - Run a catalog query
//! - `categories` - List categories with product counts
//! - `session` - Apply a YAML script of cart, favorites and checkout actions
//!
//! Settings come from `AVIARIO_*` environment variables (see
//! [`StorefrontConfig`]); log output goes to stderr and is filtered with
//! `RUST_LOG`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use aviario_storefront::StorefrontConfig;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "aviario")]
#[command(author, version, about = "Aviário storefront tools")]
struct Cli {
    /// Product file to use instead of the built-in catalog
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search, filter and sort the catalog
    Catalog {
        /// Free-text search over name, species, description and traits
        #[arg(short, long, default_value = "")]
        search: String,

        /// Category id, or `all`
        #[arg(short, long, default_value = "all")]
        category: String,

        /// `featured`, `price-low`, `price-high` or `name`
        #[arg(long, default_value = "featured")]
        sort: String,

        /// Print products as JSON
        #[arg(long)]
        json: bool,
    },
    /// List categories with their product counts
    Categories,
    /// Replay a YAML session script
    Session {
        /// Path to the script
        script: PathBuf,

        /// Print the final session state as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(json: bool) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "aviario=info,warn".into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = StorefrontConfig::from_env()?;
    if cli.catalog.is_some() {
        config.catalog_path = cli.catalog;
    }

    match cli.command {
        Commands::Catalog {
            search,
            category,
            sort,
            json,
        } => commands::catalog::list(&config, search, category, sort, json)?,
        Commands::Categories => commands::catalog::categories(&config)?,
        Commands::Session { script, json } => {
            commands::session::replay(config, &script, json).await?;
        }
    }
    Ok(())
}
