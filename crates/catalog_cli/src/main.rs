//! `catalog` admin binary.
//!
//! # Responsibility
//! - Parse admin commands and route them to `catalog_core` services.
//! - Print results as pretty JSON on stdout.

mod commands;

use anyhow::Context;
use catalog_core::{init_logging, open_db, CatalogConfig};
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "catalog")]
#[command(about = "Catalog admin backend for attributes, companies and product types")]
#[command(version)]
struct Cli {
    #[arg(long, global = true, help = "TOML config file")]
    config: Option<PathBuf>,

    #[arg(long, global = true, help = "SQLite database path; overrides the config")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Product attribute definitions")]
    Attribute {
        #[command(subcommand)]
        cmd: commands::attribute::AttributeCommands,
    },

    #[command(about = "Companies owning products")]
    Company {
        #[command(subcommand)]
        cmd: commands::company::CompanyCommands,
    },

    #[command(about = "Product types and their attribute sets")]
    ProductType {
        #[command(subcommand)]
        cmd: commands::product_type::ProductTypeCommands,
    },

    #[command(about = "Products referencing companies and product types")]
    Product {
        #[command(subcommand)]
        cmd: commands::product::ProductCommands,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Self::Attribute { .. } => "attribute",
            Self::Company { .. } => "company",
            Self::ProductType { .. } => "product-type",
            Self::Product { .. } => "product",
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => CatalogConfig::from_file(path)
            .with_context(|| format!("loading config `{}`", path.display()))?,
        None => CatalogConfig::default(),
    };
    if let Some(dir) = &config.logging.dir {
        init_logging(config.log_level(), dir).context("initializing logging")?;
    }

    let db_path = cli.db.clone().unwrap_or_else(|| config.db_path());
    let conn = open_db(&db_path)
        .with_context(|| format!("opening database `{}`", db_path.display()))?;
    info!(
        "event=cli_command module=cli status=start command={}",
        cli.command.name()
    );

    match cli.command {
        Commands::Attribute { cmd } => commands::attribute::handle(cmd, &conn),
        Commands::Company { cmd } => commands::company::handle(cmd, &conn),
        Commands::ProductType { cmd } => commands::product_type::handle(cmd, &conn),
        Commands::Product { cmd } => commands::product::handle(cmd, &conn),
    }
}
