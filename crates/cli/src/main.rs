//! Farmstand CLI - database migrations and data imports.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! fs-cli migrate
//!
//! # Import the serviceable-city catalog from a CSV file
//! fs-cli import-cities --file us_cities.csv
//! ```
//!
//! # Environment Variables
//!
//! - `FARMSTAND_DATABASE_URL` - `PostgreSQL` connection string (falls back
//!   to `DATABASE_URL`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use secrecy::SecretString;

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "fs-cli")]
#[command(author, version, about = "Farmstand CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Import the city catalog from a CSV file
    ImportCities {
        /// Path to the CSV file (country,state,state_full,city,zip_code,latitude,longitude)
        #[arg(short, long)]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "farmstand_cli=info,farmstand_server=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let database_url = database_url()?;
    let pool = farmstand_server::db::create_pool(&database_url).await?;

    match cli.command {
        Commands::Migrate => commands::migrate::run(&pool).await,
        Commands::ImportCities { file } => commands::import_cities::run(&pool, &file).await,
    }
}

fn database_url() -> Result<SecretString, CliError> {
    std::env::var("FARMSTAND_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CliError::MissingEnvVar("FARMSTAND_DATABASE_URL"))
}
