use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use settle_core::{AccessLevel, SessionContext, SettingsService};
use settle_data::SettingsSheetLoader;
use settle_db_sqlite::SqliteSettingsRepository;

/// Load operator settings from a CSV file into the database.
///
/// The CSV file should have the following columns:
/// - operator_id: calculator slot, 1 to 5
/// - commission_rate: commission per combined unit
/// - ap_rate: AP amount per combined unit
#[derive(Parser, Debug)]
#[command(name = "settle-data-loader")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the CSV file containing operator settings
    #[arg(short, long)]
    file: PathBuf,

    /// SQLite database path or URL; created if missing
    #[arg(short, long, default_value = "settle.db")]
    database: String,

    /// Access level of the person running the import
    #[arg(short, long, default_value = "viewer")]
    level: AccessLevel,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let repo = SqliteSettingsRepository::new(&args.database)
        .await
        .with_context(|| format!("Failed to connect to database: {}", args.database))?;
    repo.run_migrations()
        .await
        .context("Failed to run migrations")?;

    println!("Loading operator settings from: {}", args.file.display());

    let file = File::open(&args.file)
        .with_context(|| format!("Failed to open: {}", args.file.display()))?;

    let records = SettingsSheetLoader::parse(file)
        .with_context(|| format!("Failed to parse CSV: {}", args.file.display()))?;

    println!("Parsed {} records from CSV", records.len());

    let service = SettingsService::new(Box::new(repo));
    let loaded = SettingsSheetLoader::load(&service, &SessionContext::new(args.level), &records)
        .await
        .context("Failed to load operator settings into database")?;

    println!("Successfully loaded settings for {} operators.", loaded);

    Ok(())
}
