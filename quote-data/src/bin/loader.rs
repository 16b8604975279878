use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use quote_core::db::LocalState;
use quote_core::{ConfigStore, RemoteStore, RemoteSync};
use quote_data::RateTableLoader;
use quote_db_sqlite::SqliteRepository;

/// Bulk-update the labour, vehicle and expense rate tables from a CSV file.
///
/// The CSV file should have the following columns:
/// - category: labour, vehicle or expense
/// - id: the rate id (e.g., l1, v3, e4)
/// - label: display label (empty keeps the current label)
/// - rate: day rate, hire rate or unit cost
/// - per_day: expenses only; true to charge per day on site
#[derive(Parser, Debug)]
#[command(name = "quote-rates-loader")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the CSV file containing rate rows
    #[arg(short, long)]
    file: PathBuf,

    /// Local SQLite database URL
    #[arg(short, long, default_value = "sqlite:quotes.db")]
    database: String,

    /// Shared SQLite database URL to publish the updated config to
    #[arg(short, long)]
    shared: Option<String>,

    /// Run database migrations before loading data
    #[arg(short, long, default_value_t = false)]
    migrate: bool,
}

async fn open(url: &str, migrate: bool) -> Result<SqliteRepository> {
    let repo = SqliteRepository::new(url)
        .await
        .with_context(|| format!("Failed to connect to database: {url}"))?;
    if migrate {
        println!("Running migrations on {url}...");
        repo.run_migrations()
            .await
            .context("Failed to run migrations")?;
    }
    Ok(repo)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let local = open(&args.database, args.migrate).await?;
    let remote: Option<Arc<dyn RemoteStore>> = match &args.shared {
        Some(url) => Some(Arc::new(open(url, args.migrate).await?)),
        None => None,
    };
    let store = ConfigStore::new(LocalState::new(Arc::new(local)), remote);

    println!("Loading rates from: {}", args.file.display());

    let file = File::open(&args.file)
        .with_context(|| format!("Failed to open: {}", args.file.display()))?;

    let records = RateTableLoader::parse(file)
        .with_context(|| format!("Failed to parse CSV: {}", args.file.display()))?;

    println!("Parsed {} records from CSV", records.len());

    let (summary, sync) = RateTableLoader::load(&store, &records)
        .await
        .context("Failed to apply rate table")?;

    println!(
        "Updated {} rates and added {} new rates.",
        summary.updated, summary.added
    );
    match sync {
        RemoteSync::Synced => println!("Shared config updated."),
        RemoteSync::LocalOnly(reason) => println!("Saved locally only: {reason}"),
        RemoteSync::Disabled => {}
    }

    Ok(())
}
