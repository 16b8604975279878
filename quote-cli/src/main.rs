use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use quote_cli::app::App;
use quote_cli::settings::{Overrides, Settings};
use quote_cli::shell::Shell;
use quote_cli::{logging, report};
use quote_core::calculations::PricingEngine;
use quote_core::config::parse_config;
use quote_core::export::{QuoteDocument, export_json, export_pdf};
use quote_core::models::FormSnapshot;
use quote_pdf::PdfRenderer;
use tracing::{debug, warn};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Site-works quote estimator.
///
/// Opens the local database and, when configured, the shared store, then
/// runs the interactive shell or a one-shot command.
#[derive(Debug, Parser)]
#[command(name = "quote-estimator", version)]
struct Cli {
    /// TOML settings file.
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Local SQLite database (file path, `sqlite:` URL or `:memory:`).
    #[arg(long, global = true)]
    db: Option<String>,

    /// Shared store backend (`postgrest` or `sqlite`).
    #[arg(long, global = true)]
    remote_backend: Option<String>,

    /// Shared store location. Omit to work locally only.
    #[arg(long, global = true)]
    remote_url: Option<String>,

    /// Shared store API key. Also read from QUOTE_REMOTE_KEY.
    #[arg(long, global = true)]
    remote_key: Option<String>,

    /// Append log output to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `info,quote_core=trace`.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive editing shell (the default).
    Shell,
    /// Price an exported JSON quote and print the totals.
    Calc {
        /// Path to a JSON quote.
        file: PathBuf,
    },
    /// List saved quotes.
    List,
    /// Export a saved quote.
    Export {
        /// Quote id.
        id: String,
        /// Write JSON instead of PDF.
        #[arg(long)]
        json: bool,
        /// Output directory.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Rate configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Subcommand)]
enum ConfigCommand {
    /// Print the active rate tables.
    Show,
    /// Print the active configuration as JSON.
    Dump,
    /// Replace the configuration from a JSON file (legacy layouts accepted)
    /// and save it.
    Import { file: PathBuf },
    /// Save the active configuration locally and to the shared store.
    Push,
}

fn settings_from(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::load(cli.settings.as_deref())?;
    settings.apply_env(|name| std::env::var(name).ok());
    settings.apply_overrides(Overrides {
        db: cli.db.clone(),
        remote_backend: cli.remote_backend.clone(),
        remote_url: cli.remote_url.clone(),
        remote_key: cli.remote_key.clone(),
        log_level: cli.log_level.clone(),
        log_file: cli.log_file.clone(),
    });
    Ok(settings)
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = settings_from(&cli)?;

    logging::init_logging(settings.logging.level.as_deref());
    if let Some(path) = &settings.logging.file {
        if let Err(e) = logging::enable_file_logging(path) {
            warn!(error = %e, "file logging disabled");
        }
    }

    debug!(?settings, "starting");
    let app = App::open(settings).await?;
    let mut stdout = io::stdout().lock();

    match cli.command.unwrap_or(Command::Shell) {
        Command::Shell => {
            let workflow = app.workflow().await;
            let mut shell = Shell::new(workflow, app.config_store(), app.settings.export.dir.clone());
            let input = tokio::io::BufReader::new(tokio::io::stdin());
            shell.run(input, &mut stdout).await?;
        }
        Command::Calc { file } => {
            let json = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let snapshot: FormSnapshot = serde_json::from_str(&json)
                .with_context(|| format!("Not a quote: {}", file.display()))?;
            let config = app.config_store().load().await;
            let totals = PricingEngine::new(&config).calculate(&snapshot);
            report::write_totals(&mut stdout, &totals)?;
        }
        Command::List => {
            let mut workflow = app.workflow().await;
            let listing = workflow.list().await?;
            report::write_listing(&mut stdout, &listing)?;
        }
        Command::Export { id, json, out } => {
            let mut workflow = app.workflow().await;
            workflow.load(&id).await?;
            let session = workflow.session();
            let artifact = if json {
                export_json(&session.snapshot())?
            } else {
                let document = QuoteDocument::build(
                    &session.snapshot(),
                    &session.totals(),
                    &session.config,
                    Local::now().date_naive(),
                );
                export_pdf(&document, &PdfRenderer::default())?
            };
            let dir = out.unwrap_or_else(|| app.settings.export.dir.clone());
            let path = artifact.write_to(&dir)?;
            writeln!(stdout, "Wrote {}.", path.display())?;
        }
        Command::Config(ConfigCommand::Show) => {
            let config = app.config_store().load().await;
            report::write_rates(&mut stdout, &config)?;
        }
        Command::Config(ConfigCommand::Dump) => {
            let config = app.config_store().load().await;
            writeln!(stdout, "{}", serde_json::to_string_pretty(&config)?)?;
        }
        Command::Config(ConfigCommand::Import { file }) => {
            let json = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let value = serde_json::from_str(&json)
                .with_context(|| format!("Not JSON: {}", file.display()))?;
            let config = parse_config(value)?;
            let sync = app.config_store().save_admin(&config).await?;
            writeln!(stdout, "Configuration imported.")?;
            if let Some(note) = report::sync_note(&sync) {
                writeln!(stdout, "{note}")?;
            }
        }
        Command::Config(ConfigCommand::Push) => {
            let store = app.config_store();
            let config = store.load().await;
            let sync = store.save_admin(&config).await?;
            writeln!(
                stdout,
                "{}",
                report::sync_note(&sync).unwrap_or_else(|| "No shared store configured.".to_string())
            )?;
        }
    }

    Ok(())
}
