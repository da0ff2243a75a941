use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, bail};
use chrono::Local;
use clap::{Parser, Subcommand};
use settle_core::input::coerce_rate;
use settle_core::{AccessLevel, OperatorId, OperatorSettings, SessionContext};
use settle_data::QuantitySheetLoader;
use tracing::{debug, info};

use settle_cli::app::{self, ReportBlock};
use settle_cli::config::{AppConfig, DEFAULT_CONFIG_FILE};
use settle_cli::logging;
use settle_cli::session::{OperatorSheet, SessionFile};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Commission and settlement calculator for up to five operators.
///
/// Reads calculator input from TOML session files, applies the per-operator
/// rates stored in the settings database, and prints the settlement reports.
#[derive(Debug, Parser)]
#[command(name = "settle", version)]
struct Cli {
    /// Configuration file.
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Database backend; overrides the config file.
    #[arg(long)]
    backend: Option<String>,

    /// Database connection string; overrides the config file.
    /// For SQLite this is a file path (e.g. `settle.db`) or `:memory:`.
    #[arg(long)]
    db: Option<String>,

    /// Log level or filter directive; overrides the config file.
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print settlement reports for a session.
    Report {
        #[arg(long)]
        session: PathBuf,

        /// Only this operator (1-5); every operator in the session otherwise.
        #[arg(long, value_parser = parse_operator)]
        operator: Option<OperatorId>,

        #[arg(long, value_enum, default_value_t = ReportBlock::Full)]
        block: ReportBlock,
    },

    /// Print the cross-operator summary and the combined digest.
    Dashboard {
        #[arg(long)]
        session: PathBuf,
    },

    /// Show or change per-operator rates.
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Merge a `row,quantity,other` CSV into one operator of a session file.
    Quantities {
        #[arg(long)]
        session: PathBuf,

        #[arg(long, value_parser = parse_operator)]
        operator: OperatorId,

        #[arg(long)]
        csv: PathBuf,
    },
}

#[derive(Debug, Subcommand)]
enum SettingsAction {
    /// List the effective rates of every operator.
    Show,

    /// Save one operator's rates. Requires Admin or above.
    Set {
        #[arg(long, value_parser = parse_operator)]
        operator: OperatorId,

        /// Non-numeric or negative input is stored as 0.
        #[arg(long, allow_hyphen_values = true)]
        commission_rate: String,

        #[arg(long, allow_hyphen_values = true)]
        ap_rate: String,

        /// Access level of the current user; none means not logged in.
        #[arg(long)]
        level: Option<AccessLevel>,
    },
}

fn parse_operator(s: &str) -> Result<OperatorId, String> {
    let raw: i64 = s.trim().parse().map_err(|e| format!("'{s}' is not a number: {e}"))?;
    OperatorId::try_from(raw).map_err(|e| e.to_string())
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(&cli.config)?;
    if let Some(backend) = cli.backend {
        config.database.backend = backend;
    }
    if let Some(db) = cli.db {
        config.database.connection_string = db;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    logging::init_logging(&config.logging.level);
    if let Some(path) = &config.logging.file {
        logging::enable_file_logging(path)?;
    }
    debug!(config = %cli.config.display(), "configuration loaded");

    let today = Local::now().date_naive();

    match cli.command {
        Command::Report {
            session,
            operator,
            block,
        } => {
            let catalog = app::load_catalog(&config.catalog)?;
            let settings = app::open_settings(&config).await?;
            let session = SessionFile::load(&session)?;
            let board = app::build_board(&session, catalog, &settings, today).await;

            match app::render_report(&board, operator, block) {
                Some(report) if report.ends_with('\n') => print!("{report}"),
                Some(report) => println!("{report}"),
                None => bail!("no calculator input for the requested operator"),
            }
        }

        Command::Dashboard { session } => {
            let catalog = app::load_catalog(&config.catalog)?;
            let settings = app::open_settings(&config).await?;
            let session = SessionFile::load(&session)?;
            let board = app::build_board(&session, catalog, &settings, today).await;

            println!("{}", app::render_dashboard(board.dashboard()));
        }

        Command::Settings { action } => {
            let settings = app::open_settings(&config).await?;
            match action {
                SettingsAction::Show => {
                    print!("{}", app::render_settings(&settings).await);
                    println!();
                    println!("{}", app::render_access_levels());
                }
                SettingsAction::Set {
                    operator,
                    commission_rate,
                    ap_rate,
                    level,
                } => {
                    let rates =
                        OperatorSettings::new(coerce_rate(&commission_rate), coerce_rate(&ap_rate));
                    settings
                        .save(&SessionContext::from(level), operator, rates)
                        .await?;
                    println!("operator {operator} saved");
                }
            }
        }

        Command::Quantities {
            session: session_path,
            operator,
            csv,
        } => {
            let catalog = app::load_catalog(&config.catalog)?;
            let mut session = SessionFile::load_or_default(&session_path)?;

            let file = File::open(&csv).with_context(|| format!("Failed to open: {}", csv.display()))?;
            let records = QuantitySheetLoader::parse(file)
                .with_context(|| format!("Failed to parse CSV: {}", csv.display()))?;

            let sheet = session
                .sheet(operator)
                .cloned()
                .unwrap_or_else(|| OperatorSheet::new(operator));
            let mut instance = sheet.to_instance(&catalog, today);
            let applied = QuantitySheetLoader::apply(&mut instance, &records);

            session.upsert(OperatorSheet::from_instance(&instance));
            session.save(&session_path)?;
            info!(operator = %operator, applied, skipped = records.len() - applied, "quantities merged");
            println!("merged {applied} of {} rows into operator {operator}", records.len());
        }
    }

    Ok(())
}
