use std::fs::File;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::ValueEnum;
use settle_core::calculations::common::format_currency;
use settle_core::dashboard::{CalculatorBoard, Dashboard};
use settle_core::db::RepositoryRegistry;
use settle_core::{AccessLevel, Catalog, OperatorId, SettingsService};
use settle_data::CatalogLoader;
use settle_db_sqlite::SqliteRepositoryFactory;
use tracing::{debug, info};

use crate::config::{AppConfig, CatalogConfig};
use crate::session::SessionFile;

/// Registry with every backend this binary ships.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry
}

pub async fn open_settings(config: &AppConfig) -> Result<SettingsService> {
    debug!("connecting to {} backend", config.database.backend);
    let repo = build_registry()
        .create(&config.database)
        .await
        .with_context(|| format!("cannot open settings store '{}'", config.database.connection_string))?;
    Ok(SettingsService::new(repo))
}

pub fn load_catalog(config: &CatalogConfig) -> Result<Catalog> {
    let Some(path) = &config.csv else {
        return Ok(Catalog::default());
    };
    let file = File::open(path).with_context(|| format!("Failed to open: {}", path.display()))?;
    let catalog = CatalogLoader::load(file)
        .with_context(|| format!("Failed to load catalog: {}", path.display()))?;
    info!(rows = catalog.len(), path = %path.display(), "catalog loaded");
    Ok(catalog)
}

/// Builds a board with one initialized slot per sheet in the session.
pub async fn build_board(
    session: &SessionFile,
    catalog: Catalog,
    settings: &SettingsService,
    today: NaiveDate,
) -> CalculatorBoard {
    let mut board = CalculatorBoard::new(catalog);
    for sheet in &session.operators {
        let instance = sheet.to_instance(board.catalog(), today);
        let rates = settings.effective_settings(sheet.id).await;
        board.insert(instance, rates);
    }
    board
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ReportBlock {
    Primary,
    Secondary,
    #[default]
    Full,
}

/// Report text for one operator, or for every initialized operator when
/// `operator` is `None`. Blocks are returned exactly as rendered; several
/// reports are separated by a blank line.
pub fn render_report(
    board: &CalculatorBoard,
    operator: Option<OperatorId>,
    block: ReportBlock,
) -> Option<String> {
    let ids: Vec<OperatorId> = match operator {
        Some(id) => vec![id],
        None => OperatorId::all().collect(),
    };

    let blocks: Vec<String> = ids
        .into_iter()
        .filter_map(|id| board.output(id))
        .map(|output| match block {
            ReportBlock::Primary => output.report.primary.clone(),
            ReportBlock::Secondary => output.report.secondary.clone(),
            ReportBlock::Full => output.report.full(),
        })
        .collect();

    if blocks.is_empty() {
        None
    } else {
        Some(blocks.join("\n\n"))
    }
}

/// Summary table followed by the digest.
pub fn render_dashboard(dashboard: &Dashboard) -> String {
    let mut out = String::new();
    for row in &dashboard.rows {
        out.push_str(&format!(
            "{:>2}  {:<12}  {:>6}  {:>12}  {:>12}\n",
            row.operator_id.get(),
            row.staff_name,
            row.quantity_display(),
            row.share_display(),
            row.send_display()
        ));
    }
    if !dashboard.rows.is_empty() {
        out.push('\n');
    }
    out.push_str(&dashboard.digest);
    out
}

/// One line per slot with its effective rates.
pub async fn render_settings(settings: &SettingsService) -> String {
    let mut out = String::new();
    for (id, rates) in settings.effective_all().await {
        out.push_str(&format!(
            "operator {id}: commission {} / AP {}\n",
            format_currency(rates.commission_rate),
            format_currency(rates.ap_rate)
        ));
    }
    out
}

/// Reference table of access levels, shown by `settings show`.
pub fn render_access_levels() -> String {
    AccessLevel::ALL
        .iter()
        .map(|level| format!("{} {:<8} {}", level.level(), level.name(), level.description()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use settle_core::dashboard::DIGEST_PLACEHOLDER;
    use settle_core::db::DbConfig;

    use super::*;

    const SESSION: &str = r#"
[[operator]]
id = 2
staff_name = "Tanaka"
counterparty_name = "Sato"
date = "2024-05-01"
expense = "200"

[[operator.line]]
row = 0
quantity = "4"
other = "1"
"#;

    fn memory_config() -> AppConfig {
        AppConfig {
            database: DbConfig {
                backend: "sqlite".to_string(),
                connection_string: ":memory:".to_string(),
            },
            ..AppConfig::default()
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn registry_ships_sqlite() {
        assert_eq!(build_registry().available_backends(), vec!["sqlite"]);
    }

    #[test]
    fn default_catalog_without_csv() {
        let catalog = load_catalog(&CatalogConfig::default()).unwrap();

        assert_eq!(catalog, Catalog::default());
    }

    #[tokio::test]
    async fn board_uses_zero_rates_without_settings() {
        let settings = open_settings(&memory_config()).await.unwrap();
        let session = SessionFile::parse(SESSION).unwrap();

        let board = build_board(&session, Catalog::from_prices([1000]), &settings, today()).await;

        let id = OperatorId::new(2).unwrap();
        let report = render_report(&board, Some(id), ReportBlock::Secondary).unwrap();
        assert!(report.contains("1000×4（1）（0/0/0）"));
        assert!(board.instance(OperatorId::new(1).unwrap()).is_none());
    }

    #[tokio::test]
    async fn unknown_backend_in_config_is_rejected() {
        let config = AppConfig::parse("[database]\nbackend = \"postgres\"\n").unwrap();

        let message = match open_settings(&config).await {
            Err(e) => format!("{e:#}"),
            Ok(_) => panic!("settings store opened for an unknown backend"),
        };

        assert!(message.contains("unknown backend 'postgres' (available: sqlite)"));
    }

    #[tokio::test]
    async fn report_blocks_are_printed_as_rendered() {
        let settings = open_settings(&memory_config()).await.unwrap();
        let session = SessionFile::parse(&format!("{SESSION}\n[[operator]]\nid = 4\n")).unwrap();
        let board = build_board(&session, Catalog::from_prices([1000]), &settings, today()).await;
        let two = OperatorId::new(2).unwrap();
        let output = board.output(two).unwrap();

        let primary = render_report(&board, Some(two), ReportBlock::Primary).unwrap();
        let secondary = render_report(&board, Some(two), ReportBlock::Secondary).unwrap();
        let all = render_report(&board, None, ReportBlock::Secondary).unwrap();

        assert_eq!(primary, output.report.primary);
        assert!(primary.ends_with("1800送りでお願いします\n"));
        assert_eq!(secondary, output.report.secondary);
        assert!(secondary.starts_with("\n―――――――――――\nSato"));
        assert!(all.starts_with("\n―――――――――――\nSato"));
        assert!(all.ends_with("―――――――――――\n\n\n―――――――――――\nAP担当者名\n（TOTAL/0-0＝0）\n―――――――――――"));
    }

    #[tokio::test]
    async fn report_for_uninitialized_operator_is_none() {
        let settings = open_settings(&memory_config()).await.unwrap();
        let board = build_board(&SessionFile::default(), Catalog::default(), &settings, today()).await;

        assert_eq!(render_report(&board, OperatorId::new(1), ReportBlock::Full), None);
        assert_eq!(board.dashboard().digest, DIGEST_PLACEHOLDER);
        assert_eq!(render_dashboard(board.dashboard()), DIGEST_PLACEHOLDER);
    }

    #[tokio::test]
    async fn settings_listing_covers_all_slots() {
        let settings = open_settings(&memory_config()).await.unwrap();

        let listing = render_settings(&settings).await;

        assert_eq!(listing.lines().count(), 5);
        assert!(listing.starts_with("operator 1: commission ¥0 / AP ¥0"));
    }

    #[test]
    fn access_levels_are_listed_in_rank_order() {
        let table = render_access_levels();

        assert!(table.starts_with("1 Viewer"));
        assert!(table.ends_with("統制管理者／所有者"));
    }
}
