use anyhow::Result;
use tracing::{error, info, warn};

use stress_tracker::config::Config;
use stress_tracker::db::Database;
use stress_tracker::i18n::{CatalogValidator, TranslationCatalog, REQUIRED_KEYS};
use stress_tracker::seed;

fn main() -> Result<()> {
    // Load .env file (ignored when absent)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("stress_tracker=info".parse()?),
        )
        .init();

    info!("Starting stress tracker");

    let config = Config::from_env()?;

    // A catalog missing required keys is a deployment mistake; refuse to
    // start rather than showing bracketed placeholders to the user.
    let catalog = TranslationCatalog::load(&config.translation_file())?;
    let report = CatalogValidator::validate(&catalog, REQUIRED_KEYS);
    for warning in &report.warnings {
        warn!(locale = catalog.locale(), "{}", warning);
    }
    if report.has_errors() {
        for problem in &report.errors {
            error!(locale = catalog.locale(), "{}", problem);
        }
        anyhow::bail!(
            "translation catalog '{}' is incomplete ({} missing keys)",
            catalog.locale(),
            report.errors.len()
        );
    }
    info!(locale = catalog.locale(), keys = catalog.len(), "Translations loaded");

    config.ensure_data_dir()?;
    let db = Database::new(&config.database_path)?;
    seed::seed_defaults(&db)?;

    println!("{}", catalog.resolve("app.title"));
    println!("{}", catalog.resolve("app.ready"));
    Ok(())
}
