//! populate_db - clear the database and insert the sample directory data.

use tracing::info;
use tracing_subscriber::EnvFilter;

use orgdir::config::Config;
use orgdir::db::Database;
use orgdir::seed;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    let db = Database::connect(&config.database_url).await?;

    let summary = seed::populate(&db).await?;

    info!(
        buildings = summary.buildings,
        activities = summary.activities,
        organizations = summary.organizations,
        phones = summary.phones,
        "Sample data created"
    );

    Ok(())
}
