//! orgdird - Organization Directory API server.

use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use orgdir::api::{self, AppState};
use orgdir::config::{Config, PROJECT_NAME, PROJECT_VERSION};
use orgdir::db::Database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    // Initialize tracing; DEBUG=1 lowers the default level, RUST_LOG wins.
    let default_filter = if config.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(true)
        .init();

    info!(
        version = PROJECT_VERSION,
        host = %config.host,
        port = config.port,
        debug = config.debug,
        "Starting {PROJECT_NAME}"
    );

    // Refuse to start with the placeholder API key. Every request is
    // authenticated against it, so shipping the default makes auth decorative.
    if config.has_default_api_key() && !config.debug {
        if std::env::var("ORGDIR_ALLOW_INSECURE_KEY").is_ok() {
            warn!("INSECURE: running with the default API key (allowed via ORGDIR_ALLOW_INSECURE_KEY)");
        } else {
            error!("FATAL: API_KEY is still the shipped placeholder.");
            error!("  Set a strong key in .env or the environment:");
            error!("    API_KEY=\"<random-32-char-string>\"");
            error!("  Generate one with:");
            error!("    openssl rand -hex 32");
            error!("  For local testing only, set ORGDIR_ALLOW_INSECURE_KEY=1 or DEBUG=1.");
            return Err(anyhow::anyhow!(
                "Refusing to start with the default API key. See error messages above."
            ));
        }
    }

    let db = Database::connect(&config.database_url).await?;

    let addr = config.bind_addr();
    let state = Arc::new(AppState {
        db,
        config: config.clone(),
    });
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "HTTP server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
