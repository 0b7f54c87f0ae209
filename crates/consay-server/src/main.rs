//! Consay Server — Application entry point.

use consay_consent::ConsentConfig;
use consay_db::DbConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("consay=info".parse().unwrap()),
        )
        .json()
        .init();

    tracing::info!("Starting Consay server...");

    let consent_config = ConsentConfig {
        base_url: std::env::var("CONSAY_BASE_URL")
            .unwrap_or_else(|_| ConsentConfig::default().base_url),
        ..Default::default()
    };
    if let Err(e) = consent_config.validate() {
        tracing::error!(error = %e, "Invalid consent configuration");
        std::process::exit(1);
    }

    let db_config = DbConfig::from_env();
    let manager = match consay_db::DbManager::connect(&db_config).await {
        Ok(m) => m,
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to SurrealDB");
            std::process::exit(1);
        }
    };

    if let Err(e) = consay_db::run_migrations(manager.client()).await {
        tracing::error!(error = %e, "Migration failed");
        std::process::exit(1);
    }

    tracing::info!(base_url = %consent_config.base_url, "Consay ready");

    // TODO: mount the HTTP layer (dashboard, /approve/{token}, /c/{slug})
    // on top of the consent service once the UI work lands.

    tracing::info!("Consay server stopped.");
}
