use std::sync::Arc;

use anyhow::Context;
use classifier::Classifier;
use common::storage::filesystem::FilesystemFileStore;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use server::config::AppConfig;
use server::oauth::GithubProvider;
use server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    if config.oauth.client_id.is_empty() {
        warn!("oauth.client_id is empty; logins will be rejected by the provider");
    }

    let db = server::database::init_db(&config.database.url)
        .await
        .context("Failed to initialize database")?;

    let store = FilesystemFileStore::new(config.storage.upload_dir.clone())
        .await
        .with_context(|| {
            format!(
                "Failed to create upload directory {}",
                config.storage.upload_dir.display()
            )
        })?;

    let oauth = GithubProvider::new(config.oauth.clone());

    let classifier = if config.classifier.enabled {
        let classifier =
            Classifier::from_config(&config.classifier).context("Failed to load classifier")?;
        info!(labels = classifier.labels().len(), "Classifier ready");
        Some(Arc::new(classifier))
    } else {
        info!("Classifier disabled");
        None
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);

    let state = AppState {
        db,
        config,
        store: Arc::new(store),
        oauth: Arc::new(oauth),
        classifier,
    };

    let app = server::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
