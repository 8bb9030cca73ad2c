//! # Worklog API Server
//!
//! The Worklog API server: developers log hours against weekly periods,
//! admin/HR review tasks, generate invoices, and record payment evidence.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p worklog-api
//! ```

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use worklog_api::{
    app::{build_router, AppState},
    config::Config,
};
use worklog_shared::{
    auth::oauth::{OauthClient, OauthConfig},
    db::{migrations, pool},
    storage::LocalDocumentStore,
    tracker::{TrackerClient, TrackerConfig},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "worklog_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Worklog API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let db = pool::create_pool(pool::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;

    migrations::run_migrations(&db).await?;

    let documents = match &config.storage.directory {
        Some(dir) => LocalDocumentStore::new(dir.into()).await?,
        None => LocalDocumentStore::in_temp_dir().await?,
    };

    let oauth = OauthClient::new(OauthConfig {
        token_url: config.oauth.token_url.clone(),
        userinfo_url: config.oauth.userinfo_url.clone(),
        client_id: config.oauth.client_id.clone(),
        client_secret: config.oauth.client_secret.clone(),
        redirect_uri: config.oauth.redirect_uri.clone(),
    });

    let tracker = TrackerClient::new(TrackerConfig {
        base_url: config.tracker.base_url.clone(),
        api_user: config.tracker.api_user.clone(),
        api_token: config.tracker.api_token.clone(),
    });

    let bind_address = config.bind_address();
    let state = AppState::new(db, config, Arc::new(documents), oauth, tracker);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown signal received, exiting...");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
}
