//! Darshan API Server
//!
//! REST API server for the Dilli Darshan guide.

use anyhow::Context;
use darshan_api::auth::{CredentialHasher, JwtConfig, PasswordConfig};
use darshan_api::{create_router, state::AppState};
use darshan_core::{AppConfig, GemRepository, MemoryStore, PgStore, UserRepository};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration; an optional TOML file is overlaid by the environment
    let config = match std::env::var("DARSHAN_CONFIG") {
        Ok(path) => AppConfig::from_file(path)?.with_env_override()?,
        Err(_) => AppConfig::from_env()?,
    };

    init_tracing(&config);

    config.validate()?;
    let jwt = JwtConfig::from_auth_config(&config.auth, config.environment)?;
    let hasher = CredentialHasher::new(&PasswordConfig::default())
        .context("Invalid password hashing parameters")?;

    let (users, gems): (Arc<dyn UserRepository>, Arc<dyn GemRepository>) =
        match &config.database.url {
            Some(url) => {
                let store = PgStore::new(url, config.database.pool_size)
                    .await
                    .context("Failed to connect to PostgreSQL")?;
                store.migrate().await.context("Failed to bootstrap schema")?;
                tracing::info!("Using PostgreSQL store");
                let store = Arc::new(store);
                (store.clone() as Arc<dyn UserRepository>, store as Arc<dyn GemRepository>)
            }
            None => {
                tracing::warn!("DATABASE_URL not set; using in-memory store (data is lost on exit)");
                let store = Arc::new(MemoryStore::new());
                (store.clone() as Arc<dyn UserRepository>, store as Arc<dyn GemRepository>)
            }
        };

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let environment = config.environment;

    // Create application state
    let state = Arc::new(AppState::new(config, jwt, hasher, users, gems));

    // Create router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Darshan API Server ({}) starting on http://{}", environment, addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);
    tracing::info!("OpenAPI spec at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// `RUST_LOG` wins; otherwise `LOG_LEVEL` applies to this workspace and tower-http
fn init_tracing(config: &AppConfig) {
    let level = &config.logging.level;
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("darshan_api={level},darshan_core={level},tower_http={level},audit=info").into()
    });

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}
