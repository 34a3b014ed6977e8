mod config;
mod relay;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use skillbank_api::proofs::ProofStore;
use skillbank_api::{AppState, AppStateInner};
use skillbank_db::Database;
use skillbank_ledger::Ledger;

use crate::config::Config;
use crate::relay::{WebhookSink, run_relay_loop};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skillbank=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Init database
    let db = Arc::new(Database::open(&config.db_path)?);
    let ledger = Ledger::new(db.clone(), config.limits);
    let proofs = ProofStore::new(config.proof_dir.clone(), config.public_url.clone()).await?;

    match &config.owner_username {
        Some(owner) => info!("Bootstrap owner username: {}", owner),
        None => warn!("SKILLBANK_OWNER_USERNAME not set; no account can assign roles"),
    }

    // Outbox relay
    match &config.webhook_url {
        Some(url) => {
            let sink = Arc::new(WebhookSink::new(url.clone())?);
            info!(
                "Notification relay posting to {} every {}s",
                url, config.relay_interval_secs
            );
            tokio::spawn(run_relay_loop(db.clone(), sink, config.relay_interval_secs));
        }
        None => info!("No notification webhook configured; notifications stay in-app"),
    }

    let state: AppState = Arc::new(AppStateInner {
        ledger,
        jwt_secret: config.jwt_secret.clone(),
        proofs,
        owner_username: config.owner_username.clone(),
    });

    let app = skillbank_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("SkillBank server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
