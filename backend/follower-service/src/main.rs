use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use follower_service::config::{Config, StoreBackend};
use follower_service::connection::{
    ConnectionManager, LivenessProbe, MemoryConnector, Neo4jConnector, StoreConnector,
};
use follower_service::http::{self, AppState};
use follower_service::repository::{GraphStore, MemoryGraphStore};
use follower_service::services::RelationshipService;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler, listening for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

async fn connect_store<C: StoreConnector>(
    connector: C,
    config: &Config,
) -> Result<Arc<dyn GraphStore>> {
    let manager = ConnectionManager::new(connector, config.startup.clone());
    manager
        .establish(shutdown_signal())
        .await
        .context("Graph store unavailable at startup")
}

#[actix_web::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "follower_service=info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting follower-service");

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env().context("Failed to load configuration")?;

    info!(
        "Configuration loaded: http_port = {}, store = {:?}, Neo4j URI = {}, max connect attempts = {}",
        config.server.http_port, config.store, config.neo4j.uri, config.startup.max_attempts
    );

    // Never serve without a working store session
    let store = match config.store {
        StoreBackend::Neo4j => connect_store(Neo4jConnector::new(config.neo4j.clone()), &config).await?,
        StoreBackend::Memory => {
            warn!("Using in-memory graph store - edges are lost on restart");
            connect_store(MemoryConnector::new(MemoryGraphStore::new()), &config).await?
        }
    };

    let relationships = RelationshipService::new(store.clone(), config.server.request_timeout);
    let probe = LivenessProbe::new(store.clone(), config.probe.timeout);
    let state = web::Data::new(AppState::new(relationships, probe));

    let http_addr = format!("{}:{}", config.server.host, config.server.http_port);
    info!("HTTP server listening on http://{}", http_addr);

    // actix handles SIGINT/SIGTERM: stop accepting, then drain in-flight
    // requests for up to the grace period.
    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(state.clone())
            .configure(http::configure)
    })
    .shutdown_timeout(config.server.shutdown_grace.as_secs())
    .bind(&http_addr)
    .context("Failed to bind HTTP server")?
    .run()
    .await
    .context("HTTP server failed")?;

    drop(store);
    info!("Graph store session released, follower-service stopped");
    Ok(())
}
