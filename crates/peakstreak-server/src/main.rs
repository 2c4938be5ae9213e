mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{
    Method,
    header::{AUTHORIZATION, CONTENT_TYPE},
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use peakstreak_api::{AppStateInner, LocalStorage};
use peakstreak_core::{Service, ServiceConfig};
use peakstreak_db::{Database, SqliteGateway};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "peakstreak=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Init database and avatar storage
    let db = Arc::new(Database::open(&config.db_path)?);
    let storage = LocalStorage::new(config.upload_dir.clone(), &config.upload_url_prefix).await?;
    let avatars = ServeDir::new(storage.dir());

    let service = Service::new(
        Arc::new(SqliteGateway::new(db)),
        Arc::new(storage),
        ServiceConfig {
            profile_window_days: config.profile_window_days,
            ..ServiceConfig::default()
        },
    );

    let state = Arc::new(AppStateInner {
        service,
        jwt_secret: config.jwt_secret.clone(),
        jwt_expires_hours: config.jwt_expires_hours,
        request_timeout: config.request_timeout,
    });

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    let app = peakstreak_api::router(state)
        .nest_service(&config.upload_url_prefix, avatars)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("peakstreak listening on {}", addr);
    info!(
        "Profile window {} days, request timeout {:?}",
        config.profile_window_days, config.request_timeout
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
