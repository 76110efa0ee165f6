use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use workchat_api::build_router;
use workchat_api::config::Config;
use workchat_api::services::seed::seed_admin;
use workchat_api::state::AppStateInner;
use workchat_db::Database;
use workchat_identity::{DbIdentity, PasswordPolicy};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "workchat=debug,workchat_api=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Init database
    let db = Arc::new(Database::open(&config.db_path)?);

    let policy = PasswordPolicy {
        min_length: config.password_min_length,
    };
    let identity = DbIdentity::new(db.clone(), policy)
        .with_reset_token_ttl(chrono::Duration::minutes(config.reset_token_minutes));

    // Admin account must exist before the first request
    seed_admin(&identity, &config)?;

    let addr: SocketAddr = config.bind_addr().parse()?;
    let state = AppStateInner::new(db, Arc::new(identity), config);

    // Same-origin only; the browser UI is served from this host.
    let app = build_router(state)
        .layer(CorsLayer::new())
        .layer(TraceLayer::new_for_http());

    info!("WorkChat server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("WorkChat server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let Ok(mut sigterm) = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) else {
            ctrl_c.await.ok();
            info!("Received Ctrl+C, shutting down...");
            return;
        };
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
