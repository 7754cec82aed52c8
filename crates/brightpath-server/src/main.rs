mod cleanup;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use brightpath_api::{AppState, AppStateInner, Config};
use brightpath_db::Database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "brightpath=debug,brightpath_api=debug,brightpath_db=info,tower_http=debug".into()
            }),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("FATAL: {}", e);
            eprintln!("       Check your environment or .env file and restart.");
            std::process::exit(1);
        }
    };

    let db = Database::open(&config.db_path)?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let cleanup_secs = config.session_cleanup_secs;
    if !config.cookie_secure {
        info!("Session cookie is not marked Secure (BRIGHTPATH_COOKIE_SECURE=false)");
    }

    let state: AppState = Arc::new(AppStateInner::new(db, config)?);

    let admins = brightpath_api::auth::bootstrap_admins(&state)?;
    if admins > 0 {
        info!("{} admin account(s) ready", admins);
    }

    // Background session expiry sweep
    tokio::spawn(cleanup::run_session_cleanup(state.clone(), cleanup_secs));

    let app = brightpath_api::router(state);

    info!("BrightPath listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

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
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
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
