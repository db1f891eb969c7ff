use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

mod app;
mod http;
mod ws;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "newsroom_gateway=info,tower_http=debug".into()),
        )
        .init();

    // load config: explicit path > NEWSROOM_CONFIG env > ~/.newsroom/newsroom.toml
    let config_path = std::env::var("NEWSROOM_CONFIG").ok();
    let config = newsroom_core::config::NewsroomConfig::load(config_path.as_deref())
        .unwrap_or_else(|e| {
            tracing::warn!("Config load failed ({}), using defaults", e);
            newsroom_core::config::NewsroomConfig::default()
        });

    let bind = config.server.bind.clone();
    let port = config.server.port;
    let sweep_interval = Duration::from_secs(config.scheduler.sweep_interval_secs);

    // open SQLite database and run the idempotent schema migration
    let db_path = &config.database.path;
    ensure_parent_dir(db_path);
    info!(path = %db_path, "opening SQLite database");

    let conn = rusqlite::Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    let store = Arc::new(newsroom_store::SqliteStore::new(conn)?);

    // broadcaster is constructed exactly once here and handed to everything
    // that publishes: the sweeper below and the CRUD handlers via AppState
    let broadcaster = newsroom_events::EventBroadcaster::new();

    // spawn the publication sweeper loop in the background
    let sweeper = newsroom_sweeper::PublicationSweeper::new(
        store.clone(),
        broadcaster.clone(),
        sweep_interval,
    );
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move { sweeper.run(shutdown_rx).await });

    let state = Arc::new(app::AppState::new(config, store, broadcaster));
    let router = app::build_router(state);

    let addr: SocketAddr = format!("{}:{}", bind, port).parse()?;
    info!("Newsroom gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // server drained — signal the sweeper to stop
    let _ = shutdown_tx.send(true);
    info!("Newsroom gateway stopped");
    Ok(())
}

/// Resolves on Ctrl-C / SIGTERM, triggering graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("shutdown signal received");
}

/// Ensure the parent directory for a file path exists.
fn ensure_parent_dir(path: &str) {
    if let Some(parent) = std::path::Path::new(path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
}
