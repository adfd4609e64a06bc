use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;

use turfbook::app::router;
use turfbook::config::AppConfig;
use turfbook::db;
use turfbook::services::allocator::TurfLocks;
use turfbook::services::notify::InboxDispatcher;
use turfbook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;
    let db = Arc::new(Mutex::new(conn));

    let state = Arc::new(AppState {
        db: Arc::clone(&db),
        config: config.clone(),
        notifier: Box::new(InboxDispatcher::new(db)),
        turf_locks: TurfLocks::new(),
    });

    let app = router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
