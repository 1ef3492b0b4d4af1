use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use salonbook::config::AppConfig;
use salonbook::db::{self, SqliteStore};
use salonbook::handlers;
use salonbook::services::{BookingEngine, Clock, SystemClock};
use salonbook::state::AppState;

const LOCK_PRUNE_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();
    let calendar = config.calendar()?;
    tracing::info!(
        open_hour = calendar.open_hour(),
        close_hour = calendar.close_hour(),
        granularity = calendar.slot_granularity_minutes(),
        "business calendar loaded"
    );

    let conn = db::init_db(&config.database_url)?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let engine = BookingEngine::new(Arc::new(SqliteStore::new(conn)), calendar, clock.clone());

    let state = Arc::new(AppState {
        engine,
        config: config.clone(),
    });

    tokio::spawn(prune_locks_loop(state.clone(), clock));

    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Per-day booking locks are only needed until the day is over.
async fn prune_locks_loop(state: Arc<AppState>, clock: Arc<dyn Clock>) {
    let mut interval = tokio::time::interval(LOCK_PRUNE_INTERVAL);
    loop {
        interval.tick().await;
        let pruned = state.engine.prune_locks(clock.today());
        if pruned > 0 {
            tracing::debug!(pruned, "pruned booking locks for past days");
        }
    }
}
