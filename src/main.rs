//! Wattscope - campus energy monitoring: aggregation, anomaly detection,
//! and alert feeds over hourly meter samples.
//!
//! The server seeds an in-memory dataset of generated meter readings for
//! the reference campus, then rolls it forward one hour per refresh tick.
//! Callers can replace the dataset entirely via `POST /samples`.
//!
//! # API Endpoints
//!
//! - `GET /series` - Aggregated consumption per scope and granularity
//! - `GET /summary` - Usage statistics for a scope
//! - `GET /breakdown` - Per-building totals
//! - `GET /breakdown/:building` - Per-room totals within a building
//! - `GET /alerts` - The unified alert feed
//! - `GET /alerts/export` - The alert feed as CSV
//! - `GET /detection` - Full detection report for a scope
//! - `GET /insights` - Derived guidance and savings projections
//! - `POST /samples` - Replace the dataset
//! - `GET /health` - Health check

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use wattscope::api::{AppState, router};
use wattscope::campus::CampusStructure;
use wattscope::detect::DetectorConfig;
use wattscope::generate::{advance, generate_campus_data};
use wattscope::store::SampleStore;

/// Default port if not specified via environment variable.
const DEFAULT_PORT: u16 = 3000;

/// Default live-tick interval in seconds.
const DEFAULT_REFRESH_SECS: u64 = 60;

/// Default sliding window, in days, kept by the live tick.
const DEFAULT_WINDOW_DAYS: i64 = 30;

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("wattscope=info".parse()?))
        .init();

    // Load configuration from environment
    let port: u16 = env_parsed("WATTSCOPE_PORT", DEFAULT_PORT);
    let refresh_secs: u64 = env_parsed("WATTSCOPE_REFRESH_SECS", DEFAULT_REFRESH_SECS);
    let window_days: i64 = env_parsed("WATTSCOPE_WINDOW_DAYS", DEFAULT_WINDOW_DAYS);
    let detector = DetectorConfig::extended()
        .with_rate(env_parsed("WATTSCOPE_RATE_PER_KWH", DetectorConfig::basic().rate_per_kwh));

    info!(port, refresh_secs, window_days, "Starting Wattscope server");

    // Seed the dataset for the reference campus.
    let campus = CampusStructure::default();
    let samples = {
        let mut rng = rand::rng();
        generate_campus_data(&campus, window_days.unsigned_abs(), Utc::now(), &mut rng)
    };
    let store = Arc::new(RwLock::new(SampleStore::new(campus, samples)));
    info!(
        sample_count = store.read().await.len(),
        "Initial dataset generated"
    );

    // Live tick: roll the dataset forward one hour per interval.
    let tick_store = Arc::clone(&store);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(refresh_secs.max(1)));
        interval.tick().await; // first tick fires immediately; skip it
        loop {
            interval.tick().await;
            let mut store = tick_store.write().await;
            let next = {
                let mut rng = rand::rng();
                advance(
                    store.samples(),
                    store.campus(),
                    Utc::now(),
                    window_days,
                    &mut rng,
                )
            };
            let count = next.len();
            store.replace_samples(next);
            info!(sample_count = count, "Live tick applied");
        }
    });

    let state = AppState { store, detector };
    let app = router(state).layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Wattscope is listening");

    axum::serve(listener, app).await?;

    Ok(())
}
