//! TechSpace Shorts — Binary Entrypoint
//! Boots the Axum HTTP server, wiring the news feed, routes and metrics.

use shuttle_axum::ShuttleAxum;
use techspace_shorts::{api, enable_dev_tracing, metrics::Metrics, AppState, FeedConfig, NewsFeed};

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    // This enables FEED_CONFIG_PATH / FEED_MAX_ITEMS from .env.
    let _ = dotenvy::dotenv();

    // Initialize dev tracing early (no-op in production).
    enable_dev_tracing();

    let cfg = FeedConfig::load_default()?;
    let feed = NewsFeed::from_config(&cfg)?;
    tracing::info!(topics = ?feed.provider_names(), "feed ready");

    let metrics = Metrics::init()?;
    let router = api::create_router(AppState::new(feed)).merge(metrics.router());

    Ok(router.into())
}
