use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use metrics::counter;
use tower_http::cors::CorsLayer;

use crate::ingest::types::NewsItem;
use crate::ingest::NewsFeed;
use crate::render::render_page;
use crate::script::{build_script_bundle, fingerprint, ScriptBundle};

#[derive(Clone)]
pub struct AppState {
    pub feed: Arc<NewsFeed>,
}

impl AppState {
    pub fn new(feed: NewsFeed) -> Self {
        Self {
            feed: Arc::new(feed),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(|| async { "ok" }))
        .route("/api/news", get(news))
        .route("/api/bundle", get(bundle))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn index(State(state): State<AppState>) -> Html<String> {
    let items = state.feed.fetch_latest_news().await;
    let bundle = build_script_bundle(&items);
    counter!("page_renders_total").increment(1);
    tracing::debug!(stories = items.len(), "rendering page");
    Html(render_page(&items, &bundle, Utc::now()))
}

async fn news(State(state): State<AppState>) -> Json<Vec<NewsItem>> {
    Json(state.feed.fetch_latest_news().await)
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct BundleResp {
    bundle: ScriptBundle,
    story_count: usize,
    fingerprint: String,
}

async fn bundle(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let items = state.feed.fetch_latest_news().await;
    let bundle = build_script_bundle(&items);
    let fp = fingerprint(&bundle);
    let etag = format!("\"{fp}\"");

    let unchanged = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| if_none_match(v, &etag));

    let etag_value = HeaderValue::from_str(&etag).unwrap_or(HeaderValue::from_static("\"\""));
    if unchanged {
        return (StatusCode::NOT_MODIFIED, [(header::ETAG, etag_value)]).into_response();
    }

    let body = BundleResp {
        bundle,
        story_count: items.len(),
        fingerprint: fp,
    };
    ([(header::ETAG, etag_value)], Json(body)).into_response()
}

/// Weak comparison: `W/"x"` matches `"x"`.
fn if_none_match(header: &str, etag: &str) -> bool {
    header.split(',').map(str::trim).any(|t| {
        t == "*" || t.strip_prefix("W/").unwrap_or(t) == etag.strip_prefix("W/").unwrap_or(etag)
    })
}
