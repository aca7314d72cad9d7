// tests/api_http.rs
//
// HTTP-level tests for the public Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - GET /            (HTML page, with and without stories)
// - GET /api/news
// - GET /api/bundle  (ETag + If-None-Match)

use axum::{
    body::{self, Body},
    Router,
};
use http::{header, HeaderMap, Request, StatusCode};
use chrono::{Duration, Utc};
use serde_json::Value as Json;
use tower::ServiceExt as _; // for `oneshot`

use techspace_shorts::ingest::providers::GoogleNewsProvider;
use techspace_shorts::{api, AppState, NewsFeed, NewsProvider};

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

/// Google News style feed dated relative to now so the 24h filter keeps it.
fn recent_feed_xml() -> String {
    let now = Utc::now();
    let item = |title: &str, source: &str, slug: &str, hours: i64, desc: &str| {
        format!(
            "<item><title>{title} - {source}</title>\
             <link>https://news.google.com/rss/articles/{slug}</link>\
             <pubDate>{}</pubDate><description>{desc}</description>\
             <source url=\"https://{slug}.example\">{source}</source></item>",
            (now - Duration::hours(hours)).to_rfc2822()
        )
    };
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><rss version=\"2.0\"><channel><title>test</title>{}{}{}</channel></rss>",
        item("Rocket Lab launches Venus probe", "SpaceNews", "venus", 1, "The probe will sample clouds."),
        item("Apple &amp; Google team up on satellite texting", "The Verge", "sat", 3, ""),
        item("Week-old robotics story", "Wired", "old", 24 * 7, "Too old."),
    )
}

fn router_with(providers: Vec<Box<dyn NewsProvider>>) -> Router {
    api::create_router(AppState::new(NewsFeed::new(providers, 24, 8, 0.9)))
}

fn test_router() -> Router {
    let providers: Vec<Box<dyn NewsProvider>> = vec![Box::new(GoogleNewsProvider::from_fixture_str(
        "Space",
        &recent_feed_xml(),
    ))];
    router_with(providers)
}

async fn get(app: Router, uri: &str) -> (StatusCode, HeaderMap, String) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build GET");
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    (status, headers, String::from_utf8(bytes).expect("utf8"))
}

#[tokio::test]
async fn health_returns_ok() {
    let (status, _, body) = get(test_router(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.trim(), "ok");
}

#[tokio::test]
async fn index_renders_bundle_and_rundown() {
    let (status, headers, html) = get(test_router(), "/").await;
    assert_eq!(status, StatusCode::OK);
    let ct = headers
        .get(header::CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");
    assert!(ct.starts_with("text/html"), "content-type {ct}");

    for needle in [
        "Narration Script",
        "Publishing Toolkit",
        "Headline Rundown",
        "2 stories",
        "Rocket Lab launches Venus probe",
        "Apple &amp; Google team up on satellite texting",
        "The probe will sample clouds.",
        "Source on Google News",
        "rel=\"noopener noreferrer\"",
        "#SpaceNews",
    ] {
        assert!(html.contains(needle), "missing {needle:?}");
    }
    assert!(!html.contains("Week-old robotics story"));
}

#[tokio::test]
async fn index_with_empty_feed_shows_fallback() {
    let (status, _, html) = get(router_with(Vec::new()), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("No fresh feeds"));
    assert!(html.contains("No fresh tech or space stories"));
}

#[tokio::test]
async fn api_news_lists_fresh_items_as_camel_case_json() {
    let (status, _, body) = get(test_router(), "/api/news").await;
    assert_eq!(status, StatusCode::OK);
    let v: Json = serde_json::from_str(&body).expect("news json");
    let arr = v.as_array().expect("array");
    assert_eq!(arr.len(), 2);
    assert_eq!(arr[0]["title"], "Rocket Lab launches Venus probe");
    assert_eq!(arr[0]["source"], "SpaceNews");
    assert!(arr[0].get("publishedAt").is_some(), "missing publishedAt");
    assert_eq!(arr[1]["title"], "Apple & Google team up on satellite texting");
}

#[tokio::test]
async fn api_bundle_has_fields_and_etag() {
    let (status, headers, body) = get(test_router(), "/api/bundle").await;
    assert_eq!(status, StatusCode::OK);

    let v: Json = serde_json::from_str(&body).expect("bundle json");
    let bundle = v.get("bundle").expect("bundle object");
    for field in ["narration", "title", "hashtags", "thumbnailText", "visualPrompts"] {
        assert!(bundle.get(field).is_some(), "missing {field}");
    }
    assert_eq!(v["storyCount"], 2);

    let fp = v["fingerprint"].as_str().expect("fingerprint");
    let etag = headers
        .get(header::ETAG)
        .and_then(|h| h.to_str().ok())
        .expect("etag header");
    assert_eq!(etag, format!("\"{fp}\""));
}

#[tokio::test]
async fn api_bundle_honors_if_none_match() {
    let app = test_router();
    let (_, headers, _) = get(app.clone(), "/api/bundle").await;
    let etag = headers
        .get(header::ETAG)
        .and_then(|h| h.to_str().ok())
        .expect("etag")
        .to_string();

    let req = Request::builder()
        .method("GET")
        .uri("/api/bundle")
        .header(header::IF_NONE_MATCH, etag)
        .body(Body::empty())
        .expect("build conditional GET");
    let resp = app.oneshot(req).await.expect("oneshot");
    assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);
}

#[tokio::test]
async fn api_bundle_accepts_weak_validator() {
    let app = test_router();
    let (_, headers, _) = get(app.clone(), "/api/bundle").await;
    let etag = headers
        .get(header::ETAG)
        .and_then(|h| h.to_str().ok())
        .expect("etag")
        .to_string();

    let req = Request::builder()
        .method("GET")
        .uri("/api/bundle")
        .header(header::IF_NONE_MATCH, format!("W/{etag}"))
        .body(Body::empty())
        .expect("build conditional GET");
    let resp = app.oneshot(req).await.expect("oneshot");
    assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);
}
