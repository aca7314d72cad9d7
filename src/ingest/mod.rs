// src/ingest/mod.rs
pub mod providers;
pub mod types;

use crate::config::FeedConfig;
use crate::ingest::providers::GoogleNewsProvider;
use crate::ingest::types::{NewsItem, NewsProvider};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use metrics::{counter, describe_counter, describe_histogram};
use once_cell::sync::OnceCell;
use std::collections::HashSet;
use strsim::normalized_levenshtein;

/// Items dated this far ahead of `now` are still accepted (publisher clock skew).
const FUTURE_SKEW_MINUTES: i64 = 15;
const TEXT_CAP_CHARS: usize = 1500;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feed_items_parsed_total", "Total items parsed from providers.");
        describe_counter!(
            "feed_items_kept_total",
            "Items kept after recency filter + dedup + cap."
        );
        describe_counter!("feed_stale_total", "Items dropped as too old (or too far ahead).");
        describe_counter!(
            "feed_dedup_total",
            "Items dropped as duplicate links or near-duplicate headlines."
        );
        describe_counter!("feed_provider_errors_total", "Provider fetch/parse errors.");
        describe_histogram!("feed_parse_ms", "Provider parse time in milliseconds.");
    });
}

/// Collapse any run of whitespace to a single space and trim.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize feed text: decode entities, strip tags, fold quotes, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace (includes NBSP)
    out = collapse_whitespace(&out);

    // 5) Length cap
    if out.chars().count() > TEXT_CAP_CHARS {
        out = out.chars().take(TEXT_CAP_CHARS).collect();
    }

    out
}

/// Recency filter, newest-first ordering, link + headline dedup, cap.
/// Returns (kept, stale_count, dedup_count).
pub fn filter_dedup_rank(
    now: DateTime<Utc>,
    raw: Vec<NewsItem>,
    max_age: Duration,
    max_items: usize,
    title_similarity: f32,
) -> (Vec<NewsItem>, usize, usize) {
    let oldest = now - max_age;
    let newest = now + Duration::minutes(FUTURE_SKEW_MINUTES);

    let mut stale = 0usize;
    let mut fresh = Vec::with_capacity(raw.len());
    for it in raw {
        if it.published_at < oldest || it.published_at > newest {
            stale += 1;
            continue;
        }
        fresh.push(it);
    }

    // stable: equal timestamps keep provider order
    fresh.sort_by(|a, b| b.published_at.cmp(&a.published_at));

    let mut seen_links: HashSet<String> = HashSet::new();
    let mut kept_titles: Vec<String> = Vec::new();
    let mut keep = Vec::with_capacity(fresh.len());
    let mut dedup = 0usize;

    for it in fresh {
        if !seen_links.insert(it.link.clone()) {
            dedup += 1;
            continue;
        }
        let title = it.title.to_lowercase();
        let near_dup = kept_titles
            .iter()
            .any(|t| normalized_levenshtein(t, &title) as f32 >= title_similarity);
        if near_dup {
            dedup += 1;
            continue;
        }
        kept_titles.push(title);
        keep.push(it);
    }

    keep.truncate(max_items);
    (keep, stale, dedup)
}

/// The fetch stage: every configured provider, merged and filtered.
pub struct NewsFeed {
    providers: Vec<Box<dyn NewsProvider>>,
    max_age: Duration,
    max_items: usize,
    title_similarity: f32,
}

impl NewsFeed {
    pub fn new(
        providers: Vec<Box<dyn NewsProvider>>,
        max_age_hours: u32,
        max_items: usize,
        title_similarity: f32,
    ) -> Self {
        Self {
            providers,
            max_age: Duration::hours(i64::from(max_age_hours)),
            max_items,
            title_similarity,
        }
    }

    /// Google News providers for every configured topic, sharing one HTTP client.
    pub fn from_config(cfg: &FeedConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(cfg.timeout_secs))
            .user_agent(cfg.user_agent.clone())
            .build()
            .context("building feed http client")?;

        let mut providers: Vec<Box<dyn NewsProvider>> = Vec::with_capacity(cfg.queries.len());
        for topic in &cfg.queries {
            providers.push(Box::new(GoogleNewsProvider::for_topic(
                cfg,
                topic,
                client.clone(),
            )?));
        }
        tracing::info!(
            providers = providers.len(),
            max_age_hours = cfg.max_age_hours,
            max_items = cfg.max_items,
            "news feed configured"
        );
        Ok(Self::new(
            providers,
            cfg.max_age_hours,
            cfg.max_items,
            cfg.title_similarity,
        ))
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub async fn fetch_latest_news(&self) -> Vec<NewsItem> {
        self.fetch_latest_news_at(Utc::now()).await
    }

    /// Never fails: provider errors are logged and counted, the rest is returned.
    pub async fn fetch_latest_news_at(&self, now: DateTime<Utc>) -> Vec<NewsItem> {
        ensure_metrics_described();

        let mut raw = Vec::new();
        for p in &self.providers {
            match p.fetch_latest().await {
                Ok(mut v) => raw.append(&mut v),
                Err(e) => {
                    tracing::warn!(error = ?e, provider = p.name(), "provider error");
                    counter!("feed_provider_errors_total").increment(1);
                }
            }
        }

        let (kept, stale, dedup) = filter_dedup_rank(
            now,
            raw,
            self.max_age,
            self.max_items,
            self.title_similarity,
        );

        // Telemetry
        counter!("feed_items_kept_total").increment(kept.len() as u64);
        counter!("feed_stale_total").increment(stale as u64);
        counter!("feed_dedup_total").increment(dedup as u64);

        tracing::info!(
            target: "feed",
            kept = kept.len(),
            stale = stale,
            dedup = dedup,
            "news feed refreshed"
        );
        kept
    }
}
