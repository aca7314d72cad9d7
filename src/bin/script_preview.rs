//! Builds one script bundle and prints it as JSON.
//!
//! `script_preview`               fetch live with the configured feed
//! `script_preview <feed.xml>`    parse a saved Google News RSS file instead

use anyhow::Context;
use techspace_shorts::config::FeedConfig;
use techspace_shorts::ingest::providers::GoogleNewsProvider;
use techspace_shorts::ingest::types::NewsProvider;
use techspace_shorts::{build_script_bundle, NewsFeed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let cfg = FeedConfig::load_default()?;
    let feed = match std::env::args().nth(1) {
        Some(path) => {
            let xml = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
            let provider: Box<dyn NewsProvider> =
                Box::new(GoogleNewsProvider::from_fixture_str("file", &xml));
            NewsFeed::new(
                vec![provider],
                cfg.max_age_hours,
                cfg.max_items,
                cfg.title_similarity,
            )
        }
        None => NewsFeed::from_config(&cfg)?,
    };

    let items = feed.fetch_latest_news().await;
    let bundle = build_script_bundle(&items);
    println!("{}", serde_json::to_string_pretty(&bundle)?);
    eprintln!(
        "{} stories, narration {} words",
        items.len(),
        techspace_shorts::script::word_count(&bundle.narration)
    );
    Ok(())
}
