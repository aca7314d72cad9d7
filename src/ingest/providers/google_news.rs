// src/ingest/providers/google_news.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

use crate::config::{FeedConfig, TopicQuery};
use crate::ingest::normalize_text;
use crate::ingest::types::{NewsItem, NewsProvider};

/// Used when neither `<source>` nor a title suffix names the publisher.
pub const DEFAULT_SOURCE: &str = "Google News";

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    source: Option<Source>,
}

// <source url="https://www.space.com">Space.com</source>
#[derive(Debug, Deserialize)]
struct Source {
    #[serde(rename = "$text", default)]
    name: Option<String>,
}

fn parse_pub_date(ts: &str) -> Option<DateTime<Utc>> {
    let ts = ts.trim();
    OffsetDateTime::parse(ts, &Rfc2822)
        .ok()
        .and_then(|dt| DateTime::<Utc>::from_timestamp(dt.unix_timestamp(), dt.nanosecond()))
        // chrono also accepts obsolete zone names ("GMT", "EST", ...)
        .or_else(|| {
            DateTime::parse_from_rfc2822(ts)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        })
}

/// Google News search results for one topic query.
pub struct GoogleNewsProvider {
    name: String,
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        url: reqwest::Url,
        client: reqwest::Client,
    },
}

/// Build the RSS search URL for `query` with the configured locale.
pub fn search_url(cfg: &FeedConfig, query: &str) -> Result<reqwest::Url> {
    let ceid = cfg.ceid();
    reqwest::Url::parse_with_params(
        &cfg.endpoint,
        &[
            ("q", query),
            ("hl", cfg.language.as_str()),
            ("gl", cfg.region.as_str()),
            ("ceid", ceid.as_str()),
        ],
    )
    .with_context(|| format!("building google news url from {}", cfg.endpoint))
}

impl GoogleNewsProvider {
    pub fn from_fixture_str(name: &str, xml: &str) -> Self {
        Self {
            name: name.to_string(),
            mode: Mode::Fixture(xml.to_string()),
        }
    }

    pub fn for_topic(cfg: &FeedConfig, topic: &TopicQuery, client: reqwest::Client) -> Result<Self> {
        let url = search_url(cfg, &topic.query)?;
        Ok(Self {
            name: topic.name.clone(),
            mode: Mode::Http { url, client },
        })
    }

    /// Remote URL in http mode, `None` for fixtures.
    pub fn url(&self) -> Option<&str> {
        match &self.mode {
            Mode::Fixture(_) => None,
            Mode::Http { url, .. } => Some(url.as_str()),
        }
    }

    pub fn parse_items_from_str(s: &str) -> Result<Vec<NewsItem>> {
        let t0 = std::time::Instant::now();
        let xml_clean = scrub_html_entities_for_xml(s);
        let rss: Rss = from_str(&xml_clean).context("parsing google news rss xml")?;

        let mut out = Vec::with_capacity(rss.channel.item.len());
        for it in rss.channel.item {
            let Some(link) = it.link.map(|l| l.trim().to_string()).filter(|l| !l.is_empty())
            else {
                continue;
            };
            let Some(published_at) = it.pub_date.as_deref().and_then(parse_pub_date) else {
                tracing::debug!(%link, "skipping item without a usable pubDate");
                continue;
            };

            let raw_title = normalize_text(it.title.as_deref().unwrap_or_default());
            let tagged_source = it
                .source
                .and_then(|s| s.name)
                .map(|s| normalize_text(&s))
                .filter(|s| !s.is_empty());
            let (title, source) = split_publisher(&raw_title, tagged_source);
            if title.is_empty() {
                continue;
            }

            let description = normalize_text(it.description.as_deref().unwrap_or_default());
            let snippet =
                strip_headline_echo(&description, &[raw_title.as_str(), title.as_str()], &source);

            out.push(NewsItem {
                title,
                source,
                link,
                snippet,
                published_at,
            });
        }

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("feed_parse_ms").record(ms);
        counter!("feed_items_parsed_total").increment(out.len() as u64);
        Ok(out)
    }
}

#[async_trait]
impl NewsProvider for GoogleNewsProvider {
    async fn fetch_latest(&self) -> Result<Vec<NewsItem>> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse_items_from_str(s),
            Mode::Http { url, client } => {
                tracing::info!(provider = %self.name, %url, "fetching google news rss");
                let body = client
                    .get(url.clone())
                    .send()
                    .await
                    .and_then(|resp| resp.error_for_status())
                    .with_context(|| format!("google news get() for {}", self.name))?
                    .text()
                    .await
                    .context("google news .text()")?;
                Self::parse_items_from_str(&body)
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Google News titles read "Headline - Publisher". Prefer the `<source>` element,
/// fall back to the suffix, then to [`DEFAULT_SOURCE`].
fn split_publisher(raw_title: &str, tagged_source: Option<String>) -> (String, String) {
    match tagged_source {
        Some(source) => {
            let suffix = format!(" - {source}");
            let title = raw_title.strip_suffix(&suffix).unwrap_or(raw_title);
            (title.trim().to_string(), source)
        }
        None => match raw_title.rsplit_once(" - ") {
            Some((head, publisher)) if !head.trim().is_empty() && !publisher.trim().is_empty() => {
                (head.trim().to_string(), publisher.trim().to_string())
            }
            _ => (raw_title.to_string(), DEFAULT_SOURCE.to_string()),
        },
    }
}

/// Descriptions repeat the headline and publisher; drop the leading headline echo
/// and a publisher name that is all that remains.
fn strip_headline_echo(description: &str, headlines: &[&str], source: &str) -> String {
    let mut rest = description.trim();
    for headline in headlines.iter().copied() {
        if headline.is_empty() {
            continue;
        }
        if let Some(r) = rest.strip_prefix(headline) {
            rest = r.trim_start_matches(|c: char| {
                c.is_whitespace() || matches!(c, '-' | '|' | ':' | '\u{2013}' | '\u{2014}')
            });
        }
    }
    if rest.eq_ignore_ascii_case(source) {
        return String::new();
    }
    rest.trim().to_string()
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
