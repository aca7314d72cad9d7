// src/config/feed.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_FEED_CONFIG_PATH: &str = "config/feed.toml";
const FALLBACK_JSON_PATH: &str = "config/feed.json";

pub const ENV_FEED_CONFIG_PATH: &str = "FEED_CONFIG_PATH";
pub const ENV_FEED_MAX_ITEMS: &str = "FEED_MAX_ITEMS";

const MAX_ITEMS_CAP: usize = 50;
const MAX_AGE_HOURS_CAP: u32 = 24 * 7;

fn default_endpoint() -> String {
    "https://news.google.com/rss/search".to_string()
}
fn default_language() -> String {
    "en-US".to_string()
}
fn default_region() -> String {
    "US".to_string()
}
fn default_queries() -> Vec<TopicQuery> {
    vec![
        TopicQuery {
            name: "Technology".into(),
            query: "technology OR gadgets OR AI when:1d".into(),
        },
        TopicQuery {
            name: "Space".into(),
            query: "space OR NASA OR SpaceX OR rocket launch when:1d".into(),
        },
    ]
}
fn default_max_age_hours() -> u32 {
    24
}
fn default_max_items() -> usize {
    8
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_user_agent() -> String {
    concat!("techspace-shorts/", env!("CARGO_PKG_VERSION")).to_string()
}
fn default_title_similarity() -> f32 {
    0.90
}

/// One Google News search feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicQuery {
    pub name: String,
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// BCP-47 style, e.g. "en-US". The part before '-' becomes the `ceid` language.
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_queries")]
    pub queries: Vec<TopicQuery>,
    #[serde(default = "default_max_age_hours")]
    pub max_age_hours: u32,
    #[serde(default = "default_max_items")]
    pub max_items: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Normalized Levenshtein similarity at which two headlines count as the same story.
    #[serde(default = "default_title_similarity")]
    pub title_similarity: f32,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            language: default_language(),
            region: default_region(),
            queries: default_queries(),
            max_age_hours: default_max_age_hours(),
            max_items: default_max_items(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            title_similarity: default_title_similarity(),
        }
    }
}

impl FeedConfig {
    /// Load from an explicit path. Supports TOML or JSON formats.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading feed config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg = parse_config(&content, ext.as_str())
            .with_context(|| format!("parsing feed config {}", path.display()))?;
        Ok(cfg.sanitized())
    }

    /// Load using env var + fallbacks:
    /// 1) $FEED_CONFIG_PATH
    /// 2) config/feed.toml
    /// 3) config/feed.json
    /// 4) built-in defaults
    ///
    /// `$FEED_MAX_ITEMS` is applied on top of whichever source won.
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_FEED_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("FEED_CONFIG_PATH points to non-existent path"));
            }
            Self::load_from_file(&pb)?
        } else if Path::new(DEFAULT_FEED_CONFIG_PATH).exists() {
            Self::load_from_file(DEFAULT_FEED_CONFIG_PATH)?
        } else if Path::new(FALLBACK_JSON_PATH).exists() {
            Self::load_from_file(FALLBACK_JSON_PATH)?
        } else {
            Self::default()
        };

        if let Some(n) = parse_max_items_env(std::env::var(ENV_FEED_MAX_ITEMS).ok()) {
            cfg.max_items = n;
        }
        Ok(cfg.sanitized())
    }

    /// `ceid` parameter Google News expects, e.g. "US:en".
    pub fn ceid(&self) -> String {
        let lang = self.language.split('-').next().unwrap_or("en");
        format!("{}:{}", self.region, lang)
    }

    fn sanitized(mut self) -> Self {
        if self.max_age_hours == 0 || self.max_age_hours > MAX_AGE_HOURS_CAP {
            self.max_age_hours = default_max_age_hours();
        }
        self.max_items = self.max_items.clamp(1, MAX_ITEMS_CAP);
        if !self.title_similarity.is_finite() {
            self.title_similarity = default_title_similarity();
        }
        self.title_similarity = self.title_similarity.clamp(0.0, 1.0);
        if self.endpoint.trim().is_empty() {
            self.endpoint = default_endpoint();
        }
        if self.user_agent.trim().is_empty() {
            self.user_agent = default_user_agent();
        }
        self.queries = clean_queries(self.queries);
        if self.queries.is_empty() {
            self.queries = default_queries();
        }
        self
    }
}

fn parse_max_items_env(raw: Option<String>) -> Option<usize> {
    raw.and_then(|s| s.trim().parse::<usize>().ok())
}

fn parse_config(s: &str, hint_ext: &str) -> Result<FeedConfig> {
    match hint_ext {
        "toml" => return toml::from_str(s).map_err(Into::into),
        "json" => return serde_json::from_str(s).map_err(Into::into),
        _ => {}
    }
    if let Ok(v) = serde_json::from_str(s) {
        return Ok(v);
    }
    toml::from_str(s).map_err(|e| anyhow!("unsupported feed config format: {e}"))
}

fn clean_queries(items: Vec<TopicQuery>) -> Vec<TopicQuery> {
    use std::collections::HashSet;
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(items.len());
    for it in items {
        let query = it.query.trim().to_string();
        if query.is_empty() || !seen.insert(query.to_ascii_lowercase()) {
            continue;
        }
        let name = match it.name.trim() {
            "" => query.clone(),
            n => n.to_string(),
        };
        out.push(TopicQuery { name, query });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_and_json_parse_with_defaults() {
        let toml = r#"
max_items = 5
[[queries]]
name = "Rockets"
query = "rocket launch when:1d"
"#;
        let cfg = parse_config(toml, "toml").unwrap().sanitized();
        assert_eq!(cfg.max_items, 5);
        assert_eq!(cfg.max_age_hours, 24);
        assert_eq!(cfg.queries.len(), 1);
        assert_eq!(cfg.queries[0].name, "Rockets");

        let json = r#"{"language":"en-GB","region":"GB"}"#;
        let cfg = parse_config(json, "").unwrap().sanitized();
        assert_eq!(cfg.ceid(), "GB:en");
        assert_eq!(cfg.queries, default_queries());
    }

    #[test]
    fn sanitize_clamps_and_dedups() {
        let cfg = FeedConfig {
            max_items: 500,
            max_age_hours: 0,
            title_similarity: 3.0,
            queries: vec![
                TopicQuery {
                    name: " ".into(),
                    query: " NASA ".into(),
                },
                TopicQuery {
                    name: "dup".into(),
                    query: "nasa".into(),
                },
                TopicQuery {
                    name: "empty".into(),
                    query: "".into(),
                },
            ],
            ..FeedConfig::default()
        }
        .sanitized();

        assert_eq!(cfg.max_items, MAX_ITEMS_CAP);
        assert_eq!(cfg.max_age_hours, 24);
        assert_eq!(cfg.title_similarity, 1.0);
        assert_eq!(
            cfg.queries,
            vec![TopicQuery {
                name: "NASA".into(),
                query: "NASA".into()
            }]
        );
    }

    #[test]
    fn max_items_env_parsing() {
        assert_eq!(parse_max_items_env(Some(" 12 ".into())), Some(12));
        assert_eq!(parse_max_items_env(Some("lots".into())), None);
        assert_eq!(parse_max_items_env(None), None);
    }
}
