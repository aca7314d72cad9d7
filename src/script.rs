//! script.rs — turns the day's headlines into a ready-to-record short.
//!
//! `build_script_bundle` is a pure function of its input: no clock, no randomness.
//! The narration is capped at [`NARRATION_WORD_BUDGET`] words so it reads in under
//! a minute at 150–160 wpm.

use metrics::counter;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::ingest::collapse_whitespace;
use crate::ingest::types::NewsItem;

/// Stories the narration and visual prompts walk through.
pub const MAX_HIGHLIGHTS: usize = 4;
/// Hard ceiling for narration length.
pub const NARRATION_WORD_BUDGET: usize = 160;
pub const MAX_HASHTAGS: usize = 8;
pub const TITLE_MAX_CHARS: usize = 100;
pub const THUMBNAIL_MAX_CHARS: usize = 28;

const HEADLINE_MAX_WORDS: usize = 20;
const DETAIL_MAX_WORDS: usize = 24;
const PROMPT_HEADLINE_MAX_WORDS: usize = 12;
const THUMBNAIL_MAX_WORDS: usize = 4;

const INTRO: &str = "Here's your tech and space briefing from the last 24 hours.";
const OUTRO: &str = "That's the rundown. Follow for tomorrow's briefing.";
const LEAD_INS: [&str; MAX_HIGHLIGHTS] = ["First up", "Next", "Meanwhile", "And finally"];

const BASE_HASHTAGS: [&str; 3] = ["#Shorts", "#TechNews", "#SpaceNews"];

/// (word-bounded, case-insensitive pattern, hashtag). Table order is tag priority per headline.
const TOPIC_TAGS: &[(&str, &str)] = &[
    ("spacex", "#SpaceX"),
    ("starship", "#Starship"),
    ("nasa", "#NASA"),
    ("esa", "#ESA"),
    ("rockets?|launch(?:es|ed)?", "#RocketLaunch"),
    ("mars", "#Mars"),
    ("moon|lunar|artemis", "#Moon"),
    ("satellites?|starlink", "#Satellites"),
    ("telescope|webb|hubble", "#Astronomy"),
    ("asteroids?|comets?", "#Asteroids"),
    ("openai|chatgpt", "#OpenAI"),
    ("ai|artificial intelligence", "#AI"),
    ("nvidia", "#Nvidia"),
    ("chips?|semiconductors?", "#Chips"),
    ("quantum", "#QuantumComputing"),
    ("robots?|robotics", "#Robotics"),
    ("apple|iphone", "#Apple"),
    ("google|android", "#Google"),
    ("microsoft|windows", "#Microsoft"),
    ("tesla|evs?|electric vehicles?", "#EV"),
    ("cyber\\w*|hack\\w*|breach\\w*|ransomware", "#CyberSecurity"),
];

const SPACE_PATTERN: &str = r"(?i)\b(space\w*|nasa|esa|rockets?|launch\w*|orbit\w*|mars|moon|lunar|artemis|satellites?|starlink|starship|astronauts?|telescope|webb|hubble|asteroids?|comets?|galax\w*|planet\w*|cosmic)\b";

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "have", "in", "into",
    "is", "it", "its", "of", "on", "or", "over", "says", "that", "the", "this", "to", "was",
    "will", "with",
];

const QUIET_NARRATION: &str = "No fresh tech or space stories landed in the last 24 hours. \
    The feeds are quiet right now, so check back soon for the next briefing.";
const QUIET_TITLE: &str = "Tech & Space News in 60s: Quiet Day Check-In";
const QUIET_THUMBNAIL: &str = "NO NEWS TODAY";
const QUIET_PROMPTS: [&str; 3] = [
    "Slow drift across a starfield with a \"No fresh stories today\" lower third",
    "Host-cam close-up explaining that no fresh headlines landed in the last 24 hours",
    "Animated calendar flip: no fresh coverage yet, next briefing tomorrow",
];
const FALLBACK_THUMBNAIL: &str = "TECH & SPACE NOW";

static TOPIC_REGEXES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    TOPIC_TAGS
        .iter()
        .map(|(pat, tag)| {
            let re = Regex::new(&format!(r"(?i)\b(?:{pat})\b")).expect("topic tag regex");
            (re, *tag)
        })
        .collect()
});

static RE_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(SPACE_PATTERN).expect("space regex"));

/// Everything needed to publish one short.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptBundle {
    pub narration: String,
    pub title: String,
    pub hashtags: Vec<String>,
    pub thumbnail_text: String,
    pub visual_prompts: Vec<String>,
}

pub fn build_script_bundle(items: &[NewsItem]) -> ScriptBundle {
    counter!("script_bundles_built_total").increment(1);

    if items.is_empty() {
        return quiet_day_bundle();
    }

    let highlights = &items[..items.len().min(MAX_HIGHLIGHTS)];
    let lead = &highlights[0];

    ScriptBundle {
        narration: narration(highlights, items.len()),
        title: title_for(lead),
        hashtags: hashtags(items),
        thumbnail_text: thumbnail_text(&lead.title),
        visual_prompts: highlights.iter().map(visual_prompt).collect(),
    }
}

fn quiet_day_bundle() -> ScriptBundle {
    let mut hashtags: Vec<String> = BASE_HASHTAGS.iter().map(|t| t.to_string()).collect();
    hashtags.push("#DailyBriefing".into());
    ScriptBundle {
        narration: QUIET_NARRATION.to_string(),
        title: QUIET_TITLE.to_string(),
        hashtags,
        thumbnail_text: QUIET_THUMBNAIL.to_string(),
        visual_prompts: QUIET_PROMPTS.iter().map(|p| p.to_string()).collect(),
    }
}

/// Stable content hash of a bundle (hex, 32 chars). Used as the HTTP `ETag`.
pub fn fingerprint(bundle: &ScriptBundle) -> String {
    use sha2::{Digest, Sha256};
    use std::fmt::Write as _;

    let mut hasher = Sha256::new();
    for field in [&bundle.narration, &bundle.title, &bundle.thumbnail_text] {
        hasher.update(field.as_bytes());
        hasher.update([0u8]);
    }
    for list in [&bundle.hashtags, &bundle.visual_prompts] {
        for entry in list {
            hasher.update(entry.as_bytes());
            hasher.update([0x1fu8]);
        }
        hasher.update([0u8]);
    }
    let digest = hasher.finalize();
    let mut out = String::with_capacity(32);
    for b in digest.iter().take(16) {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

pub fn word_count(s: &str) -> usize {
    s.split_whitespace().count()
}

fn is_space_story(text: &str) -> bool {
    RE_SPACE.is_match(text)
}

/// First `max` words; appends "..." when anything was cut.
fn clip_words(s: &str, max: usize) -> String {
    let words: Vec<&str> = s.split_whitespace().collect();
    if words.len() <= max {
        return words.join(" ");
    }
    format!("{}...", words[..max].join(" "))
}

fn clip_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let head: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", head.trim_end())
}

/// Ensure the text reads as one finished sentence.
fn as_sentence(s: &str) -> String {
    let s = s.trim().trim_end_matches("...").trim_end_matches([',', ';', ':', '-']).trim_end();
    if s.ends_with(['.', '!', '?']) {
        s.to_string()
    } else {
        format!("{s}.")
    }
}

/// First sentence of the snippet, or `None` when it adds nothing speakable.
fn lead_sentence(snippet: &str, headline: &str) -> Option<String> {
    let cleaned = collapse_whitespace(snippet);
    if cleaned.is_empty() || cleaned.eq_ignore_ascii_case(headline) {
        return None;
    }
    let first = match cleaned.find(". ") {
        Some(i) => &cleaned[..=i],
        None => cleaned.as_str(),
    };
    let bare = |s: &str| s.trim_end_matches(['.', '!', '?']).trim().to_lowercase();
    if bare(first) == bare(headline) {
        return None;
    }
    Some(as_sentence(&clip_words(first, DETAIL_MAX_WORDS)))
}

/// Reads out as many highlights as fit the budget; the rest are counted in the
/// overflow line.
fn narration(highlights: &[NewsItem], total: usize) -> String {
    (0..=highlights.len())
        .rev()
        .find_map(|spoken| narrate(&highlights[..spoken], total))
        .unwrap_or_else(|| format!("{INTRO} {OUTRO}"))
}

/// Narration for exactly `spoken` stories, or `None` when their headlines
/// overrun the budget. Details are only added with the words left over.
fn narrate(spoken: &[NewsItem], total: usize) -> Option<String> {
    let more = match total.saturating_sub(spoken.len()) {
        0 => None,
        1 => Some("Plus one more story in the description.".to_string()),
        n => Some(format!("Plus {n} more stories in the description.")),
    };

    let reserved = word_count(INTRO) + word_count(OUTRO) + more.as_deref().map_or(0, word_count);
    let mut budget = NARRATION_WORD_BUDGET.checked_sub(reserved)?;

    let lines: Vec<String> = spoken
        .iter()
        .enumerate()
        .map(|(i, it)| {
            let lead_in = if i > 0 && i + 1 == spoken.len() {
                LEAD_INS[MAX_HIGHLIGHTS - 1]
            } else {
                LEAD_INS[i.min(MAX_HIGHLIGHTS - 2)]
            };
            let headline = clip_words(&it.title, HEADLINE_MAX_WORDS);
            as_sentence(&format!("{lead_in}, {} reports: {headline}", it.source))
        })
        .collect();
    budget = budget.checked_sub(lines.iter().map(|l| word_count(l)).sum())?;

    let mut parts: Vec<String> = vec![INTRO.to_string()];
    for (line, it) in lines.into_iter().zip(spoken) {
        parts.push(line);
        if let Some(detail) = lead_sentence(&it.snippet, &it.title) {
            let n = word_count(&detail);
            if n <= budget {
                budget -= n;
                parts.push(detail);
            }
        }
    }
    if let Some(more) = more {
        parts.push(more);
    }
    parts.push(OUTRO.to_string());
    Some(parts.join(" "))
}

fn title_for(lead: &NewsItem) -> String {
    let hook = if is_space_story(&lead.title) {
        "Space News in 60s"
    } else {
        "Tech News in 60s"
    };
    clip_chars(&format!("{hook}: {}", lead.title), TITLE_MAX_CHARS)
}

fn hashtags(items: &[NewsItem]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out: Vec<String> = Vec::with_capacity(MAX_HASHTAGS);

    let mut push = |tag: &str, out: &mut Vec<String>| {
        if out.len() < MAX_HASHTAGS && seen.insert(tag.to_lowercase()) {
            out.push(tag.to_string());
        }
    };

    for tag in BASE_HASHTAGS {
        push(tag, &mut out);
    }
    for it in items {
        for (re, tag) in TOPIC_REGEXES.iter() {
            if re.is_match(&it.title) {
                push(*tag, &mut out);
            }
        }
    }
    out
}

fn thumbnail_text(headline: &str) -> String {
    let mut out = String::new();
    let mut words = 0usize;
    for raw in headline.split_whitespace() {
        let w = raw.trim_matches(|c: char| !c.is_alphanumeric());
        if w.is_empty() || STOP_WORDS.contains(&w.to_lowercase().as_str()) {
            continue;
        }
        let w = w.to_uppercase();
        let extra = if out.is_empty() { w.chars().count() } else { w.chars().count() + 1 };
        if out.chars().count() + extra > THUMBNAIL_MAX_CHARS {
            if out.is_empty() {
                out = w.chars().take(THUMBNAIL_MAX_CHARS).collect();
            }
            break;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&w);
        words += 1;
        if words == THUMBNAIL_MAX_WORDS {
            break;
        }
    }
    if out.is_empty() {
        FALLBACK_THUMBNAIL.to_string()
    } else {
        out
    }
}

fn visual_prompt(it: &NewsItem) -> String {
    let scene = if is_space_story(&it.title) {
        "Cinematic rocket and starfield b-roll"
    } else {
        "Sleek close-ups of glowing circuit boards and devices"
    };
    let headline = clip_words(&it.title, PROMPT_HEADLINE_MAX_WORDS);
    format!("{scene} with on-screen headline \"{headline}\", credited to {}", it.source)
}
