//! render.rs — the single HTML page: script bundle on top, headline rundown below.

use chrono::{DateTime, Utc};
use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};
use std::fmt::Write as _;

use crate::ingest::collapse_whitespace;
use crate::ingest::types::NewsItem;
use crate::script::ScriptBundle;

pub const SNIPPET_MAX_CHARS: usize = 240;
pub const SNIPPET_FALLBACK: &str =
    "Fresh development with limited public details. Highlight key facts in narration.";

pub const PAGE_TITLE: &str = "TechSpace AI | Daily Tech & Space Shorts";
const PAGE_DESCRIPTION: &str =
    "Autonomous AI news curator crafting YouTube Shorts about the latest in technology and space.";

const TIME_FORMAT: &str = "%b %-d, %-I:%M %p UTC";

/// Collapse whitespace, trim, cap at 240 chars (237 + "..."); empty → `fallback`.
pub fn summarize_snippet(snippet: &str, fallback: &str) -> String {
    let cleaned = collapse_whitespace(snippet);
    if cleaned.is_empty() {
        return fallback.to_string();
    }
    if cleaned.chars().count() <= SNIPPET_MAX_CHARS {
        return cleaned;
    }
    let head: String = cleaned.chars().take(SNIPPET_MAX_CHARS - 3).collect();
    format!("{}...", head.trim_end())
}

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(TIME_FORMAT).to_string()
}

const STYLE: &str = r#"
:root { --tech-blue: #1f4fff; --space-purple: #6f00b5; }
* { box-sizing: border-box; }
body { margin: 0; min-height: 100vh; background: #020617; color: #f1f5f9; font-family: system-ui, -apple-system, "Segoe UI", sans-serif; -webkit-font-smoothing: antialiased; }
main { max-width: 64rem; margin: 0 auto; padding: 2.5rem 1.5rem; display: flex; flex-direction: column; gap: 2rem; }
.hero { position: relative; overflow: hidden; border-radius: 1.5rem; padding: 2rem; background: rgba(15, 23, 42, .9); border: 1px solid transparent; background-clip: padding-box; box-shadow: 0 0 0 1px rgba(111, 0, 181, .6), 0 0 40px rgba(31, 79, 255, .25); }
.hero::after { content: ""; position: absolute; inset: 0 -20% 0 auto; width: 60%; transform: rotate(12deg); background: linear-gradient(135deg, rgba(31, 79, 255, .4), rgba(111, 0, 181, .4), rgba(236, 72, 153, .4)); filter: blur(64px); pointer-events: none; }
.brand { font-size: .875rem; font-weight: 600; text-transform: uppercase; letter-spacing: .4em; color: #f0abfc; }
h1 { font-size: 2.5rem; line-height: 1.15; margin: .75rem 0; }
.lede { max-width: 48rem; color: #cbd5e1; }
.updated { font-size: .75rem; text-transform: uppercase; letter-spacing: .35em; color: #94a3b8; }
.grid { display: grid; gap: 1.5rem; grid-template-columns: repeat(auto-fit, minmax(20rem, 1fr)); }
.card { border-radius: 1.5rem; border: 1px solid rgba(255, 255, 255, .05); background: rgba(15, 23, 42, .8); padding: 1.5rem; box-shadow: 0 20px 25px rgba(0, 0, 0, .3); }
.card h2 { font-size: 1.25rem; margin: 0; }
.hint { font-size: .875rem; color: #94a3b8; }
.well { border-radius: 1rem; border: 1px solid rgba(255, 255, 255, .1); background: rgba(2, 6, 23, .6); padding: 1rem 1.25rem; line-height: 1.6; }
h3.label { font-size: .875rem; text-transform: uppercase; letter-spacing: .05em; color: #94a3b8; margin: 1rem 0 .25rem; }
.tags { display: flex; flex-wrap: wrap; gap: .5rem; }
.tag { border-radius: 999px; border: 1px solid rgba(255, 255, 255, .1); background: rgba(2, 6, 23, .6); padding: .25rem .75rem; font-size: .75rem; }
.rundown-head { display: flex; align-items: center; justify-content: space-between; gap: 1rem; }
.count { border-radius: 999px; background: rgba(111, 0, 181, .3); padding: .25rem 1rem; font-size: .75rem; font-weight: 600; text-transform: uppercase; color: #f5d0fe; }
.stories { list-style: none; padding: 0; display: flex; flex-direction: column; gap: 1.5rem; }
.story-head, .story-foot { display: flex; flex-wrap: wrap; align-items: center; justify-content: space-between; gap: .75rem; }
.story h3 { margin: 0; font-size: 1.125rem; }
.source { border-radius: 999px; background: rgba(31, 79, 255, .2); padding: .25rem .75rem; font-size: .75rem; font-weight: 600; text-transform: uppercase; color: var(--tech-blue); }
.story p { font-size: .875rem; color: #cbd5e1; }
.story-foot { font-size: .75rem; color: #94a3b8; }
.story-foot a { border-radius: 999px; border: 1px solid rgba(31, 79, 255, .4); background: rgba(31, 79, 255, .1); padding: .25rem .75rem; color: var(--tech-blue); text-decoration: none; }
.story-foot a:hover { background: rgba(31, 79, 255, .2); }
"#;

/// Full HTML document for one request. Every dynamic string is escaped.
pub fn render_page(items: &[NewsItem], bundle: &ScriptBundle, updated_at: DateTime<Utc>) -> String {
    let mut html = String::with_capacity(16 * 1024);

    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{}</title>\n<meta name=\"description\" content=\"{}\">\n<style>{}</style>\n\
         </head>\n<body>\n<main>\n",
        text(PAGE_TITLE),
        attr(PAGE_DESCRIPTION),
        STYLE
    );

    let _ = write!(
        html,
        "<header class=\"hero\">\n<span class=\"brand\">TechSpace AI</span>\n\
         <h1>Daily Tech &amp; Space News Short</h1>\n\
         <p class=\"lede\">Autonomous briefing compiled from Google News within the past 24 hours. \
         Perfect for a punchy YouTube Short under 60 seconds.</p>\n\
         <p class=\"updated\">Updated {}</p>\n</header>\n",
        text(&format_timestamp(updated_at))
    );

    html.push_str("<section class=\"grid\">\n");
    render_narration(&mut html, bundle);
    render_toolkit(&mut html, bundle);
    html.push_str("</section>\n");

    render_rundown(&mut html, items);

    html.push_str("</main>\n</body>\n</html>\n");
    html
}

fn render_narration(html: &mut String, bundle: &ScriptBundle) {
    let _ = write!(
        html,
        "<article class=\"card\">\n<h2>Narration Script</h2>\n\
         <p class=\"hint\">Ready to record. Runs under a minute at an energetic 150\u{2013}160 wpm pace.</p>\n\
         <div class=\"well\">{}</div>\n</article>\n",
        text(&bundle.narration)
    );
}

fn render_toolkit(html: &mut String, bundle: &ScriptBundle) {
    html.push_str(
        "<article class=\"card\">\n<h2>Publishing Toolkit</h2>\n\
         <p class=\"hint\">Drop these into YouTube for title, hashtags, and visual direction.</p>\n",
    );

    let _ = write!(
        html,
        "<h3 class=\"label\">Title</h3>\n<p class=\"well\">{}</p>\n",
        text(&bundle.title)
    );

    html.push_str("<h3 class=\"label\">Hashtags</h3>\n<p class=\"tags\">");
    for tag in &bundle.hashtags {
        let _ = write!(html, "<span class=\"tag\">{}</span>", text(tag));
    }
    html.push_str("</p>\n");

    let _ = write!(
        html,
        "<h3 class=\"label\">Thumbnail Text</h3>\n<p class=\"well\">{}</p>\n",
        text(&bundle.thumbnail_text)
    );

    html.push_str("<h3 class=\"label\">Visual Prompts</h3>\n<ul>\n");
    for prompt in &bundle.visual_prompts {
        let _ = writeln!(html, "<li>{}</li>", text(prompt));
    }
    html.push_str("</ul>\n</article>\n");
}

fn render_rundown(html: &mut String, items: &[NewsItem]) {
    let badge = match items.len() {
        0 => "No fresh feeds".to_string(),
        1 => "1 story".to_string(),
        n => format!("{n} stories"),
    };
    let _ = write!(
        html,
        "<section class=\"card\">\n<div class=\"rundown-head\">\n<h2>Headline Rundown</h2>\n\
         <span class=\"count\">{}</span>\n</div>\n",
        text(&badge)
    );

    if items.is_empty() {
        html.push_str(
            "<p class=\"hint\">Nothing breaking in the last 24 hours that matched the filters. \
             Check back soon!</p>\n</section>\n",
        );
        return;
    }

    html.push_str("<ul class=\"stories\">\n");
    for it in items {
        let _ = write!(
            html,
            "<li class=\"story well\">\n<div class=\"story-head\">\n<h3>{title}</h3>\n\
             <span class=\"source\">{source}</span>\n</div>\n<p>{snippet}</p>\n\
             <div class=\"story-foot\">\n<span>Published {published}</span>\n\
             <a href=\"{link}\" target=\"_blank\" rel=\"noopener noreferrer\">Source on Google News</a>\n\
             </div>\n</li>\n",
            title = text(&it.title),
            source = text(&it.source),
            snippet = text(&summarize_snippet(&it.snippet, SNIPPET_FALLBACK)),
            published = text(&format_timestamp(it.published_at)),
            link = attr(&it.link),
        );
    }
    html.push_str("</ul>\n</section>\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::build_script_bundle;
    use chrono::TimeZone;

    fn updated() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 17, 15, 4, 0).unwrap()
    }

    #[test]
    fn snippet_truncates_to_240_with_ellipsis() {
        let s = "x".repeat(300);
        let out = summarize_snippet(&s, SNIPPET_FALLBACK);
        assert_eq!(out.chars().count(), 240);
        assert!(out.ends_with("..."));
        assert_eq!(&out[..237], &s[..237]);
    }

    #[test]
    fn snippet_of_exactly_240_is_unchanged() {
        let s = "y".repeat(240);
        assert_eq!(summarize_snippet(&s, SNIPPET_FALLBACK), s);
    }

    #[test]
    fn empty_or_blank_snippet_uses_fallback() {
        assert_eq!(summarize_snippet("", SNIPPET_FALLBACK), SNIPPET_FALLBACK);
        assert_eq!(summarize_snippet(" \n\t ", "custom"), "custom");
    }

    #[test]
    fn snippet_collapses_whitespace_and_trims_before_ellipsis() {
        assert_eq!(summarize_snippet("  a \n\n b\tc  ", SNIPPET_FALLBACK), "a b c");
        // word boundary right before the cut: trailing space is dropped
        let s = format!("{} {}", "z".repeat(236), "w".repeat(50));
        let out = summarize_snippet(&s, SNIPPET_FALLBACK);
        assert_eq!(out, format!("{}...", "z".repeat(236)));
    }

    #[test]
    fn timestamp_format() {
        assert_eq!(format_timestamp(updated()), "Oct 17, 3:04 PM UTC");
    }

    #[test]
    fn page_escapes_feed_text() {
        let items = vec![NewsItem {
            title: "<script>alert(1)</script> & rockets".into(),
            source: "Evil \"Quotes\"".into(),
            link: "https://example.com/?a=1&b=\"2\"".into(),
            snippet: String::new(),
            published_at: updated(),
        }];
        let bundle = build_script_bundle(&items);
        let html = render_page(&items, &bundle, updated());
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt; &amp; rockets"));
        assert!(html.contains("href=\"https://example.com/?a=1&amp;b=&quot;2&quot;\""));
        assert!(html.contains(SNIPPET_FALLBACK));
        assert!(html.contains("1 story<"));
    }

    #[test]
    fn empty_page_shows_quiet_state() {
        let bundle = build_script_bundle(&[]);
        let html = render_page(&[], &bundle, updated());
        assert!(html.contains("No fresh feeds"));
        assert!(html.contains("Nothing breaking in the last 24 hours"));
        assert!(html.contains("Updated Oct 17, 3:04 PM UTC"));
        assert!(html.contains(PAGE_TITLE.replace('&', "&amp;").as_str()));
    }
}
