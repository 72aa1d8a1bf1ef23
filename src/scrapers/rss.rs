//! Minimal RSS 2.0 item reader for news feeds.

use chrono::{DateTime, Utc};
use regex::Regex;
use scraper::Html;
use serde::Serialize;
use std::sync::OnceLock;

/// One `<item>` of a feed with markup removed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RssItem {
    pub title: String,
    pub link: String,
    pub description: String,
    pub pub_date: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
}

struct FeedPatterns {
    item: Regex,
    cdata: Regex,
    enclosure: Regex,
    img: Regex,
    numeric_entity: Regex,
}

fn patterns() -> &'static FeedPatterns {
    static PATTERNS: OnceLock<FeedPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| FeedPatterns {
        item: Regex::new(r"(?s)<item\b[^>]*>(.*?)</item>").expect("valid pattern"),
        cdata: Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>").expect("valid pattern"),
        enclosure: Regex::new(r#"<enclosure\b[^>]*\burl\s*=\s*["']([^"']+)["']"#).expect("valid pattern"),
        img: Regex::new(r#"(?i)<img\b[^>]*\bsrc\s*=\s*["']([^"']+)["']"#).expect("valid pattern"),
        numeric_entity: Regex::new(r"&#(x?)([0-9a-fA-F]+);").expect("valid pattern"),
    })
}

/// Content of the first `<tag>` in `block`, CDATA unwrapped and entities decoded
fn tag_content(block: &str, tag: &str) -> Option<String> {
    let open = format!("<{}", tag);
    let close = format!("</{}>", tag);

    let mut search_from = 0;
    let start = loop {
        let pos = search_from + block[search_from..].find(&open)?;
        let after = &block[pos + open.len()..];
        // Skip longer tag names sharing the prefix, e.g. <linkAlt>
        match after.chars().next() {
            Some('>') | Some(' ') | Some('\t') | Some('\n') => break pos,
            _ => search_from = pos + open.len(),
        }
    };
    let body_start = start + block[start..].find('>')? + 1;
    let body_end = body_start + block[body_start..].find(&close)?;
    let raw = &block[body_start..body_end];

    let unwrapped = match patterns().cdata.captures(raw) {
        Some(caps) => caps.get(1).map(|m| m.as_str()).unwrap_or_default().to_string(),
        None => decode_entities(raw),
    };
    Some(unwrapped.trim().to_string())
}

/// Decode the XML/HTML entities that commonly appear in feeds
pub fn decode_entities(text: &str) -> String {
    let numeric = patterns().numeric_entity.replace_all(text, |caps: &regex::Captures<'_>| {
        let radix = if caps[1].is_empty() { 10 } else { 16 };
        u32::from_str_radix(&caps[2], radix)
            .ok()
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_default()
    });
    numeric
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Plain text of an HTML fragment, whitespace collapsed
pub fn strip_html(fragment: &str) -> String {
    let doc = Html::parse_fragment(fragment);
    doc.root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse every `<item>` of an RSS document. Items without a title or link are skipped.
pub fn parse_feed(xml: &str) -> Vec<RssItem> {
    let p = patterns();
    p.item
        .captures_iter(xml)
        .filter_map(|caps| {
            let block = caps.get(1)?.as_str();
            let title = strip_html(&tag_content(block, "title")?);
            let link = tag_content(block, "link").or_else(|| tag_content(block, "guid"))?;
            if title.is_empty() || link.is_empty() {
                return None;
            }

            let description_html = tag_content(block, "description").unwrap_or_default();
            let image_url = p
                .enclosure
                .captures(block)
                .or_else(|| p.img.captures(&description_html))
                .and_then(|c| c.get(1))
                .map(|m| decode_entities(m.as_str()));

            Some(RssItem {
                title,
                link,
                description: strip_html(&description_html),
                pub_date: tag_content(block, "pubDate").and_then(|date| {
                    DateTime::parse_from_rfc2822(date.trim())
                        .ok()
                        .map(|dt| dt.with_timezone(&Utc))
                }),
                image_url,
            })
        })
        .collect()
}
