//! DOM-selector extraction for listing pages.

use crate::models::RawListing;
use crate::scrapers::types::ListingSelectors;
use anyhow::{anyhow, Result};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;
use tracing::{debug, info};
use url::Url;

const MAX_PAGE_IMAGES: usize = 10;
const MAX_PAGE_PARAGRAPHS: usize = 20;

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid selector {:?}: {}", css, e))
}

fn background_image() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"background-image:\s*url\(['"]?([^'")]+)['"]?\)"#).expect("valid pattern")
    })
}

/// Resolve `href` against the page URL. Unresolvable links are dropped.
pub fn absolute_url(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }
    Url::parse(base)
        .and_then(|base| base.join(href))
        .or_else(|_| Url::parse(href))
        .ok()
        .map(|url| url.to_string())
}

/// Text of an element as trimmed, non-empty lines
fn element_lines(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn image_urls(element: ElementRef<'_>, image: &Selector, base_url: &str) -> Vec<String> {
    let mut images = Vec::new();
    for img in element.select(image) {
        let value = img.value();
        let candidate = value
            .attr("src")
            .or_else(|| value.attr("data-src"))
            .map(str::to_string)
            .or_else(|| {
                value
                    .attr("style")
                    .and_then(|style| background_image().captures(style))
                    .and_then(|caps| caps.get(1))
                    .map(|m| m.as_str().to_string())
            });

        if let Some(url) = candidate.and_then(|src| absolute_url(base_url, &src)) {
            if url.starts_with("http") && !images.contains(&url) {
                images.push(url);
            }
        }
    }
    images
}

/// Split a listing page into one `RawListing` per card
pub fn parse_listing_cards(
    html: &str,
    base_url: &str,
    selectors: &ListingSelectors,
) -> Result<Vec<RawListing>> {
    let card = selector(&selectors.card)?;
    let text = selector(&selectors.text)?;
    let link = selector(&selectors.link)?;
    let image = selector(&selectors.image)?;

    let document = Html::parse_document(html);
    let mut listings = Vec::new();

    for element in document.select(&card) {
        let body = match element.select(&text).next() {
            Some(text_el) => element_lines(text_el),
            None => element_lines(element),
        };
        if body.is_empty() {
            continue;
        }

        let url = element
            .select(&link)
            .next()
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| absolute_url(base_url, href));

        // Telegram previews carry "channel/123" on the message element
        let external_id = element.value().attr("data-post").map(str::to_string);

        listings.push(RawListing {
            text: body,
            url,
            external_id,
            images: image_urls(element, &image, base_url),
        });
    }

    info!("Found {} listing cards on {}", listings.len(), base_url);
    Ok(listings)
}

fn meta_content(document: &Html, css: &str) -> Option<String> {
    let sel = selector(css).ok()?;
    document
        .select(&sel)
        .filter_map(|m| m.value().attr("content"))
        .map(str::trim)
        .find(|c| !c.is_empty())
        .map(str::to_string)
}

fn first_text(document: &Html, css: &str) -> Option<String> {
    let sel = selector(css).ok()?;
    document
        .select(&sel)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .find(|t| !t.is_empty())
}

/// Read a single property page: Open Graph data, headline and body paragraphs
pub fn parse_single_page(html: &str, url: &str) -> Result<RawListing> {
    let document = Html::parse_document(html);

    let title = meta_content(&document, "meta[property='og:title']")
        .or_else(|| first_text(&document, "h1"))
        .or_else(|| first_text(&document, "title"))
        .unwrap_or_default();

    let description = meta_content(&document, "meta[property='og:description']")
        .or_else(|| meta_content(&document, "meta[name='description']"));

    let paragraph = selector("p")?;
    let paragraphs: Vec<String> = document
        .select(&paragraph)
        .map(|p| p.text().collect::<String>().trim().to_string())
        .filter(|p| !p.is_empty())
        .take(MAX_PAGE_PARAGRAPHS)
        .collect();

    let mut images: Vec<String> = meta_content(&document, "meta[property='og:image']")
        .and_then(|src| absolute_url(url, &src))
        .into_iter()
        .collect();
    let img = selector("img")?;
    for src in image_urls(document.root_element(), &img, url) {
        if images.len() >= MAX_PAGE_IMAGES {
            break;
        }
        if !images.contains(&src) {
            images.push(src);
        }
    }

    let text = std::iter::once(title)
        .chain(description)
        .chain(paragraphs)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    debug!("Single page {} yielded {} chars and {} images", url, text.len(), images.len());

    Ok(RawListing {
        text,
        url: Some(url.to_string()),
        external_id: None,
        images,
    })
}
