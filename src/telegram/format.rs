//! HTML message templates. Every dynamic value is escaped.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use crate::models::{DistrictReview, NewsArticle, PropertyListing};

/// Captions above this length are rejected by `sendPhoto`
pub const MAX_CAPTION_CHARS: usize = 1024;

const MAX_TEASER_CHARS: usize = 300;
const MAX_ARTICLE_BODY_CHARS: usize = 700;
const MAX_TITLE_CHARS: usize = 200;
const MAX_LINE_CHARS: usize = 120;

fn push_escaped(out: &mut String, c: char) {
    match c {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        _ => out.push(c),
    }
}

pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        push_escaped(&mut escaped, c);
    }
    escaped
}

/// Escape `text` so the result is at most `max_chars` long. Whole source
/// characters are dropped from the end, so an entity is never split.
pub fn escape_within(text: &str, max_chars: usize) -> String {
    let escaped = escape(text);
    if escaped.chars().count() <= max_chars {
        return escaped;
    }
    if max_chars == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    let mut piece = String::new();
    for c in text.chars() {
        piece.clear();
        push_escaped(&mut piece, c);
        let len = piece.chars().count();
        // one char stays free for the ellipsis
        if used + len > max_chars - 1 {
            break;
        }
        out.push_str(&piece);
        used += len;
    }
    format!("{}…", out.trim_end())
}

/// Cut at a char boundary, adding an ellipsis when shortened
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", cut.trim_end())
}

/// `1234567.0` -> `"1,234,567"`
pub fn group_thousands(value: f64) -> String {
    let digits = (value.round() as i64).abs().to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if value < 0.0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

fn price_line(listing: &PropertyListing) -> String {
    match listing.price {
        Some(price) => format!(
            "{} {}",
            group_thousands(price),
            listing.currency.as_deref().unwrap_or("AED")
        ),
        None => "Price on request".to_string(),
    }
}

pub fn welcome(name: &str) -> String {
    format!(
        "👋 Welcome, {}!\n\n\
         I help you find property in Dubai and Ho Chi Minh City.\n\n\
         /search &lt;query&gt; - find listings\n\
         /latest - newest listings\n\
         /news - real-estate news\n\
         /district &lt;name&gt; - neighbourhood review\n\
         /help - all commands\n\n\
         Or just ask me anything about buying or renting.",
        escape(name)
    )
}

pub fn help() -> String {
    "<b>Commands</b>\n\n\
     /search &lt;query&gt; - search listings, e.g. <code>/search 2 bed Dubai Marina</code>\n\
     /latest - the five newest listings\n\
     /news - latest translated market news\n\
     /district &lt;name&gt; - review of a neighbourhood\n\
     /help - this message\n\n\
     Any other message goes to the AI assistant."
        .to_string()
}

/// Full card for one listing, used as a photo caption or message
pub fn listing_card(listing: &PropertyListing) -> String {
    let mut lines = vec![format!("🏠 <b>{}</b>", escape_within(&listing.title, MAX_TITLE_CHARS))];
    lines.push(format!("💰 {}", price_line(listing)));

    let mut facts = Vec::new();
    if let Some(kind) = &listing.property_type {
        facts.push(escape(kind));
    }
    if let Some(purpose) = &listing.purpose {
        facts.push(format!("for {}", escape(purpose)));
    }
    if let Some(beds) = listing.bedrooms {
        facts.push(format!("{} bed", beds));
    }
    if let Some(baths) = listing.bathrooms {
        facts.push(format!("{} bath", baths));
    }
    if let Some(area) = listing.area_sqft {
        facts.push(format!("{} sqft", group_thousands(area)));
    }
    if !facts.is_empty() {
        lines.push(format!("📐 {}", facts.join(" · ")));
    }

    let place: Vec<&str> = [listing.location_area.as_deref(), listing.city.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    if !place.is_empty() {
        lines.push(format!("📍 {}", escape_within(&place.join(", "), MAX_LINE_CHARS)));
    }
    if let Some(phone) = &listing.agent_phone {
        lines.push(format!("📞 {}", escape_within(phone, MAX_LINE_CHARS)));
    }

    let mut card = lines.join("\n");
    if let Some(description) = &listing.description {
        let room = MAX_CAPTION_CHARS
            .saturating_sub(card.chars().count() + 2)
            .min(MAX_TEASER_CHARS);
        let teaser = escape_within(description, room);
        if !teaser.is_empty() {
            card.push_str("\n\n");
            card.push_str(&teaser);
        }
    }
    card
}

/// One button per listing; the callback carries the listing's primary key
pub fn listing_buttons(listings: &[PropertyListing]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(listings.iter().map(|listing| {
        vec![InlineKeyboardButton::callback(
            truncate(&format!("{} · {}", listing.title, price_line(listing)), 60),
            format!("prop:{}", listing.id),
        )]
    }))
}

pub fn search_results(query: &str, listings: &[PropertyListing]) -> String {
    if listings.is_empty() {
        return format!(
            "😕 Nothing found for <b>{}</b>.\nTry a district name or fewer words.",
            escape(query)
        );
    }
    format!(
        "🔎 Found {} listing{} for <b>{}</b>. Tap one for details:",
        listings.len(),
        if listings.len() == 1 { "" } else { "s" },
        escape(query)
    )
}

/// Channel post for a translated article. Title, link and markup are laid
/// out first; the body gets whatever room is left under the caption limit.
pub fn article_post(article: &NewsArticle) -> String {
    let title = format!("📰 <b>{}</b>", escape_within(article.display_title(), MAX_TITLE_CHARS));
    let link = format!(
        "<a href=\"{}\">Read the original</a>",
        escape(&article.original_url)
    );

    let room = MAX_CAPTION_CHARS
        .saturating_sub(title.chars().count() + link.chars().count() + 4)
        .min(MAX_ARTICLE_BODY_CHARS);
    let body = escape_within(article.display_content(), room);

    if body.is_empty() {
        format!("{}\n\n{}", title, link)
    } else {
        format!("{}\n\n{}\n\n{}", title, body, link)
    }
}

pub fn news_digest(articles: &[NewsArticle]) -> String {
    if articles.is_empty() {
        return "No news yet. Check back later.".to_string();
    }
    let items: Vec<String> = articles
        .iter()
        .map(|article| {
            format!(
                "• <a href=\"{}\">{}</a>",
                escape(&article.original_url),
                escape(article.display_title())
            )
        })
        .collect();
    format!("📰 <b>Real-estate news</b>\n\n{}", items.join("\n"))
}

pub fn district_review(review: &DistrictReview) -> String {
    let mut lines = vec![format!("🏙 <b>{}</b>", escape(&review.district_name))];
    if let Some(city) = &review.city {
        lines[0].push_str(&format!(", {}", escape(city)));
    }
    if let Some(rating) = review.rating {
        lines.push(format!("⭐ {:.1}/5", rating));
    }
    if let Some(price) = review.average_price_sqft {
        lines.push(format!("💰 ~{} per sqft", group_thousands(price)));
    }
    if let Some(summary) = &review.summary {
        lines.push(String::new());
        lines.push(escape(summary));
    }
    for (label, items) in [("👍", &review.pros), ("👎", &review.cons)] {
        if let Some(items) = items.as_ref().filter(|items| !items.is_empty()) {
            lines.push(format!("{} {}", label, escape(&items.join(", "))));
        }
    }
    lines.join("\n")
}

pub fn assistant_fallback() -> String {
    "🤖 The assistant is unavailable right now.\n\
     Try /search &lt;query&gt; to browse listings, or /help for all commands."
        .to_string()
}
