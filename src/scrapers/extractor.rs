use crate::models::{ExtractedProperty, RawListing};
use crate::scrapers::patterns::FieldRules;
use sha2::{Digest, Sha256};
use tracing::debug;

const MAX_TITLE_CHARS: usize = 120;

/// Turns free text into an `ExtractedProperty` using ordered field patterns
pub struct Extractor {
    rules: FieldRules,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(FieldRules::default())
    }
}

impl Extractor {
    pub fn new(rules: FieldRules) -> Self {
        Self { rules }
    }

    /// Extract a listing from raw text.
    ///
    /// Returns `None` when the text has no usable title, or carries neither a
    /// price nor any real-estate vocabulary. Such text is "not a listing" and
    /// is dropped without an error.
    pub fn extract(&self, raw: &RawListing) -> Option<ExtractedProperty> {
        let text = raw.text.trim();
        let title = title_line(text)?;

        let price = self.rules.price(text);
        if price.is_none() && !self.rules.has_keyword(text) {
            debug!(title = %title, "skipping text without price or real-estate keywords");
            return None;
        }

        let (area, area_unit) = match self.rules.area(text) {
            Some((value, unit)) => (Some(value), Some(unit)),
            None => (None, None),
        };

        let mut images = raw.images.clone();
        for url in self.rules.images(text) {
            if !images.contains(&url) {
                images.push(url);
            }
        }

        Some(ExtractedProperty {
            description: description_after_title(text),
            price,
            property_type: self.rules.property_type(text),
            purpose: self.rules.purpose(text),
            bedrooms: self.rules.bedrooms(text),
            bathrooms: self.rules.bathrooms(text),
            area,
            area_unit,
            location_area: self.rules.location(text),
            agent_name: self.rules.agent_name(text),
            agent_phone: self.rules.phone(text),
            images,
            source_url: raw.url.clone(),
            external_id: external_id(raw),
            raw_text: text.to_string(),
            title,
        })
    }
}

/// First line with letters in it, without leading emoji or bullets
fn title_line(text: &str) -> Option<String> {
    text.lines()
        .map(|line| line.trim_start_matches(|c: char| !c.is_alphanumeric()).trim())
        .find(|line| line.chars().any(char::is_alphabetic))
        .map(|line| line.chars().take(MAX_TITLE_CHARS).collect::<String>().trim_end().to_string())
}

fn description_after_title(text: &str) -> Option<String> {
    let mut lines = text.lines().skip_while(|line| !line.chars().any(char::is_alphabetic));
    lines.next();
    let rest = lines
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    (!rest.is_empty()).then_some(rest)
}

/// Source URL, else the source's own id, else a digest of the text
fn external_id(raw: &RawListing) -> String {
    if let Some(url) = raw.url.as_deref().filter(|u| !u.is_empty()) {
        return url.to_string();
    }
    if let Some(id) = raw.external_id.as_deref().filter(|id| !id.is_empty()) {
        return id.to_string();
    }
    let digest = format!("{:x}", Sha256::digest(raw.text.trim().as_bytes()));
    format!("txt-{}", &digest[..16])
}
