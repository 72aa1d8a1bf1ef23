//! Field-pattern rules used by the extractor.
//!
//! Every field has an ordered list of patterns; the first plausible match wins.
//! Patterns cover English, Russian and Vietnamese listing vocabulary as it
//! appears in Dubai and Ho Chi Minh City channels and portals.

use crate::models::{AreaUnit, PropertyType, Purpose};
use regex::{Captures, Regex};

/// Prices below this are treated as noise (room numbers, floors, years)
pub const MIN_PLAUSIBLE_PRICE: i64 = 1_000;

const MAX_PLAUSIBLE_ROOMS: u32 = 20;

/// Number with optional thousands grouping or a short decimal part
const NUM: &str = r"(?P<num>\d{1,3}(?:[,.\u{a0} ]\d{3})+|\d+[.,]\d{1,2}|\d+)";

/// Optional magnitude suffix ("1.5M", "850K", "2 млн", "5 tỷ")
const MULT: &str = r"(?:\s*(?P<mult>million|mn|m|k|млн|тыс|tỷ|triệu)\b)?";

const CURRENCY: &str = r"(?:aed|usd|vnd|dirhams?|\$|€|₫|đ|руб)";

/// Compile a built-in pattern
fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in pattern is valid")
}

/// Canonical area names recognised anywhere in a listing
const KNOWN_AREAS: &[&str] = &[
    "Dubai Marina",
    "Downtown Dubai",
    "Palm Jumeirah",
    "Jumeirah Beach Residence",
    "Jumeirah Village Circle",
    "Jumeirah Lake Towers",
    "Business Bay",
    "Dubai Hills Estate",
    "Dubai Creek Harbour",
    "Arabian Ranches",
    "Emaar Beachfront",
    "Dubai Silicon Oasis",
    "Discovery Gardens",
    "International City",
    "Al Barsha",
    "Al Furjan",
    "Damac Hills",
    "City Walk",
    "Bur Dubai",
    "Deira",
    "Mirdif",
    "DIFC",
    "JBR",
    "JVC",
    "JLT",
    "Vinhomes Central Park",
    "Landmark 81",
    "Phu My Hung",
    "Thao Dien",
    "Thu Duc",
    "Binh Thanh",
    "District 1",
    "District 2",
    "District 7",
    "Jumeirah",
];

/// Ordered pattern lists and keyword tables for every extracted field
pub struct FieldRules {
    pub price: Vec<Regex>,
    pub bedrooms: Vec<Regex>,
    pub bathrooms: Vec<Regex>,
    pub area: Vec<(Regex, AreaUnit)>,
    pub phone: Vec<Regex>,
    pub agent_name: Vec<Regex>,
    pub location: Vec<Regex>,
    pub image: Regex,
    pub property_types: Vec<(PropertyType, Regex)>,
    pub purposes: Vec<(Purpose, Regex)>,
    /// Vocabulary that marks a text as a real-estate listing
    pub keywords: Regex,
    /// Whole-word match of any known area name, longest alternative first
    pub known_areas: Regex,
    pub min_price: i64,
}

impl Default for FieldRules {
    fn default() -> Self {
        Self {
            price: vec![
                re(&format!(
                    r"(?i)(?:price|asking|cost|цена|стоимость|giá)\s*[:\-–]?\s*{CURRENCY}?\s*{NUM}{MULT}"
                )),
                re(&format!(r"(?i){NUM}{MULT}\s*{CURRENCY}")),
                re(&format!(r"(?i){CURRENCY}\s*{NUM}{MULT}")),
            ],
            bedrooms: vec![
                re(r"(?i)(\d+)\s*-?\s*(?:bed(?:room)?s?|br|bhk|bd)\b"),
                re(r"(?i)(\d+)[\s-]*(?:спальн|комнат)\w*"),
                re(r"(?i)(\d+)\s*(?:phòng ngủ|pn)\b"),
                re(r"(?i)(?:bedrooms?|beds|спален)\s*[:\-]\s*(\d+)"),
            ],
            bathrooms: vec![
                re(r"(?i)(\d+)\s*-?\s*(?:bath(?:room)?s?|ba|wc)\b"),
                re(r"(?i)(\d+)[\s-]*(?:ванн|санузл)\w*"),
                re(r"(?i)(\d+)\s*phòng tắm"),
                re(r"(?i)(?:bathrooms?|baths)\s*[:\-]\s*(\d+)"),
            ],
            area: vec![
                (
                    re(r"(?i)(\d{1,3}(?:,\d{3})+|\d+(?:\.\d+)?)\s*(?:sq\.?\s*ft|sqft|square\s+feet|ft²)"),
                    AreaUnit::Sqft,
                ),
                (
                    re(r"(?i)(\d{1,3}(?:,\d{3})+|\d+(?:[.,]\d+)?)\s*(?:m²|m2\b|sqm\b|sq\.?\s*m\b|кв\.?\s*м|м²)"),
                    AreaUnit::Sqm,
                ),
            ],
            phone: vec![
                re(r"(\+971[ -]?\d{1,2}[ -]?\d{3}[ -]?\d{4})"),
                re(r"(\+84[ -]?\d{2,3}[ -]?\d{3}[ -]?\d{3,4})"),
                re(r"(\+7[ -]?\(?\d{3}\)?[ -]?\d{3}[ -]?\d{2}[ -]?\d{2})"),
                re(r"(\+\d{1,3}[ -]?\d{2,4}[ -]?\d{3,4}[ -]?\d{3,4})"),
                re(r"\b(0\d{1,2}[ -]?\d{3}[ -]?\d{4})\b"),
            ],
            agent_name: vec![re(
                r"(?i:agent|broker|contact|агент|риелтор|liên hệ)\s*[:\-]\s*([A-ZА-Я][\p{L}'.]+(?:[ ][A-ZА-Я][\p{L}'.]+){0,2})",
            )],
            location: vec![re(
                r"\b(?i:located in|in|at|район|tại)\s+([A-Z][\p{L}']+(?:[ ][A-Z][\p{L}']+){0,3})",
            )],
            image: re(r#"(?i)https?://[^\s"'<>()]+?\.(?:jpe?g|png|webp)(?:\?[^\s"'<>()]*)?"#),
            property_types: vec![
                (PropertyType::Penthouse, re(r"(?i)\b(?:penthouse|пентхаус)")),
                (
                    PropertyType::Townhouse,
                    re(r"(?i)\b(?:townhouse|town house|таунхаус|nhà phố)"),
                ),
                (PropertyType::Villa, re(r"(?i)\b(?:villa|вилл|biệt thự)")),
                (PropertyType::Studio, re(r"(?i)\b(?:studio|студи)")),
                (
                    PropertyType::Apartment,
                    re(r"(?i)\b(?:apartment|apt\b|flat\b|condo|квартир|апартамент|căn hộ)"),
                ),
            ],
            purposes: vec![
                (Purpose::Rent, re(r"(?i)\bfor\s+rent\b")),
                (Purpose::Sale, re(r"(?i)\bfor\s+sale\b")),
                (
                    Purpose::Rent,
                    re(r"(?i)\b(?:rent|rental|to let|lease|per month|аренд|сда[её]тся|cho thuê)"),
                ),
                (
                    Purpose::Sale,
                    re(r"(?i)\b(?:sale|sell|selling|buy|продаж|прода[её]тся|bán)"),
                ),
            ],
            keywords: re(
                r"(?i)\b(?:apartment|villa|studio|townhouse|penthouse|flat|property|bed(?:room)?s?|\d\s*br|bhk|sq\.?\s*ft|sqft|sqm|rent|sale|lease|квартир|вилл|аренд|продаж|недвижимост|căn hộ|nhà|bất động sản|thuê|bán)",
            ),
            known_areas: known_area_pattern(KNOWN_AREAS),
            min_price: MIN_PLAUSIBLE_PRICE,
        }
    }
}

impl FieldRules {
    /// First plausible price across the ordered price patterns
    pub fn price(&self, text: &str) -> Option<i64> {
        self.price.iter().find_map(|pattern| {
            pattern
                .captures_iter(text)
                .filter_map(|caps| price_from_captures(&caps))
                .find(|price| *price >= self.min_price)
        })
    }

    pub fn bedrooms(&self, text: &str) -> Option<u32> {
        first_count(&self.bedrooms, text)
    }

    pub fn bathrooms(&self, text: &str) -> Option<u32> {
        first_count(&self.bathrooms, text)
    }

    pub fn area(&self, text: &str) -> Option<(f64, AreaUnit)> {
        self.area.iter().find_map(|(pattern, unit)| {
            pattern
                .captures(text)
                .and_then(|caps| parse_number(caps.get(1)?.as_str()))
                .filter(|value| *value > 0.0)
                .map(|value| (value, *unit))
        })
    }

    pub fn phone(&self, text: &str) -> Option<String> {
        first_capture(&self.phone, text).map(str::to_string)
    }

    pub fn agent_name(&self, text: &str) -> Option<String> {
        first_capture(&self.agent_name, text).map(|name| name.trim().to_string())
    }

    /// Earliest known area name in the text, then a generic "in <Place>" phrase
    pub fn location(&self, text: &str) -> Option<String> {
        self.known_areas
            .find(text)
            .and_then(|m| {
                KNOWN_AREAS
                    .iter()
                    .find(|area| area.eq_ignore_ascii_case(m.as_str()))
            })
            .map(|area| area.to_string())
            .or_else(|| first_capture(&self.location, text).map(str::to_string))
    }

    pub fn property_type(&self, text: &str) -> Option<PropertyType> {
        self.property_types
            .iter()
            .find(|(_, pattern)| pattern.is_match(text))
            .map(|(kind, _)| *kind)
    }

    pub fn purpose(&self, text: &str) -> Option<Purpose> {
        self.purposes
            .iter()
            .find(|(_, pattern)| pattern.is_match(text))
            .map(|(purpose, _)| *purpose)
    }

    pub fn images(&self, text: &str) -> Vec<String> {
        self.image
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    pub fn has_keyword(&self, text: &str) -> bool {
        self.keywords.is_match(text)
    }
}

fn known_area_pattern(names: &[&str]) -> Regex {
    let mut names = names.to_vec();
    names.sort_by_key(|name| std::cmp::Reverse(name.len()));
    let alternation: Vec<String> = names.iter().map(|name| regex::escape(name)).collect();
    re(&format!(r"(?i)\b(?:{})\b", alternation.join("|")))
}

fn first_capture<'t>(patterns: &[Regex], text: &'t str) -> Option<&'t str> {
    patterns
        .iter()
        .find_map(|pattern| pattern.captures(text)?.get(1))
        .map(|m| m.as_str())
}

fn first_count(patterns: &[Regex], text: &str) -> Option<u32> {
    patterns.iter().find_map(|pattern| {
        pattern
            .captures_iter(text)
            .filter_map(|caps| caps.get(1)?.as_str().parse::<u32>().ok())
            .find(|count| *count <= MAX_PLAUSIBLE_ROOMS)
    })
}

fn price_from_captures(caps: &Captures<'_>) -> Option<i64> {
    let value = parse_number(caps.name("num")?.as_str())?;
    let multiplier = caps
        .name("mult")
        .map(|m| multiplier(m.as_str()))
        .unwrap_or(1.0);
    Some((value * multiplier).round() as i64)
}

fn multiplier(suffix: &str) -> f64 {
    match suffix.to_lowercase().as_str() {
        "k" | "тыс" => 1_000.0,
        "m" | "mn" | "million" | "млн" | "triệu" => 1_000_000.0,
        "tỷ" => 1_000_000_000.0,
        _ => 1.0,
    }
}

/// Parse a human-formatted number.
///
/// Thousands separators (`,` `.` space, no-break space) and currency symbols are
/// stripped. A final separator followed by one or two digits is a decimal point.
pub fn parse_number(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.'))
        .collect();
    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    if let Some(pos) = cleaned.rfind([',', '.']) {
        let fraction = &cleaned[pos + 1..];
        if (1..=2).contains(&fraction.len()) {
            let whole: String = cleaned[..pos].chars().filter(char::is_ascii_digit).collect();
            let whole = if whole.is_empty() { "0".to_string() } else { whole };
            return format!("{}.{}", whole, fraction).parse().ok();
        }
    }

    cleaned
        .chars()
        .filter(char::is_ascii_digit)
        .collect::<String>()
        .parse()
        .ok()
}
