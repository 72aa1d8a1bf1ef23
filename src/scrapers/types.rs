use serde::{Deserialize, Serialize};

/// CSS selectors used to split a listing page into individual listings.
///
/// A data source may override any of them through its `config` JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ListingSelectors {
    /// One element per listing
    pub card: String,
    /// Text inside the card; the whole card text is used when nothing matches
    pub text: String,
    /// Anchor holding the listing's own URL
    pub link: String,
    /// Image elements (`src`, `data-src`, or a `background-image` style)
    pub image: String,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            card: "article, [data-testid='property-card'], .listing-card, .property-card".to_string(),
            text: ".listing-details, .property-info, .card-body".to_string(),
            link: "a[href]".to_string(),
            image: "img".to_string(),
        }
    }
}

impl ListingSelectors {
    /// Markup of the public channel preview at `https://t.me/s/<channel>`
    pub fn telegram_channel() -> Self {
        Self {
            card: ".tgme_widget_message".to_string(),
            text: ".tgme_widget_message_text".to_string(),
            link: "a.tgme_widget_message_date".to_string(),
            image: ".tgme_widget_message_photo_wrap".to_string(),
        }
    }

    /// Apply overrides from a data source `config` value on top of `self`
    pub fn with_overrides(mut self, config: Option<&serde_json::Value>) -> Self {
        let Some(config) = config else {
            return self;
        };
        let field = |name: &str| {
            config
                .get(name)
                .and_then(|v| v.as_str())
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
        };
        if let Some(card) = field("card_selector") {
            self.card = card;
        }
        if let Some(text) = field("text_selector") {
            self.text = text;
        }
        if let Some(link) = field("link_selector") {
            self.link = link;
        }
        if let Some(image) = field("image_selector") {
            self.image = image;
        }
        self
    }
}
