use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of property a listing advertises
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PropertyType {
    Apartment,
    Villa,
    Studio,
    Townhouse,
    Penthouse,
}

/// Whether the listing is for sale or for rent
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Purpose {
    Sale,
    Rent,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AreaUnit {
    Sqft,
    Sqm,
}

/// Unstructured text pulled from a remote source, alive for one extraction pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawListing {
    pub text: String,
    pub url: Option<String>,
    /// Identifier supplied by the source itself (e.g. a Telegram post id)
    pub external_id: Option<String>,
    pub images: Vec<String>,
}

impl RawListing {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// Flat record produced by the extractor. Every field except the title and
/// identifier is best-effort.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractedProperty {
    pub title: String,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub property_type: Option<PropertyType>,
    pub purpose: Option<Purpose>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub area: Option<f64>,
    pub area_unit: Option<AreaUnit>,
    pub location_area: Option<String>,
    pub agent_name: Option<String>,
    pub agent_phone: Option<String>,
    pub images: Vec<String>,
    pub source_url: Option<String>,
    pub external_id: String,
    pub raw_text: String,
}

/// Row written to `scraped_properties`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapedPropertyRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub source_id: Option<String>,
    pub external_id: String,
    pub title: String,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub property_type: Option<PropertyType>,
    pub purpose: Option<Purpose>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub area: Option<f64>,
    pub area_unit: Option<AreaUnit>,
    pub location_area: Option<String>,
    pub agent_name: Option<String>,
    pub agent_phone: Option<String>,
    pub images: Vec<String>,
    pub source_url: Option<String>,
    pub raw_text: String,
    pub status: String,
    pub scraped_at: DateTime<Utc>,
}

impl ScrapedPropertyRow {
    pub fn new(source_id: Option<&str>, property: &ExtractedProperty) -> Self {
        Self {
            id: None,
            source_id: source_id.map(str::to_string),
            external_id: property.external_id.clone(),
            title: property.title.clone(),
            description: property.description.clone(),
            price: property.price,
            property_type: property.property_type,
            purpose: property.purpose,
            bedrooms: property.bedrooms,
            bathrooms: property.bathrooms,
            area: property.area,
            area_unit: property.area_unit,
            location_area: property.location_area.clone(),
            agent_name: property.agent_name.clone(),
            agent_phone: property.agent_phone.clone(),
            images: property.images.clone(),
            source_url: property.source_url.clone(),
            raw_text: property.raw_text.clone(),
            status: "new".to_string(),
            scraped_at: Utc::now(),
        }
    }
}

/// Curated listing shown on the website and in the bot (`property_listings`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyListing {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub property_type: Option<String>,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub bedrooms: Option<i32>,
    #[serde(default)]
    pub bathrooms: Option<i32>,
    #[serde(default)]
    pub area_sqft: Option<f64>,
    #[serde(default)]
    pub location_area: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
    #[serde(default)]
    pub agent_phone: Option<String>,
}

impl PropertyListing {
    pub fn cover_image(&self) -> Option<&str> {
        self.images
            .as_ref()
            .and_then(|images| images.first())
            .map(String::as_str)
    }
}
