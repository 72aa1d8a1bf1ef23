use serde::{Deserialize, Serialize};

/// Editorial review of a neighbourhood (`district_reviews`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistrictReview {
    pub id: String,
    pub district_name: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub pros: Option<Vec<String>>,
    #[serde(default)]
    pub cons: Option<Vec<String>>,
    #[serde(default)]
    pub average_price_sqft: Option<f64>,
}
