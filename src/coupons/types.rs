use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

// Category: fixed set a listing title is classified into
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Category {
    Development,
    Business,
    It,
    Design,
    Marketing,
    PersonalDevelopment,
    #[default]
    Other,
}

impl Category {
    /// Human-readable name used in message headers.
    pub fn label(self) -> &'static str {
        match self {
            Self::Development => "Development",
            Self::Business => "Business",
            Self::It => "IT & Software",
            Self::Design => "Design",
            Self::Marketing => "Marketing",
            Self::PersonalDevelopment => "Personal Development",
            Self::Other => "Other",
        }
    }
}

// CategoryRule: one row of the ordered keyword table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub category: Category,
    pub keywords: Vec<String>,
}

impl CategoryRule {
    pub fn new(category: Category, keywords: &[&str]) -> Self {
        Self {
            category,
            keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
        }
    }
}

/// One listing element as it appeared on a source page, not yet parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawListing {
    pub html: String,
    pub page: u32,
}

/// A parsed, categorized coupon. Identity is `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CouponRecord {
    pub id: String,
    pub title: String,
    pub code: Option<String>,
    pub discount_percent: Option<u8>,
    pub category: Category,
    pub url: String,
    pub description: Option<String>,
    pub original_price: Option<String>,
    pub expires: Option<String>,
    pub scraped_at: DateTime<Utc>,
}
