use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Number written either as a JSON string (`"12,50"`) or as a JSON number.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Text(String),
    Number(f64),
}

impl Amount {
    /// Text form, ready to be parsed as money or quantity.
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(text) => text.trim().to_string(),
            Self::Number(number) => number.to_string(),
        }
    }
}

/// Timestamps that do not parse as RFC 3339 become `None`, so one malformed
/// document does not fail a whole import.
fn lenient_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| {
        DateTime::parse_from_rfc3339(value.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }))
}

fn default_active() -> bool {
    true
}

pub mod list {
    use super::*;

    /// A purchase list as found in import files.
    ///
    /// The total is not read: it is recomputed from the products.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct ListDocument {
        pub store: String,
        #[serde(default)]
        pub products: Vec<ProductDocument>,
        #[serde(default, deserialize_with = "lenient_datetime")]
        pub created_at: Option<DateTime<Utc>>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct ProductDocument {
        pub name: String,
        pub price: Amount,
        pub purchase_date: NaiveDate,
        pub quantity: Amount,
        /// `kg`, `g` or `unit`; `unit` when missing.
        #[serde(default)]
        pub quantity_unit: Option<String>,
        /// Category code, display name or alias.
        pub category: String,
        #[serde(default)]
        pub brand: Option<String>,
        /// Falls back to the list store.
        #[serde(default)]
        pub store: Option<String>,
        #[serde(default = "default_active")]
        pub active: bool,
    }
}

pub mod report {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryCount {
        pub category: String,
        pub count: usize,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MonthlySpend {
        /// `m/yyyy`.
        pub month: String,
        pub total_minor: i64,
        pub total: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Summary {
        pub total_spent_minor: i64,
        pub total_spent: String,
        pub average_spent_per_list: f64,
        pub top_categories: Vec<CategoryCount>,
        /// Oldest month first.
        pub spend_by_month: Vec<MonthlySpend>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct HistoryEntry {
        pub id: Uuid,
        pub store: String,
        pub created_at: Option<DateTime<Utc>>,
        pub products: usize,
        pub total: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Report {
        pub summary: Summary,
        /// Newest list first.
        pub history: Vec<HistoryEntry>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TrendPoint {
        pub month: String,
        pub average_price: f64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PriceTrend {
        pub product: String,
        pub points: Vec<TrendPoint>,
    }
}

pub mod product {
    use super::*;

    /// One saved product, flat enough for a CSV row.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProductRow {
        pub list_id: Uuid,
        pub list_store: String,
        pub month: String,
        pub purchase_date: NaiveDate,
        pub name: String,
        pub brand: Option<String>,
        pub category: String,
        pub price: String,
        pub quantity: String,
        pub quantity_unit: String,
        pub active: bool,
    }
}
