use serde::{Serialize, Serializer};
use utoipa::ToSchema;

/// Literal substituted for any value an upstream could not provide.
pub const NOT_AVAILABLE: &str = "N/A";

// ============ Output Contract ============

/// The random person at the root of every aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRecord {
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    /// URL of the large profile picture.
    pub profile_picture: String,
    pub age: u32,
    /// Localized (`M/D/YYYY`) date of birth.
    pub date_of_birth: String,
    pub city: String,
    pub country: String,
    /// Street number and street name.
    pub full_address: String,
}

/// Country metadata looked up from the identity's country name.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CountryRecord {
    pub country_name: String,
    pub capital: String,
    /// Comma-joined language names.
    pub languages: String,
    /// Currency code; `None` disables the exchange-rate step.
    pub currency: Option<String>,
    /// Flag image URL.
    pub flag: Option<String>,
}

impl CountryRecord {
    /// Record used when the country lookup fails or finds nothing.
    pub fn degraded(country_name: &str) -> Self {
        Self {
            country_name: country_name.to_string(),
            capital: NOT_AVAILABLE.to_string(),
            languages: NOT_AVAILABLE.to_string(),
            currency: None,
            flag: None,
        }
    }
}

/// A conversion rate, or the `"N/A"` marker when the upstream had none.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RateValue {
    Value(f64),
    NotAvailable,
}

impl From<Option<f64>> for RateValue {
    fn from(rate: Option<f64>) -> Self {
        rate.map_or(RateValue::NotAvailable, RateValue::Value)
    }
}

impl Serialize for RateValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RateValue::Value(rate) => serializer.serialize_f64(*rate),
            RateValue::NotAvailable => serializer.serialize_str(NOT_AVAILABLE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRateRecord {
    pub base_currency: String,
    /// Number, or the string `"N/A"`.
    #[schema(value_type = Object)]
    pub usd: RateValue,
    /// Number, or the string `"N/A"`.
    #[schema(value_type = Object)]
    pub kzt: RateValue,
}

impl ExchangeRateRecord {
    /// Record used when a currency is known but the rate lookup failed.
    pub fn unavailable(base_currency: &str) -> Self {
        Self {
            base_currency: base_currency.to_string(),
            usd: RateValue::NotAvailable,
            kzt: RateValue::NotAvailable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticleRecord {
    pub title: String,
    pub image: Option<String>,
    pub description: String,
    pub source_url: String,
}

/// Successful response of `GET /api/random-user`.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResponse {
    pub success: bool,
    pub user: IdentityRecord,
    pub country: CountryRecord,
    /// Omitted entirely when the country has no currency.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange_rates: Option<ExchangeRateRecord>,
    pub news: Vec<NewsArticleRecord>,
}

/// Failure body: exactly `{success: false, error}`.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}
