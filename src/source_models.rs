//! Wire shapes of the upstream APIs and their normalization into the output
//! contract. Every field an upstream may omit is optional here so that schema
//! drift degrades into defaults instead of parse failures.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::errors::AppError;
use crate::models::{
    CountryRecord, ExchangeRateRecord, IdentityRecord, NewsArticleRecord, RateValue,
    NOT_AVAILABLE,
};

/// Upper bound on articles returned to the client.
pub const MAX_NEWS_ARTICLES: usize = 5;

const DEFAULT_NEWS_TITLE: &str = "No title";
const DEFAULT_NEWS_DESCRIPTION: &str = "No description available";
const DEFAULT_NEWS_URL: &str = "#";

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn join_languages<I>(names: I) -> String
where
    I: IntoIterator<Item = String>,
{
    let names: Vec<String> = names
        .into_iter()
        .filter(|name| !name.trim().is_empty())
        .collect();
    if names.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        names.join(", ")
    }
}

/// Renders an RFC 3339 timestamp as `M/D/YYYY`; anything else passes through.
pub fn format_date_of_birth(raw: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.format("%-m/%-d/%Y").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

// ============ Identity (randomuser.me) ============

#[derive(Debug, Deserialize)]
pub struct RandomUserResponse {
    pub results: Vec<RandomUser>,
}

#[derive(Debug, Deserialize)]
pub struct RandomUser {
    pub gender: String,
    pub name: RandomUserName,
    pub location: RandomUserLocation,
    pub dob: RandomUserDob,
    pub picture: RandomUserPicture,
}

#[derive(Debug, Deserialize)]
pub struct RandomUserName {
    pub first: String,
    pub last: String,
}

#[derive(Debug, Deserialize)]
pub struct RandomUserLocation {
    pub street: RandomUserStreet,
    pub city: String,
    pub country: String,
}

#[derive(Debug, Deserialize)]
pub struct RandomUserStreet {
    pub number: u64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct RandomUserDob {
    pub date: String,
    pub age: u32,
}

#[derive(Debug, Deserialize)]
pub struct RandomUserPicture {
    pub large: String,
}

impl RandomUserResponse {
    /// Takes the first generated person. An empty result list is an error.
    pub fn into_identity(self) -> Result<IdentityRecord, AppError> {
        let user = self.results.into_iter().next().ok_or_else(|| {
            AppError::ExternalApiError("Random user response contained no results".to_string())
        })?;

        Ok(IdentityRecord {
            first_name: user.name.first,
            last_name: user.name.last,
            gender: user.gender,
            profile_picture: user.picture.large,
            age: user.dob.age,
            date_of_birth: format_date_of_birth(&user.dob.date),
            city: user.location.city,
            country: user.location.country,
            full_address: format!(
                "{} {}",
                user.location.street.number, user.location.street.name
            ),
        })
    }
}

// ============ Country (countrylayer.com) ============

#[derive(Debug, Deserialize)]
pub struct CountryLayerCountry {
    pub name: Option<String>,
    pub capital: Option<String>,
    pub languages: Option<Vec<CountryLayerLanguage>>,
    pub currencies: Option<Vec<CountryLayerCurrency>>,
    pub flag: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CountryLayerLanguage {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CountryLayerCurrency {
    pub code: Option<String>,
}

impl CountryLayerCountry {
    pub fn into_record(self, requested_name: &str) -> CountryRecord {
        CountryRecord {
            country_name: non_empty(self.name).unwrap_or_else(|| requested_name.to_string()),
            capital: non_empty(self.capital).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            languages: join_languages(
                self.languages
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|lang| lang.name),
            ),
            currency: self
                .currencies
                .unwrap_or_default()
                .into_iter()
                .next()
                .and_then(|currency| non_empty(currency.code)),
            flag: non_empty(self.flag),
        }
    }
}

// ============ Country (restcountries.com v3.1) ============

#[derive(Debug, Deserialize)]
pub struct RestCountriesCountry {
    pub name: Option<RestCountriesName>,
    pub capital: Option<Vec<String>>,
    /// ISO 639-3 code -> language name, in document order.
    pub languages: Option<Map<String, Value>>,
    /// Currency code -> currency details, in document order.
    pub currencies: Option<Map<String, Value>>,
    pub flags: Option<RestCountriesFlags>,
}

#[derive(Debug, Deserialize)]
pub struct RestCountriesName {
    pub common: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RestCountriesFlags {
    pub png: Option<String>,
    pub svg: Option<String>,
}

impl RestCountriesCountry {
    pub fn into_record(self, requested_name: &str) -> CountryRecord {
        CountryRecord {
            country_name: non_empty(self.name.and_then(|name| name.common))
                .unwrap_or_else(|| requested_name.to_string()),
            capital: non_empty(self.capital.and_then(|capitals| capitals.into_iter().next()))
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            languages: join_languages(
                self.languages
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|(_, name)| name.as_str().map(str::to_string)),
            ),
            currency: self
                .currencies
                .unwrap_or_default()
                .into_iter()
                .next()
                .map(|(code, _)| code)
                .filter(|code| !code.trim().is_empty()),
            // PNG renders everywhere; SVG only as a second choice
            flag: self
                .flags
                .and_then(|flags| non_empty(flags.png).or_else(|| non_empty(flags.svg))),
        }
    }
}

// ============ Exchange rates (exchangerate-api.com v6) ============

#[derive(Debug, Deserialize)]
pub struct ExchangeRateResponse {
    pub conversion_rates: Option<Map<String, Value>>,
}

impl ExchangeRateResponse {
    /// Extracts USD and KZT against `base_currency`. A body without a rate
    /// table is an error; a missing individual rate becomes `"N/A"`.
    pub fn into_record(self, base_currency: &str) -> Result<ExchangeRateRecord, AppError> {
        let rates = self.conversion_rates.ok_or_else(|| {
            AppError::ExternalApiError(format!(
                "Exchange rate response for {} has no conversion_rates",
                base_currency
            ))
        })?;

        let rate = |code: &str| RateValue::from(rates.get(code).and_then(Value::as_f64));

        Ok(ExchangeRateRecord {
            base_currency: base_currency.to_string(),
            usd: rate("USD"),
            kzt: rate("KZT"),
        })
    }
}

// ============ News (newsapi.org v2) ============

#[derive(Debug, Deserialize)]
pub struct NewsApiResponse {
    pub status: Option<String>,
    pub message: Option<String>,
    pub articles: Option<Vec<NewsApiArticle>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsApiArticle {
    pub title: Option<String>,
    pub url_to_image: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
}

impl NewsApiArticle {
    pub fn into_record(self) -> NewsArticleRecord {
        NewsArticleRecord {
            title: non_empty(self.title).unwrap_or_else(|| DEFAULT_NEWS_TITLE.to_string()),
            image: non_empty(self.url_to_image),
            description: non_empty(self.description)
                .unwrap_or_else(|| DEFAULT_NEWS_DESCRIPTION.to_string()),
            source_url: non_empty(self.url).unwrap_or_else(|| DEFAULT_NEWS_URL.to_string()),
        }
    }
}

impl NewsApiResponse {
    /// Maps at most [`MAX_NEWS_ARTICLES`] articles. A body flagged
    /// `status: "error"` is an error.
    pub fn into_records(self) -> Result<Vec<NewsArticleRecord>, AppError> {
        if self.status.as_deref() == Some("error") {
            return Err(AppError::ExternalApiError(format!(
                "News API reported an error: {}",
                self.message.unwrap_or_else(|| "unknown".to_string())
            )));
        }

        Ok(self
            .articles
            .unwrap_or_default()
            .into_iter()
            .take(MAX_NEWS_ARTICLES)
            .map(NewsApiArticle::into_record)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identity_normalization() {
        let response: RandomUserResponse = serde_json::from_value(json!({
            "results": [{
                "gender": "female",
                "name": { "title": "Ms", "first": "Aigerim", "last": "Nurlanova" },
                "location": {
                    "street": { "number": 4521, "name": "Abay Avenue" },
                    "city": "Almaty",
                    "country": "Kazakhstan"
                },
                "dob": { "date": "1987-03-09T14:22:31.112Z", "age": 39 },
                "picture": { "large": "https://randomuser.me/api/portraits/women/12.jpg" }
            }]
        }))
        .unwrap();

        let identity = response.into_identity().unwrap();
        assert_eq!(identity.first_name, "Aigerim");
        assert_eq!(identity.country, "Kazakhstan");
        assert_eq!(identity.date_of_birth, "3/9/1987");
        assert_eq!(identity.full_address, "4521 Abay Avenue");
        assert_eq!(identity.age, 39);
    }

    #[test]
    fn test_identity_empty_results_is_error() {
        let response = RandomUserResponse { results: vec![] };
        assert!(response.into_identity().is_err());
    }

    #[test]
    fn test_date_of_birth_passthrough_when_unparseable() {
        assert_eq!(format_date_of_birth("sometime in 1980"), "sometime in 1980");
        assert_eq!(format_date_of_birth("2001-12-25T00:00:00Z"), "12/25/2001");
    }

    #[test]
    fn test_countrylayer_normalization() {
        let country: CountryLayerCountry = serde_json::from_value(json!({
            "name": "Switzerland",
            "capital": "Bern",
            "languages": [
                { "iso639_1": "de", "name": "German" },
                { "iso639_1": "fr", "name": "French" },
                { "iso639_1": "it", "name": "Italian" }
            ],
            "currencies": [{ "code": "CHF", "name": "Swiss franc", "symbol": "Fr" }],
            "flag": "https://restcountries.eu/data/che.svg"
        }))
        .unwrap();

        let record = country.into_record("Switzerland");
        assert_eq!(record.languages, "German, French, Italian");
        assert_eq!(record.currency.as_deref(), Some("CHF"));
        assert_eq!(
            record.flag.as_deref(),
            Some("https://restcountries.eu/data/che.svg")
        );
    }

    #[test]
    fn test_countrylayer_missing_fields_fall_back() {
        let country: CountryLayerCountry = serde_json::from_value(json!({
            "name": "",
            "currencies": []
        }))
        .unwrap();

        let record = country.into_record("Antarctica");
        assert_eq!(record.country_name, "Antarctica");
        assert_eq!(record.capital, "N/A");
        assert_eq!(record.languages, "N/A");
        assert_eq!(record.currency, None);
        assert_eq!(record.flag, None);
    }

    #[test]
    fn test_restcountries_normalization() {
        let country: RestCountriesCountry = serde_json::from_value(json!({
            "name": { "common": "Canada", "official": "Canada" },
            "capital": ["Ottawa"],
            "languages": { "eng": "English", "fra": "French" },
            "currencies": { "CAD": { "name": "Canadian dollar", "symbol": "$" } },
            "flags": {
                "png": "https://flagcdn.com/w320/ca.png",
                "svg": "https://flagcdn.com/ca.svg"
            }
        }))
        .unwrap();

        let record = country.into_record("Canada");
        assert_eq!(record.capital, "Ottawa");
        assert_eq!(record.languages, "English, French");
        assert_eq!(record.currency.as_deref(), Some("CAD"));
        assert_eq!(record.flag.as_deref(), Some("https://flagcdn.com/w320/ca.png"));
    }

    #[test]
    fn test_restcountries_flag_falls_back_to_svg() {
        let country: RestCountriesCountry = serde_json::from_value(json!({
            "name": { "common": "Nepal" },
            "flags": { "svg": "https://flagcdn.com/np.svg" }
        }))
        .unwrap();

        let record = country.into_record("Nepal");
        assert_eq!(record.flag.as_deref(), Some("https://flagcdn.com/np.svg"));
        assert_eq!(record.currency, None);
    }

    #[test]
    fn test_exchange_rates_missing_target_is_marker() {
        let response: ExchangeRateResponse = serde_json::from_value(json!({
            "result": "success",
            "base_code": "EUR",
            "conversion_rates": { "EUR": 1, "USD": 1.0842 }
        }))
        .unwrap();

        let record = response.into_record("EUR").unwrap();
        assert_eq!(record.usd, RateValue::Value(1.0842));
        assert_eq!(record.kzt, RateValue::NotAvailable);
    }

    #[test]
    fn test_exchange_rates_without_table_is_error() {
        let response: ExchangeRateResponse =
            serde_json::from_value(json!({ "result": "error", "error-type": "unsupported-code" }))
                .unwrap();
        assert!(response.into_record("XXX").is_err());
    }

    #[test]
    fn test_news_defaults_and_cap() {
        let mut articles = vec![json!({
            "title": null,
            "description": "",
            "urlToImage": null
        })];
        for i in 0..8 {
            articles.push(json!({
                "title": format!("Headline {}", i),
                "description": "Body",
                "url": format!("https://news.example/{}", i),
                "urlToImage": "https://news.example/img.jpg"
            }));
        }
        let response: NewsApiResponse =
            serde_json::from_value(json!({ "status": "ok", "articles": articles })).unwrap();

        let records = response.into_records().unwrap();
        assert_eq!(records.len(), MAX_NEWS_ARTICLES);
        assert_eq!(
            records[0],
            NewsArticleRecord {
                title: "No title".to_string(),
                image: None,
                description: "No description available".to_string(),
                source_url: "#".to_string(),
            }
        );
        assert_eq!(records[1].title, "Headline 0");
    }

    #[test]
    fn test_news_error_status() {
        let response: NewsApiResponse = serde_json::from_value(json!({
            "status": "error",
            "code": "apiKeyInvalid",
            "message": "Your API key is invalid"
        }))
        .unwrap();
        assert!(response.into_records().is_err());
    }
}
