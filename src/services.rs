use crate::circuit_breaker::{create_upstream_circuit_breaker, UpstreamCircuitBreaker};
use crate::config::{Config, CountryProviderKind};
use crate::errors::AppError;
use crate::models::{CountryRecord, ExchangeRateRecord, IdentityRecord, NewsArticleRecord};
use crate::source_models::{
    CountryLayerCountry, ExchangeRateResponse, NewsApiResponse, RandomUserResponse,
    RestCountriesCountry, MAX_NEWS_ARTICLES,
};
use failsafe::futures::CircuitBreaker as _;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// Builds the HTTP client shared by all upstream services.
///
/// Every request made through it is bounded by `upstream_timeout_secs`.
pub fn build_http_client(config: &Config) -> Result<Client, AppError> {
    Client::builder()
        .timeout(Duration::from_secs(config.upstream_timeout_secs))
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
        .build()
        .map_err(|e| AppError::InternalError(format!("Failed to create HTTP client: {}", e)))
}

/// Appends percent-encoded path segments to a base URL.
fn endpoint(base_url: &str, segments: &[&str]) -> Result<Url, AppError> {
    let mut url = Url::parse(base_url)
        .map_err(|e| AppError::InternalError(format!("Invalid base URL {}: {}", base_url, e)))?;
    {
        let mut path = url.path_segments_mut().map_err(|_| {
            AppError::InternalError(format!("Base URL {} cannot take a path", base_url))
        })?;
        path.pop_if_empty().extend(segments);
    }
    Ok(url)
}

fn transport_error(source: &str, err: reqwest::Error) -> AppError {
    // Some upstream URLs carry credentials, keep them out of messages
    let err = err.without_url();
    if err.is_timeout() {
        AppError::ExternalApiError(format!("{} request timed out: {}", source, err))
    } else {
        AppError::ExternalApiError(format!("{} request failed: {}", source, err))
    }
}

async fn send_get(client: &Client, url: Url, source: &str) -> Result<Response, AppError> {
    client
        .get(url)
        .send()
        .await
        .map_err(|e| transport_error(source, e))
}

/// Decodes a JSON body. Non-success statuses are errors.
async fn decode_json<T: DeserializeOwned>(response: Response, source: &str) -> Result<T, AppError> {
    if !response.status().is_success() {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        tracing::error!("{} returned error {}: {}", source, status, error_text);
        return Err(AppError::ExternalApiError(format!(
            "{} returned status {}: {}",
            source, status, error_text
        )));
    }

    response.json::<T>().await.map_err(|e| {
        AppError::ExternalApiError(format!(
            "Failed to parse {} response: {}",
            source,
            e.without_url()
        ))
    })
}

async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: Url,
    source: &str,
) -> Result<T, AppError> {
    let response = send_get(client, url, source).await?;
    decode_json(response, source).await
}

// ============ Identity source ============

/// Client for the random identity generator (randomuser.me).
pub struct IdentityService {
    client: Client,
    base_url: String,
    breaker: UpstreamCircuitBreaker,
}

impl IdentityService {
    pub fn new(config: &Config, client: Client) -> Self {
        Self {
            client,
            base_url: config.randomuser_base_url.clone(),
            breaker: create_upstream_circuit_breaker(),
        }
    }

    /// Requests exactly one random person.
    pub async fn fetch_identity(&self) -> Result<IdentityRecord, AppError> {
        let mut url = endpoint(&self.base_url, &["api", ""])?;
        url.query_pairs_mut().append_pair("results", "1");

        tracing::debug!("Fetching random identity: {}", url);

        self.breaker
            .call(async move {
                get_json::<RandomUserResponse>(&self.client, url, "Random user API")
                    .await?
                    .into_identity()
            })
            .await
            .map_err(AppError::from)
    }
}

// ============ Country-information source ============

/// countrylayer.com lookup by country name (keyed).
pub struct CountryLayerService {
    client: Client,
    base_url: String,
    access_key: String,
    breaker: UpstreamCircuitBreaker,
}

impl CountryLayerService {
    pub fn new(client: Client, base_url: String, access_key: String) -> Self {
        Self {
            client,
            base_url,
            access_key,
            breaker: create_upstream_circuit_breaker(),
        }
    }

    async fn lookup(&self, country_name: &str) -> Result<Option<CountryRecord>, AppError> {
        let mut url = endpoint(&self.base_url, &["v2", "name", country_name])?;
        url.query_pairs_mut()
            .append_pair("access_key", &self.access_key);

        tracing::debug!(
            "Country lookup via countrylayer: {}/v2/name/{}?access_key=[REDACTED]",
            self.base_url,
            country_name
        );

        let matches = self
            .breaker
            .call(fetch_matches::<CountryLayerCountry>(
                &self.client,
                url,
                "Countrylayer API",
            ))
            .await?;

        Ok(matches
            .into_iter()
            .next()
            .map(|country| country.into_record(country_name)))
    }
}

/// restcountries.com lookup by country name (keyless).
pub struct RestCountriesService {
    client: Client,
    base_url: String,
    breaker: UpstreamCircuitBreaker,
}

impl RestCountriesService {
    pub fn new(client: Client, base_url: String) -> Self {
        Self {
            client,
            base_url,
            breaker: create_upstream_circuit_breaker(),
        }
    }

    async fn lookup(&self, country_name: &str) -> Result<Option<CountryRecord>, AppError> {
        let url = endpoint(&self.base_url, &["v3.1", "name", country_name])?;

        tracing::debug!("Country lookup via restcountries: {}", url);

        let matches = self
            .breaker
            .call(fetch_matches::<RestCountriesCountry>(
                &self.client,
                url,
                "REST Countries API",
            ))
            .await?;

        Ok(matches
            .into_iter()
            .next()
            .map(|country| country.into_record(country_name)))
    }
}

/// Name lookups answer 404 for unknown names; that is an empty match list,
/// not a failure.
async fn fetch_matches<T: DeserializeOwned>(
    client: &Client,
    url: Url,
    source: &str,
) -> Result<Vec<T>, AppError> {
    let response = send_get(client, url, source).await?;

    if response.status() == StatusCode::NOT_FOUND {
        tracing::info!("{} has no match for the requested country", source);
        return Ok(Vec::new());
    }

    decode_json(response, source).await
}

/// The country-information capability. One provider is chosen at startup
/// from `COUNTRY_PROVIDER`; callers never branch on it.
pub enum CountryService {
    CountryLayer(CountryLayerService),
    RestCountries(RestCountriesService),
}

impl CountryService {
    pub fn from_config(config: &Config, client: Client) -> Result<Self, AppError> {
        match config.country_provider {
            CountryProviderKind::CountryLayer => {
                let access_key = config.countrylayer_api_key.clone().ok_or_else(|| {
                    AppError::InternalError(
                        "countrylayer provider selected without an access key".to_string(),
                    )
                })?;
                Ok(Self::CountryLayer(CountryLayerService::new(
                    client,
                    config.countrylayer_base_url.clone(),
                    access_key,
                )))
            }
            CountryProviderKind::RestCountries => Ok(Self::RestCountries(
                RestCountriesService::new(client, config.restcountries_base_url.clone()),
            )),
        }
    }

    pub fn provider(&self) -> CountryProviderKind {
        match self {
            Self::CountryLayer(_) => CountryProviderKind::CountryLayer,
            Self::RestCountries(_) => CountryProviderKind::RestCountries,
        }
    }

    /// Looks up a country by name. `Ok(None)` means the provider had no match.
    pub async fn lookup(&self, country_name: &str) -> Result<Option<CountryRecord>, AppError> {
        match self {
            Self::CountryLayer(service) => service.lookup(country_name).await,
            Self::RestCountries(service) => service.lookup(country_name).await,
        }
    }
}

// ============ Exchange-rate source ============

/// Client for exchangerate-api.com v6.
pub struct ExchangeRateService {
    client: Client,
    base_url: String,
    api_key: String,
    breaker: UpstreamCircuitBreaker,
}

impl ExchangeRateService {
    pub fn new(config: &Config, client: Client) -> Self {
        Self {
            client,
            base_url: config.exchange_rate_base_url.clone(),
            api_key: config.exchange_rate_api_key.clone(),
            breaker: create_upstream_circuit_breaker(),
        }
    }

    /// Fetches the latest USD and KZT rates for `base_currency`.
    pub async fn fetch_rates(&self, base_currency: &str) -> Result<ExchangeRateRecord, AppError> {
        let url = endpoint(
            &self.base_url,
            &["v6", self.api_key.as_str(), "latest", base_currency],
        )?;

        tracing::debug!(
            "Fetching exchange rates: {}/v6/[REDACTED]/latest/{}",
            self.base_url,
            base_currency
        );

        self.breaker
            .call(async move {
                get_json::<ExchangeRateResponse>(&self.client, url, "Exchange rate API")
                    .await?
                    .into_record(base_currency)
            })
            .await
            .map_err(AppError::from)
    }
}

// ============ News source ============

/// Client for newsapi.org `/v2/everything`.
pub struct NewsService {
    client: Client,
    base_url: String,
    api_key: String,
    breaker: UpstreamCircuitBreaker,
}

impl NewsService {
    pub fn new(config: &Config, client: Client) -> Self {
        Self {
            client,
            base_url: config.news_api_base_url.clone(),
            api_key: config.news_api_key.clone(),
            breaker: create_upstream_circuit_breaker(),
        }
    }

    /// English-language full-text search, capped at five articles.
    pub async fn search(&self, query: &str) -> Result<Vec<NewsArticleRecord>, AppError> {
        let page_size = MAX_NEWS_ARTICLES.to_string();
        let mut url = endpoint(&self.base_url, &["v2", "everything"])?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("language", "en")
            .append_pair("pageSize", &page_size)
            .append_pair("apiKey", &self.api_key);

        tracing::debug!(
            "Searching news: {}/v2/everything?q={}&language=en&pageSize={}&apiKey=[REDACTED]",
            self.base_url,
            query,
            page_size
        );

        self.breaker
            .call(async move {
                get_json::<NewsApiResponse>(&self.client, url, "News API")
                    .await?
                    .into_records()
            })
            .await
            .map_err(AppError::from)
    }
}
