//! Random profile aggregation pipeline.
//!
//! One inbound request runs five steps:
//! 1. Fetch a random identity (the only fatal step)
//! 2. Look up the identity's country
//! 3. Fetch exchange rates for the country's currency, if it has one
//! 4. Search news mentioning the country
//! 5. Assemble the aggregate response
//!
//! Steps 2-4 each sit behind their own failure boundary and substitute a
//! fallback value instead of failing the request. Steps 3 and 4 only depend
//! on step 2 and step 1 respectively, so they run concurrently.

use crate::config::Config;
use crate::errors::{AppError, ResultExt};
use crate::models::{AggregateResponse, CountryRecord, ExchangeRateRecord, NewsArticleRecord};
use crate::services::{
    build_http_client, CountryService, ExchangeRateService, IdentityService, NewsService,
};

pub struct Aggregator {
    identity: IdentityService,
    country: CountryService,
    exchange_rates: ExchangeRateService,
    news: NewsService,
}

impl Aggregator {
    /// Wires one client per upstream from the immutable configuration.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let client = build_http_client(config)?;

        Ok(Self {
            identity: IdentityService::new(config, client.clone()),
            country: CountryService::from_config(config, client.clone())?,
            exchange_rates: ExchangeRateService::new(config, client.clone()),
            news: NewsService::new(config, client),
        })
    }

    /// Builds one aggregate response.
    ///
    /// Only an identity failure surfaces as `Err`; the caller turns it into
    /// the generic failure body.
    #[tracing::instrument(
        name = "aggregate_random_user",
        skip(self),
        fields(request_id = %uuid::Uuid::new_v4())
    )]
    pub async fn handle(&self) -> Result<AggregateResponse, AppError> {
        let user = self
            .identity
            .fetch_identity()
            .await
            .context("Identity lookup failed")?;

        tracing::info!(
            "Generated identity {} {} from {}",
            user.first_name,
            user.last_name,
            user.country
        );

        let country = self.lookup_country(&user.country).await;

        let (exchange_rates, news) = tokio::join!(
            self.lookup_exchange_rates(country.currency.as_deref()),
            self.lookup_news(&user.country)
        );

        tracing::info!(
            "Aggregate assembled: currency={:?}, exchange_rates={}, news_articles={}",
            country.currency,
            exchange_rates.is_some(),
            news.len()
        );

        Ok(AggregateResponse {
            success: true,
            user,
            country,
            exchange_rates,
            news,
        })
    }

    async fn lookup_country(&self, country_name: &str) -> CountryRecord {
        match self.country.lookup(country_name).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                tracing::warn!(
                    "Country provider {} has no match for '{}', using degraded record",
                    self.country.provider(),
                    country_name
                );
                CountryRecord::degraded(country_name)
            }
            Err(e) => {
                tracing::warn!(
                    "Country provider {} failed for '{}': {}",
                    self.country.provider(),
                    country_name,
                    e
                );
                CountryRecord::degraded(country_name)
            }
        }
    }

    /// `None` only when there is no currency; the step is then never attempted.
    async fn lookup_exchange_rates(&self, currency: Option<&str>) -> Option<ExchangeRateRecord> {
        let currency = match currency {
            Some(code) => code,
            None => {
                tracing::debug!("No currency resolved, skipping exchange rate lookup");
                return None;
            }
        };

        match self.exchange_rates.fetch_rates(currency).await {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Exchange rate lookup failed for {}: {}", currency, e);
                Some(ExchangeRateRecord::unavailable(currency))
            }
        }
    }

    async fn lookup_news(&self, country_name: &str) -> Vec<NewsArticleRecord> {
        self.news.search(country_name).await.unwrap_or_else(|e| {
            tracing::warn!("News lookup failed for '{}': {}", country_name, e);
            Vec::new()
        })
    }
}
