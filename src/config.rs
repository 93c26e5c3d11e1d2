use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Which country-information provider backs the country lookup step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountryProviderKind {
    /// api.countrylayer.com, requires an access key.
    CountryLayer,
    /// restcountries.com, keyless.
    RestCountries,
}

impl FromStr for CountryProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "countrylayer" => Ok(Self::CountryLayer),
            "restcountries" => Ok(Self::RestCountries),
            other => anyhow::bail!(
                "COUNTRY_PROVIDER must be 'countrylayer' or 'restcountries', got '{}'",
                other
            ),
        }
    }
}

impl fmt::Display for CountryProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CountryLayer => write!(f, "countrylayer"),
            Self::RestCountries => write!(f, "restcountries"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub country_provider: CountryProviderKind,
    pub countrylayer_api_key: Option<String>,
    pub exchange_rate_api_key: String,
    pub news_api_key: String,
    pub randomuser_base_url: String,
    pub countrylayer_base_url: String,
    pub restcountries_base_url: String,
    pub exchange_rate_base_url: String,
    pub news_api_base_url: String,
    pub upstream_timeout_secs: u64,
    pub static_dir: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let country_provider: CountryProviderKind = std::env::var("COUNTRY_PROVIDER")
            .unwrap_or_else(|_| "countrylayer".to_string())
            .parse()?;

        let countrylayer_api_key = std::env::var("COUNTRYLAYER_API_KEY")
            .ok()
            .filter(|s| !s.trim().is_empty());
        if country_provider == CountryProviderKind::CountryLayer && countrylayer_api_key.is_none()
        {
            anyhow::bail!("COUNTRYLAYER_API_KEY is required when COUNTRY_PROVIDER=countrylayer");
        }

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            country_provider,
            countrylayer_api_key,
            exchange_rate_api_key: required_secret("EXCHANGE_RATE_API_KEY")?,
            news_api_key: required_secret("NEWS_API_KEY")?,
            randomuser_base_url: base_url("RANDOMUSER_BASE_URL", "https://randomuser.me")?,
            countrylayer_base_url: base_url(
                "COUNTRYLAYER_BASE_URL",
                "https://api.countrylayer.com",
            )?,
            restcountries_base_url: base_url(
                "RESTCOUNTRIES_BASE_URL",
                "https://restcountries.com",
            )?,
            exchange_rate_base_url: base_url(
                "EXCHANGE_RATE_BASE_URL",
                "https://v6.exchangerate-api.com",
            )?,
            news_api_base_url: base_url("NEWS_API_BASE_URL", "https://newsapi.org")?,
            upstream_timeout_secs: std::env::var("UPSTREAM_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    anyhow::anyhow!("UPSTREAM_TIMEOUT_SECS must be a positive number of seconds")
                })?,
            static_dir: std::env::var("STATIC_DIR")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "public".to_string()),
        };

        // Never log the secrets themselves
        tracing::debug!("Country provider: {}", config.country_provider);
        tracing::debug!("Random user base URL: {}", config.randomuser_base_url);
        tracing::debug!("Exchange rate base URL: {}", config.exchange_rate_base_url);
        tracing::debug!("News API base URL: {}", config.news_api_base_url);
        tracing::debug!("Upstream timeout: {}s", config.upstream_timeout_secs);
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}

fn required_secret(name: &str) -> anyhow::Result<String> {
    std::env::var(name)
        .map_err(|_| anyhow::anyhow!("{} environment variable required", name))
        .and_then(|value| {
            if value.trim().is_empty() {
                anyhow::bail!("{} cannot be empty", name);
            }
            Ok(value)
        })
}

fn base_url(name: &str, default: &str) -> anyhow::Result<String> {
    let url = std::env::var(name)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default.to_string());
    validate_base_url(name, &url)?;
    Ok(url.trim_end_matches('/').to_string())
}

/// Checks that an upstream base URL is an absolute http(s) URL.
pub fn validate_base_url(name: &str, url: &str) -> anyhow::Result<()> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        anyhow::bail!("{} must start with http:// or https://", name);
    }
    url::Url::parse(url).map_err(|e| anyhow::anyhow!("{} is not a valid URL: {}", name, e))?;
    Ok(())
}
