//! Shared fixtures for tests that run the pipeline against mocked upstreams.
#![allow(dead_code)]

use rust_random_profile_api::config::{Config, CountryProviderKind};
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const COUNTRY_KEY: &str = "test_country_key";
pub const EXCHANGE_KEY: &str = "test_exchange_key";
pub const NEWS_KEY: &str = "test_news_key";

/// Config with every upstream pointed at the same mock server.
pub fn create_test_config(base_url: String, provider: CountryProviderKind) -> Config {
    Config {
        port: 8080,
        country_provider: provider,
        countrylayer_api_key: Some(COUNTRY_KEY.to_string()),
        exchange_rate_api_key: EXCHANGE_KEY.to_string(),
        news_api_key: NEWS_KEY.to_string(),
        randomuser_base_url: base_url.clone(),
        countrylayer_base_url: base_url.clone(),
        restcountries_base_url: base_url.clone(),
        exchange_rate_base_url: base_url.clone(),
        news_api_base_url: base_url,
        upstream_timeout_secs: 2,
        static_dir: "does-not-exist".to_string(),
    }
}

pub fn random_user_body(country: &str) -> Value {
    json!({
        "results": [{
            "gender": "male",
            "name": { "title": "Mr", "first": "Nurlan", "last": "Abenov" },
            "location": {
                "street": { "number": 118, "name": "Dostyk Street" },
                "city": "Astana",
                "state": "Akmola",
                "country": country,
                "postcode": 10000
            },
            "email": "nurlan.abenov@example.com",
            "dob": { "date": "1990-05-14T08:31:07.512Z", "age": 36 },
            "picture": {
                "large": "https://randomuser.me/api/portraits/men/41.jpg",
                "medium": "https://randomuser.me/api/portraits/med/men/41.jpg",
                "thumbnail": "https://randomuser.me/api/portraits/thumb/men/41.jpg"
            },
            "nat": "KZ"
        }],
        "info": { "seed": "abc", "results": 1, "page": 1, "version": "1.4" }
    })
}

pub fn countrylayer_body(name: &str, currency: &str) -> Value {
    json!([{
        "name": name,
        "capital": "Astana",
        "languages": [
            { "iso639_1": "kk", "name": "Kazakh" },
            { "iso639_1": "ru", "name": "Russian" }
        ],
        "currencies": [{ "code": currency, "name": "Kazakhstani tenge", "symbol": "₸" }],
        "flag": "https://restcountries.eu/data/kaz.svg"
    }])
}

pub fn news_body(count: usize) -> Value {
    let articles: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "source": { "id": null, "name": "Example Wire" },
                "title": format!("Headline {}", i),
                "description": format!("Summary {}", i),
                "url": format!("https://news.example/articles/{}", i),
                "urlToImage": format!("https://news.example/images/{}.jpg", i)
            })
        })
        .collect();
    json!({ "status": "ok", "totalResults": count, "articles": articles })
}

pub async fn mount_identity(server: &MockServer, country: &str) {
    Mock::given(method("GET"))
        .and(path("/api/"))
        .and(query_param("results", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(random_user_body(country)))
        .expect(1)
        .mount(server)
        .await;
}

pub async fn mount_news(server: &MockServer, query: &str, count: usize) {
    Mock::given(method("GET"))
        .and(path("/v2/everything"))
        .and(query_param("q", query))
        .and(query_param("language", "en"))
        .and(query_param("pageSize", "5"))
        .and(query_param("apiKey", NEWS_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(news_body(count)))
        .mount(server)
        .await;
}
