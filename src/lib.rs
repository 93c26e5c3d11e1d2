//! Random Profile Aggregation API Library
//!
//! Generates a random person and enriches it with country details, exchange
//! rates and news headlines from independent third-party APIs, served as one
//! JSON document.
//!
//! # Modules
//!
//! - `aggregator`: The request pipeline and its per-step fallbacks.
//! - `circuit_breaker`: Circuit breaker guarding each upstream.
//! - `config`: Configuration management.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers and router.
//! - `models`: Output contract served to the browser.
//! - `services`: Upstream API clients.
//! - `source_models`: Upstream response shapes and their normalization.

pub mod aggregator;
pub mod circuit_breaker;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;
pub mod source_models;
