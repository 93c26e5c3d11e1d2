use crate::aggregator::Aggregator;
use crate::config::Config;
use crate::errors::AppError;
use crate::models::*;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer, limit::RequestBodyLimitLayer, services::ServeDir, timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;

/// Shared application state injected into handlers.
pub struct AppState {
    /// Application configuration, immutable after startup.
    pub config: Config,
    /// The aggregation pipeline and its upstream clients.
    pub aggregator: Aggregator,
}

impl AppState {
    pub fn from_config(config: Config) -> Result<Self, AppError> {
        let aggregator = Aggregator::from_config(&config)?;
        Ok(Self { config, aggregator })
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(random_user, health),
    components(schemas(
        AggregateResponse,
        IdentityRecord,
        CountryRecord,
        ExchangeRateRecord,
        NewsArticleRecord,
        ErrorResponse
    )),
    tags((name = "profiles", description = "Random profile aggregation"))
)]
pub struct ApiDoc;

/// Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    tag = "profiles",
    responses((status = 200, description = "Service is up"))
)]
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// GET /api/random-user
///
/// Generates a random person and enriches it with country details, exchange
/// rates and news. Fails with the generic 500 body only when no identity could
/// be generated.
#[utoipa::path(
    get,
    path = "/api/random-user",
    tag = "profiles",
    responses(
        (status = 200, description = "Aggregated profile", body = AggregateResponse),
        (status = 500, description = "Identity source unavailable", body = ErrorResponse)
    )
)]
pub async fn random_user(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AggregateResponse>, AppError> {
    tracing::info!("GET /api/random-user");

    let response = state.aggregator.handle().await?;

    Ok(Json(response))
}

/// Serves the generated OpenAPI document.
async fn serve_openapi_spec() -> impl IntoResponse {
    match ApiDoc::openapi().to_pretty_json() {
        Ok(content) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            content,
        )
            .into_response(),
        Err(e) => AppError::InternalError(format!("Failed to render OpenAPI document: {}", e))
            .into_response(),
    }
}

/// Serves the Swagger UI HTML page pointed at `/api-docs/openapi.json`.
async fn serve_swagger_ui() -> impl IntoResponse {
    let html = r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Random Profile API - Swagger UI</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
    <style>
        body { margin: 0; padding: 0; }
    </style>
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script>
        window.onload = function() {
            window.ui = SwaggerUIBundle({
                url: "/api-docs/openapi.json",
                dom_id: '#swagger-ui',
                deepLinking: true
            });
        };
    </script>
</body>
</html>
"#;
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        html,
    )
}

/// Builds the application router.
///
/// Unmatched paths fall through to the static browser assets in
/// `config.static_dir` when that directory exists.
pub fn router(state: Arc<AppState>) -> Router {
    // Worst case is three sequential upstream calls plus one in parallel
    let request_timeout = Duration::from_secs(state.config.upstream_timeout_secs * 4);

    let mut app = Router::new()
        .route("/health", get(health))
        .route("/api/random-user", get(random_user))
        .route("/docs", get(serve_swagger_ui))
        .route("/api-docs/openapi.json", get(serve_openapi_spec));

    let static_dir = state.config.static_dir.clone();
    if Path::new(&static_dir).is_dir() {
        tracing::info!("Serving static assets from {}", static_dir);
        app = app.fallback_service(ServeDir::new(static_dir));
    }

    app.with_state(state)
        .layer(
            ServiceBuilder::new()
                // No endpoint takes a body
                .layer(RequestBodyLimitLayer::new(16 * 1024))
                .layer(TimeoutLayer::new(request_timeout)),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_document_lists_endpoint() {
        let doc = ApiDoc::openapi().to_pretty_json().unwrap();
        assert!(doc.contains("/api/random-user"));
        assert!(doc.contains("AggregateResponse"));
    }
}
