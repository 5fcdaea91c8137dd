use axum::{
    extract::{MatchedPath, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{error, Level};

use common::types::Health;
use service::observability::{encode_metrics, RELAY_REQUESTS_TOTAL};
use service::{BackgroundImage, Quote, WeatherReport};

use crate::errors::{ApiError, Resource};
use crate::state::AppState;

pub const WELCOME: &str = "Welcome to the Weather App API";

#[derive(Debug, Default, Deserialize)]
pub struct CityQuery {
    #[serde(default)]
    pub city: Option<String>,
}

impl CityQuery {
    /// Trimmed, non-empty city name.
    pub fn city(&self) -> Result<&str, ApiError> {
        self.city
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(ApiError::Validation)
    }
}

/// A query string that fails to parse counts as a missing city.
fn city_param(query: &Option<Query<CityQuery>>) -> Result<&str, ApiError> {
    match query {
        Some(Query(q)) => q.city(),
        None => Err(ApiError::Validation),
    }
}

pub async fn root() -> &'static str {
    WELCOME
}

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

pub async fn metrics() -> Response {
    match encode_metrics() {
        Ok(body) => (StatusCode::OK, [(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body).into_response(),
        Err(e) => {
            error!(error = %e, "metrics encode error");
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encode error").into_response()
        }
    }
}

pub async fn weather(
    State(state): State<AppState>,
    query: Option<Query<CityQuery>>,
) -> Result<Json<WeatherReport>, ApiError> {
    let city = city_param(&query)?;
    let report = state
        .upstreams
        .weather
        .current(city)
        .await
        .map_err(|e| ApiError::from_upstream(Resource::Weather, e))?;
    Ok(Json(report))
}

pub async fn background(
    State(state): State<AppState>,
    query: Option<Query<CityQuery>>,
) -> Result<Json<BackgroundImage>, ApiError> {
    let city = city_param(&query)?;
    let image = state
        .upstreams
        .photo
        .random_for(city)
        .await
        .map_err(|e| ApiError::from_upstream(Resource::Background, e))?;
    Ok(Json(image))
}

pub async fn quote(State(state): State<AppState>) -> Result<Json<Quote>, ApiError> {
    let quote = state
        .upstreams
        .quote
        .random()
        .await
        .map_err(|e| ApiError::from_upstream(Resource::Quote, e))?;
    Ok(Json(quote))
}

async fn not_found() -> ApiError {
    ApiError::RouteNotFound
}

/// Count API responses by matched route and status.
async fn track_requests(req: Request, next: Next) -> Response {
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());
    let res = next.run(req).await;
    RELAY_REQUESTS_TOTAL
        .with_label_values(&[endpoint.as_str(), res.status().as_str()])
        .inc();
    res
}

/// Build the full application router: public routes plus the relay API.
pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/metrics", get(metrics));

    let api = Router::new()
        .route("/api/weather", get(weather))
        .route("/api/background", get(background))
        .route("/api/quote", get(quote))
        .route_layer(middleware::from_fn(track_requests));

    public
        .merge(api)
        .fallback(not_found)
        .with_state(state)
        .layer(CompressionLayer::new())
        .layer(CorsLayer::very_permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                // 5xx logged at ERROR
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
