use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::ErrorBody;
use service::UpstreamError;
use thiserror::Error;
use tracing::{error, info};

/// What a relay endpoint was fetching when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Weather,
    Background,
    Quote,
}

impl Resource {
    pub fn as_str(self) -> &'static str {
        match self {
            Resource::Weather => "weather",
            Resource::Background => "background",
            Resource::Quote => "quote",
        }
    }

    fn failure_message(self) -> &'static str {
        match self {
            Resource::Weather => "Unable to fetch weather data. Please try again later.",
            Resource::Background => "Unable to fetch background image. Please try again later.",
            Resource::Quote => "Unable to fetch quote. Please try again later.",
        }
    }

    fn unavailable_message(self) -> &'static str {
        match self {
            Resource::Weather => "Weather service is not configured.",
            Resource::Background => "Background service is not configured.",
            Resource::Quote => "Quote service is not configured.",
        }
    }
}

/// Client-facing failures. The `Display` text is exactly what goes on the wire.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("City parameter is required")]
    Validation,
    #[error("City not found. Please enter a valid city name.")]
    CityNotFound,
    #[error("{}", .0.failure_message())]
    Upstream(Resource),
    #[error("{}", .0.unavailable_message())]
    Unavailable(Resource),
    #[error("Not found")]
    RouteNotFound,
}

impl ApiError {
    /// Map an upstream failure for `resource`, logging the cause. Only weather
    /// distinguishes an unknown city.
    pub fn from_upstream(resource: Resource, err: UpstreamError) -> Self {
        match (resource, err) {
            (Resource::Weather, UpstreamError::NotFound) => {
                info!(resource = resource.as_str(), "upstream reported city not found");
                ApiError::CityNotFound
            }
            (_, UpstreamError::NotConfigured) => {
                error!(resource = resource.as_str(), "upstream credential not configured");
                ApiError::Unavailable(resource)
            }
            (_, err) => {
                error!(resource = resource.as_str(), kind = err.kind(), error = %err, "error fetching upstream data");
                ApiError::Upstream(resource)
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation => StatusCode::BAD_REQUEST,
            ApiError::CityNotFound | ApiError::RouteNotFound => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorBody::new(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weather_not_found_is_404() {
        let e = ApiError::from_upstream(Resource::Weather, UpstreamError::NotFound);
        assert_eq!(e.status(), StatusCode::NOT_FOUND);
        assert_eq!(e.to_string(), "City not found. Please enter a valid city name.");
    }

    #[test]
    fn background_not_found_is_generic_500() {
        let e = ApiError::from_upstream(Resource::Background, UpstreamError::NotFound);
        assert_eq!(e.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.to_string(), "Unable to fetch background image. Please try again later.");
    }

    #[test]
    fn upstream_detail_is_not_exposed() {
        let e = ApiError::from_upstream(
            Resource::Weather,
            UpstreamError::Status {
                status: StatusCode::UNAUTHORIZED,
                body: "Invalid API key".into(),
            },
        );
        assert_eq!(e.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!e.to_string().contains("Invalid API key"));
    }

    #[test]
    fn unconfigured_quote_is_503() {
        let e = ApiError::from_upstream(Resource::Quote, UpstreamError::NotConfigured);
        assert_eq!(e.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(e.to_string(), "Quote service is not configured.");
    }
}
