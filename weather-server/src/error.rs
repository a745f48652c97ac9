//! Mapping of classified failures to HTTP responses.
//!
//! Forecast failures are returned as a bare JSON string holding the public
//! message; the underlying cause has already been logged by the core.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::WWW_AUTHENTICATE},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use weather_core::ForecastError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Forecast(#[from] ForecastError),

    #[error("{0}")]
    Unauthorized(&'static str),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Forecast(err) => {
                let status = StatusCode::from_u16(err.status_class().http_status())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                (status, Json(err.to_string())).into_response()
            }
            ApiError::Unauthorized(detail) => {
                let mut response =
                    (StatusCode::UNAUTHORIZED, Json(json!({ "detail": detail }))).into_response();
                response
                    .headers_mut()
                    .insert(WWW_AUTHENTICATE, HeaderValue::from_static(r#"Basic realm="api""#));
                response
            }
        }
    }
}
