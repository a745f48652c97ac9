use axum::{
    Json, Router,
    extract::{Path, Query, State},
    middleware,
    routing::get,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use weather_core::ForecastSummary;

use crate::{auth::require_basic_auth, error::ApiError, state::AppState};

/// The last `days` value in the query string, if any.
///
/// Left as text so the validator can tell "missing" from "not a number".
fn days_param(pairs: &[(String, String)]) -> Option<&str> {
    pairs.iter().rev().find(|(name, _)| name == "days").map(|(_, value)| value.as_str())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/locations/{city}", get(forecast_summary))
        .route("/locations/{city}/", get(forecast_summary))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_basic_auth));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `GET /api/locations/{city}/?days=N`
async fn forecast_summary(
    State(state): State<AppState>,
    Path(city): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<ForecastSummary>, ApiError> {
    let summary = state.service.summarize(&city, days_param(&pairs)).await?;
    Ok(Json(summary))
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
