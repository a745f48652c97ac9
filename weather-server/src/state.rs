use std::sync::Arc;

use weather_core::ForecastService;

use crate::auth::Credentials;

/// Shared, read-only handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub service: ForecastService,
    pub credentials: Arc<Credentials>,
}

impl AppState {
    pub fn new(service: ForecastService, credentials: Credentials) -> Self {
        Self { service, credentials: Arc::new(credentials) }
    }
}
