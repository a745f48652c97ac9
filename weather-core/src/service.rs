use std::sync::Arc;

use tracing::{debug, instrument};

use crate::{
    aggregate::aggregate,
    error::ForecastError,
    model::{ForecastRequest, ForecastSummary},
    provider::ForecastProvider,
    validate::validate_days,
};

/// Validates the request, queries the provider once and aggregates the result.
#[derive(Debug, Clone)]
pub struct ForecastService {
    provider: Arc<dyn ForecastProvider>,
}

impl ForecastService {
    pub fn new(provider: Arc<dyn ForecastProvider>) -> Self {
        Self { provider }
    }

    /// Summary for `location` over the next `raw_days` days.
    ///
    /// Validation failures return before any network I/O.
    #[instrument(skip(self))]
    pub async fn summarize(
        &self,
        location: &str,
        raw_days: Option<&str>,
    ) -> Result<ForecastSummary, ForecastError> {
        let days = validate_days(raw_days).inspect_err(|e| debug!(error = %e, "rejected days"))?;

        let request = ForecastRequest { location: location.to_string(), days };
        let outcome = self.provider.fetch(&request).await;

        aggregate(outcome, days)
    }
}
