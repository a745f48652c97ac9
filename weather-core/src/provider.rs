use crate::{ForecastRequest, config::Config, provider::weatherapi::WeatherApiProvider};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod weatherapi;

/// Raw result of a single upstream forecast request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamOutcome {
    /// 2xx response with its body.
    Payload(String),

    /// No HTTP response at all: connection refused, DNS failure, timeout.
    Transport { detail: String },

    /// Non-2xx response.
    HttpError {
        status: u16,
        /// Canonical reason phrase for `status`, e.g. "Not Found"; the
        /// phrase on the upstream status line is not used.
        reason: String,
        body: Option<String>,
    },

    /// Any other failure while building or performing the request.
    Unexpected { detail: String },
}

/// A forecast source. Implementations report every outcome as an
/// [`UpstreamOutcome`] variant instead of failing, and make one attempt
/// per call.
#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    async fn fetch(&self, request: &ForecastRequest) -> UpstreamOutcome;
}

/// Construct the weatherapi.com provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn ForecastProvider>> {
    let api_key = config.api_key()?;
    let provider = WeatherApiProvider::new(
        api_key.to_owned(),
        config.provider.base_url.clone(),
        config.provider.timeout(),
    )?;

    Ok(Box::new(provider))
}
