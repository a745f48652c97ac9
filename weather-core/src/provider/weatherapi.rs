use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::{model::ForecastRequest, provider::UpstreamOutcome};

use super::ForecastProvider;

/// Client for `http://api.weatherapi.com/v1/forecast.json`.
#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherApiProvider {
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for WeatherAPI.com")?;

        Ok(Self { api_key, base_url, http })
    }
}

#[async_trait]
impl ForecastProvider for WeatherApiProvider {
    #[instrument(skip(self), fields(location = %request.location, days = %request.days))]
    async fn fetch(&self, request: &ForecastRequest) -> UpstreamOutcome {
        let days = request.days.to_string();

        let res = match self
            .http
            .get(&self.base_url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("days", days.as_str()),
                ("q", request.location.as_str()),
            ])
            .send()
            .await
        {
            Ok(res) => res,
            Err(e) => return classify_error(e),
        };

        let status = res.status();

        if !status.is_success() {
            let reason = status
                .canonical_reason()
                .map_or_else(|| status.as_str().to_string(), str::to_string);
            let body = res.text().await.ok().filter(|b| !b.is_empty());

            debug!(
                status = status.as_u16(),
                body = %body.as_deref().map(truncate_body).unwrap_or_default(),
                "WeatherAPI forecast request failed"
            );

            return UpstreamOutcome::HttpError { status: status.as_u16(), reason, body };
        }

        match res.text().await {
            Ok(body) => UpstreamOutcome::Payload(body),
            Err(e) => classify_error(e),
        }
    }
}

/// Connection, timeout and I/O failures mean no usable response arrived.
fn classify_error(err: reqwest::Error) -> UpstreamOutcome {
    let transport = err.is_connect() || err.is_timeout() || err.is_request() || err.is_body();
    // The URL carries the API key in its query string.
    let detail = err.without_url().to_string();

    if transport {
        UpstreamOutcome::Transport { detail }
    } else {
        UpstreamOutcome::Unexpected { detail }
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
