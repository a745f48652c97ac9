//! Reduction of an upstream forecast response to a [`ForecastSummary`].
//!
//! Every upstream outcome ends up either as a summary or as one of the
//! classified [`ForecastError`]s; nothing here panics on bad input.

use serde::Deserialize;
use tracing::{debug, error, warn};

use crate::{
    error::{ForecastError, MalformedPayload},
    model::{DayCount, ForecastDay, ForecastSet, ForecastSummary, HOURS_PER_DAY, HourlyReading},
    provider::UpstreamOutcome,
};

/// Classify an upstream outcome, computing the summary on success.
///
/// `requested` is only compared against the number of days received; a
/// provider on a limited plan may return fewer days and that still succeeds.
pub fn aggregate(
    outcome: UpstreamOutcome,
    requested: DayCount,
) -> Result<ForecastSummary, ForecastError> {
    match outcome {
        UpstreamOutcome::Transport { detail } => {
            warn!(%detail, "forecast provider unreachable");
            Err(ForecastError::Transport)
        }
        UpstreamOutcome::HttpError { status, reason, body } => {
            let message = business_message(&reason, body.as_deref());
            warn!(status, %reason, %message, "forecast provider returned an error status");
            Err(ForecastError::Upstream(message))
        }
        UpstreamOutcome::Unexpected { detail } => {
            error!(fatal = true, %detail, "unexpected failure while querying forecast provider");
            Err(ForecastError::Internal)
        }
        UpstreamOutcome::Payload(body) => match parse_forecast(&body) {
            Ok(set) => {
                if let Some(received) = day_count_mismatch(&set, requested) {
                    debug!(
                        requested = requested.get(),
                        received, "provider returned a different number of days"
                    );
                }
                Ok(summarize(&set))
            }
            Err(e) => {
                error!(error = %e, "cannot build forecast summary from provider payload");
                Err(ForecastError::MalformedPayload)
            }
        },
    }
}

/// The provider's business message at `error.message`, or the HTTP reason
/// phrase when the body is missing, not JSON, or has no usable message.
pub fn business_message(reason: &str, body: Option<&str>) -> String {
    body.and_then(|b| serde_json::from_str::<WaErrorResponse>(b).ok())
        .and_then(|r| r.error)
        .and_then(|e| e.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| reason.to_string())
}

/// Decode a weatherapi.com `forecast.json` body into a validated set.
pub fn parse_forecast(body: &str) -> Result<ForecastSet, MalformedPayload> {
    let parsed: WaForecastResponse =
        serde_json::from_str(body).map_err(|e| MalformedPayload::Json(e.to_string()))?;

    let days = parsed
        .forecast
        .forecastday
        .into_iter()
        .map(|d| ForecastDay {
            max_temp: d.day.maxtemp_c,
            min_temp: d.day.mintemp_c,
            hours: d.hour.into_iter().map(|h| HourlyReading { temperature: h.temp_c }).collect(),
        })
        .collect();

    ForecastSet::new(days)
}

/// Number of days received, when it differs from the number requested.
fn day_count_mismatch(set: &ForecastSet, requested: DayCount) -> Option<usize> {
    let received = set.days().len();
    (received != usize::from(requested.get())).then_some(received)
}

/// Maximum and minimum come from the day-level fields; average and median
/// from the flattened hourly readings.
///
/// The median always averages two neighbouring readings around position
/// `N / 2`, whatever the parity of `N`.
pub fn summarize(set: &ForecastSet) -> ForecastSummary {
    let maximum = set.days().iter().map(|d| d.max_temp).fold(f64::NEG_INFINITY, f64::max);
    let minimum = set.days().iter().map(|d| d.min_temp).fold(f64::INFINITY, f64::min);

    let count = set.len();
    let sum: f64 = set.readings().map(|r| r.temperature).sum();
    let average = sum / count as f64;

    let [(d1, h1), (d2, h2)] = median_positions(count);
    let median = match (set.reading(d1, h1), set.reading(d2, h2)) {
        (Some(a), Some(b)) => (a.temperature + b.temperature) / 2.0,
        // A validated set always holds both positions.
        _ => f64::NAN,
    };

    debug!(days = set.days().len(), readings = count, "forecast summarized");

    ForecastSummary {
        maximum: round1(maximum),
        minimum: round1(minimum),
        average: round1(average),
        median: round1(median),
    }
}

/// The (day, hour) pair of the two readings averaged into the median.
fn median_positions(count: usize) -> [(usize, usize); 2] {
    let mid = count / 2;
    let (day, hour) = (mid / HOURS_PER_DAY, mid % HOURS_PER_DAY);

    if hour == 0 {
        [(day.saturating_sub(1), HOURS_PER_DAY - 1), (day, 0)]
    } else {
        [(day, hour - 1), (day, hour)]
    }
}

/// One decimal place, half away from zero.
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[derive(Debug, Deserialize)]
struct WaDay {
    maxtemp_c: f64,
    mintemp_c: f64,
}

#[derive(Debug, Deserialize)]
struct WaHour {
    temp_c: f64,
}

#[derive(Debug, Deserialize)]
struct WaForecastDay {
    day: WaDay,
    hour: Vec<WaHour>,
}

#[derive(Debug, Deserialize)]
struct WaForecast {
    forecastday: Vec<WaForecastDay>,
}

#[derive(Debug, Deserialize)]
struct WaForecastResponse {
    forecast: WaForecast,
}

#[derive(Debug, Deserialize)]
struct WaError {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WaErrorResponse {
    error: Option<WaError>,
}
