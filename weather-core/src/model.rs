use serde::{Deserialize, Serialize};

use crate::error::MalformedPayload;

/// Number of hourly readings the provider reports for every forecast day.
pub const HOURS_PER_DAY: usize = 24;

/// Number of forecast days, bounded to `DayCount::MIN..=DayCount::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DayCount(u8);

impl DayCount {
    pub const MIN: u8 = 1;
    /// The upstream API forecasts at most two weeks ahead.
    pub const MAX: u8 = 14;

    pub fn new(days: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&days).then_some(Self(days))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl std::fmt::Display for DayCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a provider is asked for.
#[derive(Debug, Clone)]
pub struct ForecastRequest {
    pub location: String,
    pub days: DayCount,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HourlyReading {
    /// Degrees Celsius.
    pub temperature: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastDay {
    pub max_temp: f64,
    pub min_temp: f64,
    /// Chronological, index 0 is the first hour of the day.
    pub hours: Vec<HourlyReading>,
}

/// Chronologically ordered forecast days, starting today.
///
/// Never empty, and every day carries exactly [`HOURS_PER_DAY`] readings.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSet {
    days: Vec<ForecastDay>,
}

impl ForecastSet {
    pub fn new(days: Vec<ForecastDay>) -> Result<Self, MalformedPayload> {
        if days.is_empty() {
            return Err(MalformedPayload::NoDays);
        }

        if let Some((index, day)) =
            days.iter().enumerate().find(|(_, d)| d.hours.len() != HOURS_PER_DAY)
        {
            return Err(MalformedPayload::HourCount { day: index, found: day.hours.len() });
        }

        Ok(Self { days })
    }

    pub fn days(&self) -> &[ForecastDay] {
        &self.days
    }

    /// Total number of hourly readings across all days.
    pub fn len(&self) -> usize {
        self.days.len() * HOURS_PER_DAY
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Reading at a (day, hour) position, if in range.
    pub fn reading(&self, day: usize, hour: usize) -> Option<HourlyReading> {
        self.days.get(day).and_then(|d| d.hours.get(hour)).copied()
    }

    /// All readings flattened, ordered by day then hour.
    pub fn readings(&self) -> impl Iterator<Item = HourlyReading> + '_ {
        self.days.iter().flat_map(|d| d.hours.iter().copied())
    }
}

/// Aggregated temperatures returned to the client.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastSummary {
    pub maximum: f64,
    pub minimum: f64,
    pub average: f64,
    pub median: f64,
}
