//! Failure taxonomy surfaced to clients.
//!
//! Each variant's `Display` is the exact public message; diagnostic detail
//! is logged where the failure is classified and never carried here.

use thiserror::Error;

/// Message used for every server-side failure.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error.";

/// Rejected `days` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Number of days has not been supplied.")]
    Missing,

    #[error("Invalid number of days provided.")]
    NotANumber,

    #[error("The API can only forecast up to 14 days.")]
    AboveMaximum,

    #[error("Number of days should range from 1 to 14.")]
    BelowMinimum,
}

/// Why a successful upstream response could not be reduced to a summary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedPayload {
    #[error("payload does not match the forecast shape: {0}")]
    Json(String),

    #[error("payload contains no forecast days")]
    NoDays,

    #[error("forecast day {day} has {found} hourly readings, expected 24")]
    HourCount { day: usize, found: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForecastError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No HTTP response at all (connect failure, timeout).
    #[error("Internal server error.")]
    Transport,

    /// Upstream answered with an error status; carries the provider's message.
    #[error("{0}")]
    Upstream(String),

    #[error("Internal server error.")]
    MalformedPayload,

    /// Anything else that went wrong while talking to the provider.
    #[error("Internal server error.")]
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    ClientError,
    ServerError,
}

impl StatusClass {
    pub fn http_status(self) -> u16 {
        match self {
            StatusClass::ClientError => 400,
            StatusClass::ServerError => 500,
        }
    }
}

impl ForecastError {
    pub fn status_class(&self) -> StatusClass {
        match self {
            // The provider wraps all of its business errors in 4xx responses.
            ForecastError::Validation(_) | ForecastError::Upstream(_) => StatusClass::ClientError,
            ForecastError::Transport | ForecastError::MalformedPayload | ForecastError::Internal => {
                StatusClass::ServerError
            }
        }
    }
}
