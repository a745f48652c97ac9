//! Core library for the weather forecast service.
//!
//! This crate defines:
//! - Validation of the requested number of forecast days
//! - Aggregation of a WeatherAPI.com forecast into max/min/average/median temperatures
//! - Classification of upstream failures into client-facing errors
//! - Configuration & credentials handling
//!
//! It is used by `weather-server` and `weather-cli`.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod service;
pub mod validate;

pub use aggregate::aggregate;
pub use config::{Config, ProviderConfig, ServerConfig, UserConfig};
pub use error::{ForecastError, StatusClass, ValidationError};
pub use model::{DayCount, ForecastRequest, ForecastSummary};
pub use provider::{ForecastProvider, UpstreamOutcome, provider_from_config};
pub use service::ForecastService;
pub use validate::validate_days;
