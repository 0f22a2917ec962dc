//! Core library for AuraCast.
//!
//! This crate defines:
//! - Configuration and the settings provider read on every fetch
//! - Fetchers for personal-weather-station observations and forecasts
//! - The polling controller and the observable view-model state it publishes
//!
//! It is used by `auracast-cli`, but any front-end can drive the view-models
//! through their `attach` / `detach` hooks.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod http;
pub mod model;
pub mod polling;
pub mod state;
pub mod view_model;

pub use config::{Config, FileSettings, Settings, SettingsProvider, UnitSystem};
pub use error::FetchError;
pub use fetcher::{DataKind, Fetcher, ForecastFetcher, ObservationFetcher};
pub use http::HttpJsonClient;
pub use model::{
    DailyForecast, DaypartForecast, ForecastRecord, HourlyForecast, ObservationRecord, UnitsData,
};
pub use polling::{DEFAULT_POLL_INTERVAL, PollingController, RefreshOutcome};
pub use state::{FetchState, ViewModelState};
pub use view_model::{ForecastViewModel, ViewModel, WeatherViewModel};
