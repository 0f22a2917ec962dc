use crate::{Settings, error::FetchError};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod forecast;
pub mod observation;

pub use forecast::ForecastFetcher;
pub use observation::ObservationFetcher;

/// The two kinds of data a view-model can poll for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKind {
    Observation,
    Forecast,
}

impl DataKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataKind::Observation => "observation",
            DataKind::Forecast => "forecast",
        }
    }
}

impl std::fmt::Display for DataKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds one endpoint's request and turns its response into a typed record.
#[async_trait]
pub trait Fetcher: Send + Sync + Debug + 'static {
    type Record: Clone + Debug + Send + Sync + 'static;

    fn kind(&self) -> DataKind;

    async fn fetch(&self, settings: &Settings) -> Result<Self::Record, FetchError>;
}
