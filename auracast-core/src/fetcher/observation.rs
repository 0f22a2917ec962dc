use async_trait::async_trait;

use crate::{
    Settings,
    error::FetchError,
    http::HttpJsonClient,
    model::{ObservationEnvelope, ObservationRecord},
};

use super::{DataKind, Fetcher};

pub const OBSERVATIONS_URL: &str = "https://api.weather.com/v2/pws/observations/current";

/// Current conditions of one personal weather station.
#[derive(Debug, Clone)]
pub struct ObservationFetcher {
    client: HttpJsonClient,
    base_url: String,
}

impl Default for ObservationFetcher {
    fn default() -> Self {
        Self::new(HttpJsonClient::new())
    }
}

impl ObservationFetcher {
    pub fn new(client: HttpJsonClient) -> Self {
        Self { client, base_url: OBSERVATIONS_URL.to_string() }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl Fetcher for ObservationFetcher {
    type Record = ObservationRecord;

    fn kind(&self) -> DataKind {
        DataKind::Observation
    }

    async fn fetch(&self, settings: &Settings) -> Result<ObservationRecord, FetchError> {
        let subject = format!("station {}", settings.station_id);

        let envelope: ObservationEnvelope = self
            .client
            .fetch_json(
                &self.base_url,
                &[
                    ("stationId", settings.station_id.as_str()),
                    ("format", "json"),
                    ("units", settings.units.code()),
                    ("apiKey", settings.api_key.as_str()),
                ],
                &subject,
            )
            .await?;

        // The API always answers with an array, normally holding one reading.
        envelope
            .observations
            .and_then(|list| list.into_iter().next())
            .ok_or(FetchError::EmptyResult(subject))
    }
}
