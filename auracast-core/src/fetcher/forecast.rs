use async_trait::async_trait;

use crate::{
    Settings,
    error::FetchError,
    http::HttpJsonClient,
    model::{DailyForecastPayload, ForecastRecord, HourlyForecastPayload},
};

use super::{DataKind, Fetcher};

pub const DAILY_FORECAST_URL: &str = "https://api.weather.com/v3/wx/forecast/daily/5day";
pub const HOURLY_FORECAST_URL: &str = "https://api.weather.com/v3/wx/forecast/hourly/2day";

/// Five-day forecast plus the short-range hourly outlook for a geocode.
#[derive(Debug, Clone)]
pub struct ForecastFetcher {
    client: HttpJsonClient,
    daily_url: String,
    hourly_url: String,
}

impl Default for ForecastFetcher {
    fn default() -> Self {
        Self::new(HttpJsonClient::new())
    }
}

impl ForecastFetcher {
    pub fn new(client: HttpJsonClient) -> Self {
        Self {
            client,
            daily_url: DAILY_FORECAST_URL.to_string(),
            hourly_url: HOURLY_FORECAST_URL.to_string(),
        }
    }

    /// Point both endpoints at `base_url`, under `/daily` and `/hourly`.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base = base_url.into();
        let base = base.trim_end_matches('/');
        self.daily_url = format!("{base}/daily");
        self.hourly_url = format!("{base}/hourly");
        self
    }
}

#[async_trait]
impl Fetcher for ForecastFetcher {
    type Record = ForecastRecord;

    fn kind(&self) -> DataKind {
        DataKind::Forecast
    }

    async fn fetch(&self, settings: &Settings) -> Result<ForecastRecord, FetchError> {
        let geocode = settings.geocode.as_deref().ok_or_else(|| {
            FetchError::NotConfigured(
                "no geocode for the forecast. Hint: run `auracast configure` first.".to_string(),
            )
        })?;
        let subject = format!("location {geocode}");
        let query = [
            ("geocode", geocode),
            ("format", "json"),
            ("units", settings.units.code()),
            ("language", settings.language.as_str()),
            ("apiKey", settings.api_key.as_str()),
        ];

        // Sequential on purpose: a controller never has two requests outstanding.
        let daily: DailyForecastPayload =
            self.client.fetch_json(&self.daily_url, &query, &subject).await?;
        if daily.is_empty() {
            return Err(FetchError::EmptyResult(subject));
        }

        let hourly: HourlyForecastPayload =
            match self.client.fetch_json(&self.hourly_url, &query, &subject).await {
                Ok(hourly) => hourly,
                Err(FetchError::EmptyResult(_)) => HourlyForecastPayload::default(),
                Err(e) => return Err(e),
            };

        Ok(ForecastRecord {
            days: daily.days(),
            hourly: hourly.hours(),
            dayparts: daily.dayparts(),
        })
    }
}
