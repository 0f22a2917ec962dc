use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unit-dependent measurements of one observation.
///
/// The API nests these under a key named after the requested unit system
/// (`metric`, `imperial`, `uk_hybrid`, `metric_si`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitsData {
    pub temp: Option<f64>,
    pub heat_index: Option<f64>,
    pub dewpt: Option<f64>,
    pub wind_chill: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_gust: Option<f64>,
    pub pressure: Option<f64>,
    pub precip_rate: Option<f64>,
    pub precip_total: Option<f64>,
    #[serde(alias = "elevation")]
    pub elev: Option<f64>,
}

/// A single reading from a personal weather station.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationRecord {
    #[serde(rename = "stationID")]
    pub station_id: Option<String>,
    pub neighborhood: Option<String>,
    pub country: Option<String>,
    pub software_type: Option<String>,
    pub obs_time_local: Option<String>,
    pub obs_time_utc: Option<DateTime<Utc>>,
    pub epoch: Option<i64>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub realtime_frequency: Option<f64>,
    pub humidity: Option<f64>,
    pub uv: Option<f64>,
    pub winddir: Option<u16>,
    pub qc_status: Option<i32>,
    pub solar_radiation: Option<f64>,

    pub metric: Option<UnitsData>,
    pub imperial: Option<UnitsData>,
    #[serde(rename = "uk_hybrid")]
    pub uk_hybrid: Option<UnitsData>,
    #[serde(rename = "metric_si")]
    pub metric_si: Option<UnitsData>,
}

impl ObservationRecord {
    /// Whichever units block the server sent back.
    pub fn units(&self) -> Option<&UnitsData> {
        self.metric
            .as_ref()
            .or(self.imperial.as_ref())
            .or(self.uk_hybrid.as_ref())
            .or(self.metric_si.as_ref())
    }
}

/// Top-level body of the observations endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ObservationEnvelope {
    #[serde(default)]
    pub observations: Option<Vec<ObservationRecord>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub day_of_week: Option<String>,
    pub valid_time_local: Option<String>,
    pub temperature_max: Option<f64>,
    pub temperature_min: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyForecast {
    pub time: Option<String>,
    pub icon_code: Option<i32>,
    pub phrase: Option<String>,
    pub precip_chance: Option<f64>,
    pub precip_rate: Option<f64>,
}

/// Half-day ("Tonight", "Tomorrow", ...) forecast narrative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaypartForecast {
    pub name: Option<String>,
    pub icon_code: Option<i32>,
    pub narrative: Option<String>,
}

/// Predicted weather for the coming days and hours.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    pub days: Vec<DailyForecast>,
    pub hourly: Vec<HourlyForecast>,
    pub dayparts: Vec<DaypartForecast>,
}

impl ForecastRecord {
    /// Min/max of the first calendar day, if both are known.
    pub fn today_range(&self) -> Option<(f64, f64)> {
        let today = self.days.first()?;
        Some((today.temperature_min?, today.temperature_max?))
    }
}

// Wire shapes of the v3 forecast endpoints: every field is a parallel array
// indexed by day, daypart or hour, with `null` holes.

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyForecastPayload {
    #[serde(default)]
    pub day_of_week: Vec<Option<String>>,
    #[serde(default)]
    pub valid_time_local: Vec<Option<String>>,
    #[serde(default)]
    pub calendar_day_temperature_max: Vec<Option<f64>>,
    #[serde(default)]
    pub calendar_day_temperature_min: Vec<Option<f64>>,
    #[serde(default)]
    pub daypart: Vec<DaypartPayload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaypartPayload {
    #[serde(default)]
    pub daypart_name: Vec<Option<String>>,
    #[serde(default)]
    pub icon_code: Vec<Option<i32>>,
    #[serde(default)]
    pub narrative: Vec<Option<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyForecastPayload {
    #[serde(default)]
    pub valid_time_local: Vec<Option<String>>,
    #[serde(default)]
    pub icon_code: Vec<Option<i32>>,
    #[serde(default)]
    pub wx_phrase_long: Vec<Option<String>>,
    #[serde(default)]
    pub precip_chance: Vec<Option<f64>>,
    #[serde(default)]
    pub qpf: Vec<Option<f64>>,
}

fn column<T: Clone>(values: &[Option<T>], index: usize) -> Option<T> {
    values.get(index).cloned().flatten()
}

impl DailyForecastPayload {
    pub fn is_empty(&self) -> bool {
        self.calendar_day_temperature_max.is_empty() && self.calendar_day_temperature_min.is_empty()
    }

    pub fn days(&self) -> Vec<DailyForecast> {
        let len = self
            .calendar_day_temperature_max
            .len()
            .max(self.calendar_day_temperature_min.len());

        (0..len)
            .map(|i| DailyForecast {
                day_of_week: column(&self.day_of_week, i),
                valid_time_local: column(&self.valid_time_local, i),
                temperature_max: column(&self.calendar_day_temperature_max, i),
                temperature_min: column(&self.calendar_day_temperature_min, i),
            })
            .collect()
    }

    /// Dayparts without a name are slots the API has already passed (e.g. "Today" in the evening).
    pub fn dayparts(&self) -> Vec<DaypartForecast> {
        let Some(part) = self.daypart.first() else {
            return Vec::new();
        };

        (0..part.daypart_name.len())
            .filter_map(|i| {
                let name = column(&part.daypart_name, i)?;
                Some(DaypartForecast {
                    name: Some(name),
                    icon_code: column(&part.icon_code, i),
                    narrative: column(&part.narrative, i),
                })
            })
            .collect()
    }
}

impl HourlyForecastPayload {
    pub fn hours(&self) -> Vec<HourlyForecast> {
        (0..self.valid_time_local.len())
            .map(|i| HourlyForecast {
                time: column(&self.valid_time_local, i),
                icon_code: column(&self.icon_code, i),
                phrase: column(&self.wx_phrase_long, i),
                precip_chance: column(&self.precip_chance, i),
                precip_rate: column(&self.qpf, i),
            })
            .collect()
    }
}
