//! Plain-text rendering of view-model state.

use std::fmt::Write;

use auracast_core::{FetchState, ForecastRecord, ObservationRecord, UnitSystem};
use chrono::Local;

const NA: &str = "N/A";

fn num(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(|| NA.to_string(), |v| format!("{v:.decimals$}"))
}

fn text(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or(NA)
}

fn speed_unit(units: UnitSystem) -> &'static str {
    match units {
        UnitSystem::Metric => "km/h",
        UnitSystem::Imperial | UnitSystem::UkHybrid => "mph",
        UnitSystem::MetricSi => "m/s",
    }
}

fn precip_unit(units: UnitSystem) -> &'static str {
    match units {
        UnitSystem::Imperial => "in",
        _ => "mm",
    }
}

pub fn observation(obs: &ObservationRecord, units: UnitSystem) -> String {
    let deg = units.temperature_suffix();
    let mut out = String::new();

    let _ = writeln!(out, "Station:     {}", text(obs.station_id.as_deref()));
    let _ = writeln!(
        out,
        "Location:    {}, {}",
        text(obs.neighborhood.as_deref()),
        text(obs.country.as_deref())
    );
    let _ = writeln!(out, "Local time:  {}", text(obs.obs_time_local.as_deref()));
    let _ = writeln!(out, "Humidity:    {} %", num(obs.humidity, 0));
    let _ = writeln!(out, "UV index:    {}", num(obs.uv, 1));
    let _ = writeln!(
        out,
        "Wind dir:    {}",
        obs.winddir.map_or_else(|| NA.to_string(), |d| format!("{d}°"))
    );

    match obs.units() {
        Some(u) => {
            let speed = speed_unit(units);
            let precip = precip_unit(units);
            let _ = writeln!(out, "Temperature: {} {deg}", num(u.temp, 1));
            let _ = writeln!(out, "Dew point:   {} {deg}", num(u.dewpt, 1));
            let _ = writeln!(out, "Wind:        {} {speed}", num(u.wind_speed, 1));
            let _ = writeln!(out, "Gusts:       {} {speed}", num(u.wind_gust, 1));
            let _ = writeln!(out, "Pressure:    {}", num(u.pressure, 2));
            let _ = writeln!(out, "Precip rate: {} {precip}/h", num(u.precip_rate, 2));
            let _ = write!(out, "Precip today: {} {precip}", num(u.precip_total, 2));
        }
        None => {
            let _ = write!(out, "Unit-dependent data not available.");
        }
    }

    out
}

pub fn forecast(forecast: &ForecastRecord, units: UnitSystem) -> String {
    let deg = units.temperature_suffix();
    let mut out = String::new();

    if let Some((min, max)) = forecast.today_range() {
        let _ = writeln!(out, "Today: {min:.0}{deg} / {max:.0}{deg}");
    }

    for day in &forecast.days {
        let _ = writeln!(
            out,
            "{:<10} {:>5} / {:>5}",
            text(day.day_of_week.as_deref()),
            num(day.temperature_min, 0),
            num(day.temperature_max, 0)
        );
    }

    for part in &forecast.dayparts {
        let _ = writeln!(out, "{}: {}", text(part.name.as_deref()), text(part.narrative.as_deref()));
    }

    for hour in forecast.hourly.iter().take(6) {
        let _ = writeln!(
            out,
            "{}  {}  {}% rain",
            text(hour.time.as_deref()),
            text(hour.phrase.as_deref()),
            num(hour.precip_chance, 0)
        );
    }

    out.trim_end().to_string()
}

/// One status block: loading and error lines, then the data if any.
pub fn state<T>(state: &FetchState<T>, render_data: impl Fn(&T) -> String) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "--- {} ---", Local::now().format("%Y-%m-%d %H:%M:%S"));

    if state.is_loading {
        let _ = writeln!(out, "Loading weather data...");
    }
    if let Some(message) = &state.error_message {
        let _ = writeln!(out, "Error: {message}");
    }
    match &state.data {
        Some(data) => {
            let _ = writeln!(out, "{}", render_data(data));
            if let Some(at) = state.fetched_at {
                let _ = write!(out, "(updated {})", at.with_timezone(&Local).format("%H:%M:%S"));
            }
        }
        None if !state.is_loading && state.error_message.is_none() => {
            let _ = write!(out, "No data yet.");
        }
        None => {}
    }

    out.trim_end().to_string()
}
