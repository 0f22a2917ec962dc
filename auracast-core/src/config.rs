use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fmt::Debug,
    fs,
    path::{Path, PathBuf},
};

use crate::error::FetchError;

pub const DEFAULT_LANGUAGE: &str = "en-US";

/// Unit system understood by the Weather Company API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UnitSystem {
    #[default]
    #[serde(rename = "m")]
    Metric,
    #[serde(rename = "e")]
    Imperial,
    #[serde(rename = "h")]
    UkHybrid,
    #[serde(rename = "s")]
    MetricSi,
}

impl UnitSystem {
    /// Value of the `units` query parameter.
    pub fn code(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "m",
            UnitSystem::Imperial => "e",
            UnitSystem::UkHybrid => "h",
            UnitSystem::MetricSi => "s",
        }
    }

    pub const fn all() -> &'static [UnitSystem] {
        &[UnitSystem::Metric, UnitSystem::Imperial, UnitSystem::UkHybrid, UnitSystem::MetricSi]
    }

    pub fn temperature_suffix(&self) -> &'static str {
        match self {
            UnitSystem::Imperial => "°F",
            _ => "°C",
        }
    }
}

impl std::fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
            UnitSystem::UkHybrid => "uk hybrid",
            UnitSystem::MetricSi => "metric (SI)",
        };
        f.write_str(name)
    }
}

impl TryFrom<&str> for UnitSystem {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        UnitSystem::all()
            .iter()
            .copied()
            .find(|u| u.code().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| anyhow!("Unknown unit system '{value}'. Supported: m, e, h, s."))
    }
}

/// Values a single fetch needs. Read fresh for every fetch, never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub station_id: String,
    pub api_key: String,
    #[serde(default)]
    pub units: UnitSystem,
    /// "lat,lon" for the forecast endpoints.
    #[serde(default)]
    pub geocode: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

impl Settings {
    pub fn new(station_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            station_id: station_id.into(),
            api_key: api_key.into(),
            units: UnitSystem::default(),
            geocode: None,
            language: default_language(),
        }
    }

    pub fn with_geocode(mut self, geocode: impl Into<String>) -> Self {
        self.geocode = Some(geocode.into());
        self
    }

    pub fn with_units(mut self, units: UnitSystem) -> Self {
        self.units = units;
        self
    }
}

/// Opaque source of [`Settings`], consulted at fetch time.
pub trait SettingsProvider: Send + Sync + Debug {
    fn settings(&self) -> Result<Settings, FetchError>;
}

impl SettingsProvider for Settings {
    fn settings(&self) -> Result<Settings, FetchError> {
        Ok(self.clone())
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// station_id = "IMELLE143"
/// api_key = "..."
/// units = "m"
/// geocode = "52.20,8.34"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub station_id: Option<String>,
    pub api_key: Option<String>,
    #[serde(default)]
    pub units: UnitSystem,
    pub geocode: Option<String>,
    pub language: Option<String>,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "auracast", "auracast")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Resolve into fetch settings; fails when station or key are missing.
    pub fn to_settings(&self) -> Result<Settings, FetchError> {
        let station_id = non_empty(self.station_id.as_deref()).ok_or_else(|| {
            FetchError::NotConfigured(
                "no station id. Hint: run `auracast configure` first.".to_string(),
            )
        })?;
        let api_key = non_empty(self.api_key.as_deref()).ok_or_else(|| {
            FetchError::NotConfigured(
                "no API key. Hint: run `auracast configure` first.".to_string(),
            )
        })?;

        Ok(Settings {
            station_id: station_id.to_string(),
            api_key: api_key.to_string(),
            units: self.units,
            geocode: non_empty(self.geocode.as_deref()).map(str::to_string),
            language: non_empty(self.language.as_deref())
                .map(str::to_string)
                .unwrap_or_else(default_language),
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Reads the config file on every call, so edits take effect on the next poll.
#[derive(Debug, Clone)]
pub struct FileSettings {
    path: PathBuf,
}

impl FileSettings {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn from_default_location() -> Result<Self> {
        Ok(Self::new(Config::config_file_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsProvider for FileSettings {
    fn settings(&self) -> Result<Settings, FetchError> {
        let cfg = Config::load_from(&self.path)
            .map_err(|e| FetchError::NotConfigured(format!("{e:#}")))?;
        cfg.to_settings()
    }
}
