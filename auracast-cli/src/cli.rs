use std::sync::Arc;

use anyhow::Context;
use auracast_core::{
    Config, Fetcher, FileSettings, ForecastFetcher, ForecastViewModel, ObservationFetcher,
    SettingsProvider, UnitSystem, ViewModel, WeatherViewModel, config::DEFAULT_LANGUAGE,
    state::FetchState,
};
use clap::{Parser, Subcommand, ValueEnum};
use inquire::{Password, Select, Text};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "auracast", version, about = "Personal weather station monitor")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively set station id, API key, units, forecast location and language.
    Configure,

    /// Fetch once and print the result.
    Show {
        #[arg(value_enum, default_value_t = Kind::Observation)]
        kind: Kind,
    },

    /// Keep polling and print every update until Ctrl-C.
    Watch {
        #[arg(value_enum, default_value_t = Kind::Observation)]
        kind: Kind,
    },
}

/// What to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Kind {
    /// Current conditions at the configured station.
    #[value(alias = "current")]
    Observation,
    /// Daily and hourly forecast for the configured location.
    Forecast,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { kind } => show(kind).await,
            Command::Watch { kind } => watch(kind).await,
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut cfg = Config::load()?;

    let station_id = Text::new("Station ID:")
        .with_default(cfg.station_id.as_deref().unwrap_or_default())
        .with_help_message("e.g. IMELLE143")
        .prompt()?;

    let api_key = Password::new("API key:")
        .without_confirmation()
        .with_help_message("leave empty to keep the current key")
        .prompt()?;

    let start = UnitSystem::all().iter().position(|u| *u == cfg.units).unwrap_or(0);
    let units = Select::new("Units:", UnitSystem::all().to_vec())
        .with_starting_cursor(start)
        .prompt()?;

    let geocode = Text::new("Forecast location (lat,lon):")
        .with_default(cfg.geocode.as_deref().unwrap_or_default())
        .with_help_message("optional; needed for `auracast show forecast`")
        .prompt()?;

    let language = Text::new("Language:")
        .with_default(cfg.language.as_deref().unwrap_or(DEFAULT_LANGUAGE))
        .with_help_message("forecast language, e.g. en-US or de-DE")
        .prompt()?;

    cfg.station_id = Some(station_id.trim().to_string());
    if !api_key.trim().is_empty() {
        cfg.api_key = Some(api_key.trim().to_string());
    }
    cfg.units = units;
    cfg.geocode = Some(geocode.trim().to_string()).filter(|g| !g.is_empty());
    cfg.language = Some(language.trim().to_string()).filter(|l| !l.is_empty());

    // Fails early with a hint if something required is still missing.
    cfg.to_settings()?;
    cfg.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(kind: Kind) -> anyhow::Result<()> {
    let settings = FileSettings::from_default_location()?.settings()?;

    match kind {
        Kind::Observation => {
            let obs = ObservationFetcher::default()
                .fetch(&settings)
                .await
                .context("Failed to fetch current observation")?;
            println!("{}", render::observation(&obs, settings.units));
        }
        Kind::Forecast => {
            let forecast = ForecastFetcher::default()
                .fetch(&settings)
                .await
                .context("Failed to fetch forecast")?;
            println!("{}", render::forecast(&forecast, settings.units));
        }
    }

    Ok(())
}

async fn watch(kind: Kind) -> anyhow::Result<()> {
    let provider = Arc::new(FileSettings::from_default_location()?);
    let units = provider.settings()?.units;
    tracing::info!(path = %provider.path().display(), "Settings are re-read before every fetch");
    let settings: Arc<dyn SettingsProvider> = provider;

    match kind {
        Kind::Observation => {
            let vm = WeatherViewModel::observations(settings);
            watch_view_model(vm, units, render::observation).await
        }
        Kind::Forecast => {
            let vm = ForecastViewModel::forecast(settings);
            watch_view_model(vm, units, render::forecast).await
        }
    }
}

async fn watch_view_model<F: Fetcher>(
    vm: ViewModel<F>,
    units: UnitSystem,
    render_data: fn(&F::Record, UnitSystem) -> String,
) -> anyhow::Result<()> {
    let mut rx = vm.state().subscribe();
    vm.attach();
    tracing::info!("Watching; press Ctrl-C to stop");

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot: FetchState<F::Record> = rx.borrow_and_update().clone();
                println!("{}", render::state(&snapshot, |data| render_data(data, units)));
            }
            result = &mut ctrl_c => {
                result.context("Failed to listen for Ctrl-C")?;
                break;
            }
        }
    }

    vm.detach();
    Ok(())
}
