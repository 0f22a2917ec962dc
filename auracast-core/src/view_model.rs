use std::{sync::Arc, time::Duration};

use crate::{
    config::SettingsProvider,
    fetcher::{Fetcher, ForecastFetcher, ObservationFetcher},
    polling::{PollingController, RefreshOutcome},
    state::ViewModelState,
};

/// Published state plus the controller that keeps it fresh.
///
/// Whatever owns the UI surface calls [`attach`](Self::attach) when it
/// becomes visible and [`detach`](Self::detach) when it is hidden. Dropping
/// the view-model stops polling.
#[derive(Debug)]
pub struct ViewModel<F: Fetcher> {
    state: Arc<ViewModelState<F::Record>>,
    controller: PollingController<F>,
}

pub type WeatherViewModel = ViewModel<ObservationFetcher>;
pub type ForecastViewModel = ViewModel<ForecastFetcher>;

impl<F: Fetcher> ViewModel<F> {
    pub fn new(fetcher: F, settings: Arc<dyn SettingsProvider>) -> Self {
        let state = Arc::new(ViewModelState::new());
        let controller = PollingController::new(fetcher, settings, Arc::clone(&state));
        Self { state, controller }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.controller = self.controller.with_interval(interval);
        self
    }

    /// Read-only view for presentation code.
    pub fn state(&self) -> &ViewModelState<F::Record> {
        &self.state
    }

    pub fn is_polling(&self) -> bool {
        self.controller.is_running()
    }

    pub fn attach(&self) -> bool {
        self.controller.start()
    }

    pub fn detach(&self) {
        self.controller.stop();
    }

    pub async fn refresh_now(&self) -> RefreshOutcome {
        self.controller.refresh_now().await
    }
}

impl WeatherViewModel {
    pub fn observations(settings: Arc<dyn SettingsProvider>) -> Self {
        Self::new(ObservationFetcher::default(), settings)
    }
}

impl ForecastViewModel {
    pub fn forecast(settings: Arc<dyn SettingsProvider>) -> Self {
        Self::new(ForecastFetcher::default(), settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Settings;

    #[tokio::test]
    async fn attach_detach_toggle_polling() {
        let settings: Arc<dyn SettingsProvider> = Arc::new(Settings::new("IMELLE143", "KEY"));
        let vm = WeatherViewModel::new(
            ObservationFetcher::default().with_base_url("http://127.0.0.1:1"),
            settings,
        );

        assert!(!vm.is_polling());
        assert!(vm.attach());
        assert!(!vm.attach());
        assert!(vm.is_polling());

        vm.detach();
        vm.detach();
        assert!(!vm.is_polling());
    }

    #[test]
    fn new_view_model_is_empty() {
        let settings: Arc<dyn SettingsProvider> =
            Arc::new(Settings::new("IMELLE143", "KEY").with_geocode("52.20,8.34"));
        let vm = ForecastViewModel::forecast(settings);

        assert!(vm.state().data().is_none());
        assert!(!vm.state().is_loading());
        assert!(vm.state().error_message().is_none());
    }
}
