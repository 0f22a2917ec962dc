//! Published view-model state.
//!
//! Presentation code reads a [`ViewModelState`] and subscribes to changes; only
//! the owning polling controller writes to it.

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::error::FetchError;

/// Snapshot of one data kind's freshness.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchState<T> {
    pub data: Option<T>,
    pub is_loading: bool,
    pub error_message: Option<String>,
    /// When `data` was last replaced.
    pub fetched_at: Option<DateTime<Utc>>,
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self { data: None, is_loading: false, error_message: None, fetched_at: None }
    }
}

impl<T> FetchState<T> {
    pub(crate) fn begin(&mut self) {
        self.is_loading = true;
        self.error_message = None;
    }

    pub(crate) fn succeed(&mut self, data: T, at: DateTime<Utc>) {
        self.data = Some(data);
        self.fetched_at = Some(at);
        self.error_message = None;
        self.is_loading = false;
    }

    /// Leaves `data` alone so the last good reading stays visible.
    pub(crate) fn fail(&mut self, error: &FetchError) {
        self.error_message = Some(error.to_string());
        self.is_loading = false;
    }
}

/// Observable container around a [`FetchState`].
#[derive(Debug)]
pub struct ViewModelState<T> {
    tx: watch::Sender<FetchState<T>>,
}

impl<T> Default for ViewModelState<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ViewModelState<T> {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(FetchState::default());
        Self { tx }
    }

    /// Receiver that is notified after every published change.
    pub fn subscribe(&self) -> watch::Receiver<FetchState<T>> {
        self.tx.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.tx.borrow().is_loading
    }

    pub fn error_message(&self) -> Option<String> {
        self.tx.borrow().error_message.clone()
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.tx.borrow().fetched_at
    }

    pub(crate) fn update(&self, f: impl FnOnce(&mut FetchState<T>)) {
        self.tx.send_modify(f);
    }
}

impl<T: Clone> ViewModelState<T> {
    pub fn snapshot(&self) -> FetchState<T> {
        self.tx.borrow().clone()
    }

    pub fn data(&self) -> Option<T> {
        self.tx.borrow().data.clone()
    }
}
