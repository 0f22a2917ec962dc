use std::time::Duration;

use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use crate::error::FetchError;

const REQUEST_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = concat!("AuraCast/", env!("CARGO_PKG_VERSION"));

/// Stateless GET-and-decode helper shared by all fetchers.
#[derive(Debug, Clone)]
pub struct HttpJsonClient {
    http: Client,
}

impl Default for HttpJsonClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpJsonClient {
    pub fn new() -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client: {}", e);
                Client::new()
            });

        Self { http }
    }

    /// GET `base_url?query` and decode the body as `T`.
    ///
    /// A 2xx response with an empty body is reported as
    /// [`FetchError::EmptyResult`] labelled with `subject`.
    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        base_url: &str,
        query: &[(&str, &str)],
        subject: &str,
    ) -> Result<T, FetchError> {
        let url = Url::parse_with_params(base_url, query)
            .map_err(|e| FetchError::InvalidUrl(format!("{base_url}: {e}")))?;

        tracing::debug!(path = url.path(), "GET");

        let res = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network { detail: e.to_string() })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| FetchError::Network { detail: e.to_string() })?;

        if !status.is_success() {
            tracing::debug!("{} failed with status {}: {}", base_url, status, truncate_body(&body));
            return Err(FetchError::HttpStatus { code: status.as_u16() });
        }

        if body.trim().is_empty() {
            return Err(FetchError::EmptyResult(subject.to_string()));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::debug!("Failed to decode {}: {}", truncate_body(&body), e);
            FetchError::from(e)
        })
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
