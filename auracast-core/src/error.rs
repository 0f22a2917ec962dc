use thiserror::Error;

/// Everything that can go wrong while fetching one endpoint.
///
/// None of these are fatal: the polling controller renders them into the
/// published `error_message` and keeps whatever data it already had.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Invalid URL configuration: {0}")]
    InvalidUrl(String),

    #[error("Server returned status {code}")]
    HttpStatus { code: u16 },

    #[error("Failed to decode weather data: {detail}")]
    Decode { detail: String },

    #[error("Failed to retrieve weather data: {detail}")]
    Network { detail: String },

    /// The server answered successfully but had nothing for us.
    #[error("No data found for {0}")]
    EmptyResult(String),

    #[error("Not configured: {0}")]
    NotConfigured(String),
}

impl FetchError {
    /// True for conditions the user can fix by changing the station or location.
    pub fn is_empty_result(&self) -> bool {
        matches!(self, FetchError::EmptyResult(_))
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Decode { detail: err.to_string() }
    }
}
