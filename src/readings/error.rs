use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Response from {0} is not valid JSON")]
    Decode(String, #[source] serde_json::Error),

    #[error("Netatmo API error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("Response from {0} has no body.devices array")]
    MissingDevices(String),
}
