use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthenticationError {
    #[error("Token request to {0} failed")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("Token request to {url} was rejected with status {status}: {message}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        message: String,
    },

    #[error("Token response from {0} is not valid JSON")]
    MalformedResponse(String, #[source] serde_json::Error),

    #[error("Token response from {0} has no access_token")]
    MissingToken(String),
}
