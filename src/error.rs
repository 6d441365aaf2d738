use thiserror::Error;

/// Failures raised while assembling an outgoing envelope. The dispatcher
/// logs these and drops the single exchange; they never reach the host
/// request path.
#[derive(Debug, Error)]
pub enum Error {
    #[error("API key must be at least 4 characters long")]
    ApiKeyTooShort,
    #[error("no API key available for grouping")]
    MissingApiKey,
    #[error("invalid content-length header: {0:?}")]
    InvalidContentLength(String),
}
