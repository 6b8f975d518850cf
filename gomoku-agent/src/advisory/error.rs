use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdvisoryError {
    #[error("http transport failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("provider {provider} answered with status {status}")]
    Status { provider: String, status: u16 },
    #[error("malformed advisory response: {0}")]
    Malformed(String),
    #[error("advisory call timed out after {0:?}")]
    Timeout(Duration),
    #[error("no advisory provider is available")]
    NoProvider,
}

impl From<serde_json::Error> for AdvisoryError {
    fn from(err: serde_json::Error) -> Self {
        AdvisoryError::Malformed(err.to_string())
    }
}
