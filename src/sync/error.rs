//! Remote store error types.

use thiserror::Error;

use super::mapping::MappingError;

/// Errors that can occur talking to the remote store.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Remote store is not configured
    #[error("Remote store not configured. Add remote.base_url and remote.api_key to config.")]
    NotConfigured,
    /// Request could not be sent or the response body could not be read
    #[error("HTTP error: {0}")]
    Http(String),
    /// Server answered with a non-2xx status
    #[error("Server returned status {status} for {table}: {body}")]
    Status {
        table: &'static str,
        status: u16,
        body: String,
    },
    /// A row did not match the field mapping
    #[error(transparent)]
    Mapping(#[from] MappingError),
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        RemoteError::Http(e.to_string())
    }
}
