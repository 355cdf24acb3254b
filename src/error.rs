//! Error taxonomy of the remote contract.
//!
//! Only the transport can fail. Resolvers catch every [`TransportError`] and
//! answer from the fallback dataset instead, so these never cross a resolver
//! boundary; they are kept around as the informational message of a
//! [`crate::models::FallbackReason::Transport`].

use thiserror::Error;

pub type Result<T, E = TransportError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection failure, timeout or any other request-level error.
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error("{endpoint} answered with status {status}")]
    Status { endpoint: String, status: u16 },
    #[error("undecodable response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    InvalidUrl(#[from] url::ParseError),
    #[error("{message}")]
    Unavailable { message: String },
}

impl TransportError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}
