use thiserror::Error;
use tokio_tungstenite::tungstenite;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("relay endpoint is not a valid URL: {0}")]
    InvalidEndpoint(String),

    #[error("could not open relay connection: {0}")]
    ConnectionFailure(#[source] tungstenite::Error),

    #[error("relay connection is not open")]
    NotConnected,

    #[error("malformed relay payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    #[error("relay write failed: {0}")]
    SendFailed(#[source] tungstenite::Error),
}

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("directory endpoint is not a valid URL: {0}")]
    InvalidEndpoint(String),

    #[error("directory request failed: {0}")]
    Request(#[from] reqwest::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("username must not be empty")]
    Empty,
}
