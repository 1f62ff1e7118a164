//! WhatsApp client errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bridge error: {0}")]
    Api(String),

    #[error("not connected")]
    NotConnected,

    #[error("device store error: {0}")]
    Store(#[from] StoreError),
}

/// Device store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt device record: {0}")]
    Corrupt(#[from] serde_json::Error),
}
