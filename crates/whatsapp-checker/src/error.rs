//! Error types for the number checker.

use crate::api::CheckResponse;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::path::PathBuf;
use thiserror::Error;
use whatsapp_client::ClientError;

/// Rejections of a `/check` request.
///
/// The `Display` text is what clients see in the `status` field.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("error: number parameter is missing")]
    MissingNumber,

    #[error("error: client not connected")]
    NotConnected { number: String },

    #[error("error checking number: {source}")]
    Query {
        number: String,
        #[source]
        source: ClientError,
    },
}

impl CheckError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            CheckError::MissingNumber => StatusCode::BAD_REQUEST,
            CheckError::NotConnected { .. } => StatusCode::SERVICE_UNAVAILABLE,
            CheckError::Query { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn number(&self) -> &str {
        match self {
            CheckError::MissingNumber => "",
            CheckError::NotConnected { number } | CheckError::Query { number, .. } => number,
        }
    }
}

impl IntoResponse for CheckError {
    fn into_response(self) -> Response {
        let body = CheckResponse {
            number: self.number().to_string(),
            is_on_whatsapp: false,
            status: self.to_string(),
        };

        (self.status_code(), Json(body)).into_response()
    }
}

/// Failures while establishing the WhatsApp session. All of them are fatal.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to read device store: {0}")]
    Store(#[source] ClientError),

    #[error("failed to open pairing channel: {0}")]
    Pairing(#[source] ClientError),

    #[error("failed to connect: {0}")]
    Connect(#[source] ClientError),

    #[error("QR code scan timed out")]
    PairingTimedOut,

    #[error("pairing ended without a successful login")]
    PairingIncomplete,

    #[error("pairing could not be completed: {0}")]
    PairingFailed(String),
}

/// Failures loading the frontend bundle.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("frontend bundle at {0:?} has no index.html")]
    MissingIndex(PathBuf),
}

/// HTTP listener failures.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server task failed: {0}")]
    Task(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_error_status_text() {
        assert_eq!(
            CheckError::MissingNumber.to_string(),
            "error: number parameter is missing"
        );
        assert_eq!(
            CheckError::NotConnected {
                number: "123".into()
            }
            .to_string(),
            "error: client not connected"
        );

        let err = CheckError::Query {
            number: "123".into(),
            source: ClientError::Api("boom".into()),
        };
        assert_eq!(err.to_string(), "error checking number: bridge error: boom");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_check_error_response_body() {
        let response = CheckError::NotConnected {
            number: "+15551234567".into(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["number"], "+15551234567");
        assert_eq!(json["isOnWhatsApp"], false);
        assert_eq!(json["status"], "error: client not connected");
    }
}
