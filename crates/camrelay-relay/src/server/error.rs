//! HTTP mapping for [`RelayError`].

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{debug, error};

use crate::error::RelayError;

impl RelayError {
    /// HTTP status for this error kind.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::NoKeyRegistered => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::DecryptionFailed
            | Self::Crypto(_)
            | Self::PinStorage(_)
            | Self::Internal(_)
            | Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show a client. Internal failures are collapsed.
    fn public_message(&self) -> String {
        match self {
            Self::Crypto(_) | Self::PinStorage(_) | Self::Internal(_) | Self::Config(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        } else {
            debug!(status = status.as_u16(), error = %self, "Request rejected");
        }
        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

impl From<JsonRejection> for RelayError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge
        } else {
            debug!(reason = %rejection.body_text(), "Unparseable request body");
            Self::Validation("Invalid JSON body".into())
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use camrelay_crypto::CryptoError;

    async fn body_of(err: RelayError) -> (StatusCode, serde_json::Value) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn client_errors_keep_their_message() {
        let (status, body) = body_of(RelayError::Unauthorized("Invalid PIN".into())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid PIN");

        let (status, body) = body_of(RelayError::NoKeyRegistered).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No encryption key registered");
    }

    #[tokio::test]
    async fn decryption_failure_is_generic_500() {
        let (status, body) = body_of(RelayError::DecryptionFailed).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Decryption failed");
    }

    #[tokio::test]
    async fn internal_detail_is_not_leaked() {
        let err = RelayError::Crypto(CryptoError::InvalidIvLength {
            expected: 16,
            actual: 3,
        });
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");

        let (_, body) = body_of(RelayError::PinStorage("/secret/path".into())).await;
        assert_eq!(body["error"], "Internal server error");
    }
}
