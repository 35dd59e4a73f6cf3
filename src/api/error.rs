//! Request-path failures and their HTTP rendering.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const GENERIC_AUTH_FAILURE: &str = "authentication failed";
pub const MISSING_CREDENTIALS: &str = "email and password are required";

/// JSON error body returned by `/login` and the origin guard.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(thiserror::Error, Debug)]
pub enum ProxyError {
    #[error("origin not allowed")]
    CorsRejected,
    #[error("{0}")]
    AuthExchangeFailed(String),
    #[error("email and password are required")]
    InvalidCredentials,
    #[error("session cookie missing")]
    TokenMissing,
    #[error("session token rejected: {0}")]
    TokenInvalid(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::CorsRejected => StatusCode::FORBIDDEN,
            Self::AuthExchangeFailed(_)
            | Self::InvalidCredentials
            | Self::TokenMissing
            | Self::TokenInvalid(_) => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::CorsRejected | Self::AuthExchangeFailed(_) | Self::InvalidCredentials => {
                let body = ErrorResponse {
                    error: self.to_string(),
                };
                (status, Json(body)).into_response()
            }
            // Verification and internal failures never describe themselves to the caller.
            Self::TokenMissing | Self::TokenInvalid(_) | Self::Internal(_) => {
                status.into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(error: ProxyError) -> anyhow::Result<(StatusCode, Vec<u8>)> {
        let response = error.into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await?;
        Ok((status, body.to_vec()))
    }

    #[tokio::test]
    async fn cors_rejected_is_forbidden_with_generic_message() -> anyhow::Result<()> {
        let (status, body) = body_of(ProxyError::CorsRejected).await?;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let payload: ErrorResponse = serde_json::from_slice(&body)?;
        assert_eq!(payload.error, "origin not allowed");
        Ok(())
    }

    #[tokio::test]
    async fn exchange_failure_carries_reason() -> anyhow::Result<()> {
        let (status, body) =
            body_of(ProxyError::AuthExchangeFailed("Invalid login credentials".into())).await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let payload: ErrorResponse = serde_json::from_slice(&body)?;
        assert_eq!(payload.error, "Invalid login credentials");
        Ok(())
    }

    #[tokio::test]
    async fn invalid_credentials_message() -> anyhow::Result<()> {
        let (status, body) = body_of(ProxyError::InvalidCredentials).await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let payload: ErrorResponse = serde_json::from_slice(&body)?;
        assert_eq!(payload.error, MISSING_CREDENTIALS);
        Ok(())
    }

    #[tokio::test]
    async fn token_failures_have_empty_body() -> anyhow::Result<()> {
        for error in [
            ProxyError::TokenMissing,
            ProxyError::TokenInvalid("ExpiredSignature".into()),
        ] {
            let (status, body) = body_of(error).await?;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert!(body.is_empty());
        }
        Ok(())
    }

    #[tokio::test]
    async fn internal_is_500_without_detail() -> anyhow::Result<()> {
        let (status, body) = body_of(ProxyError::Internal("bad header".into())).await?;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.is_empty());
        Ok(())
    }
}
