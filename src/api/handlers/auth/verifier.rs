//! Access verifier: offline signature and claim checks for the session cookie.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::{fmt, sync::Arc};
use tracing::debug;

use super::{cookie::extract_session_token, state::AuthState};
use crate::api::error::ProxyError;

/// Claims of a token that passed verification, valid for the current request only.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedIdentity {
    claims: Value,
}

impl VerifiedIdentity {
    #[must_use]
    pub fn claims(&self) -> &Value {
        &self.claims
    }

    #[must_use]
    pub fn into_claims(self) -> Value {
        self.claims
    }

    #[must_use]
    pub fn sub(&self) -> Option<&str> {
        self.claims.get("sub").and_then(Value::as_str)
    }
}

#[derive(Debug)]
pub enum AccessDecision {
    Authenticated(VerifiedIdentity),
    Rejected(ProxyError),
}

pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("key", &"***")
            .field("algorithms", &self.validation.algorithms)
            .field("leeway", &self.validation.leeway)
            .finish_non_exhaustive()
    }
}

impl TokenVerifier {
    #[must_use]
    pub fn new(
        secret: &SecretString,
        issuer: Option<&str>,
        audience: Option<&str>,
        leeway_seconds: u64,
    ) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.leeway = leeway_seconds;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        match audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }
        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
        }

        Self {
            key: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            validation,
        }
    }

    /// Verify signature, expiry and the configured issuer/audience.
    ///
    /// # Errors
    /// Returns the `jsonwebtoken` error describing why the token was refused.
    pub fn verify(&self, token: &str) -> Result<VerifiedIdentity, jsonwebtoken::errors::Error> {
        let data = decode::<Value>(token, &self.key, &self.validation)?;
        Ok(VerifiedIdentity {
            claims: data.claims,
        })
    }

    /// Run the full decision: cookie present, then token valid.
    #[must_use]
    pub fn authenticate(&self, headers: &HeaderMap) -> AccessDecision {
        let Some(token) = extract_session_token(headers) else {
            return AccessDecision::Rejected(ProxyError::TokenMissing);
        };
        match self.verify(&token) {
            Ok(identity) => AccessDecision::Authenticated(identity),
            Err(err) => AccessDecision::Rejected(ProxyError::TokenInvalid(format!(
                "{:?}",
                err.kind()
            ))),
        }
    }
}

/// Middleware admitting only requests carrying a valid session cookie.
///
/// The verified identity is inserted into the request extensions for the handler.
pub async fn require_session(
    State(state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    match state.verifier().authenticate(request.headers()) {
        AccessDecision::Authenticated(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        AccessDecision::Rejected(err) => {
            debug!("Session rejected: {err}");
            err.into_response()
        }
    }
}
