//! Origin guard: trusted-suffix policy for credentialed browser calls.
//!
//! A request without an `Origin` header is a tool or server-to-server call and is
//! always allowed. A browser origin is allowed only when its hostname ends with one of
//! the configured suffixes preceded by a dot, so `app.example.com` matches the suffix
//! `example.com` while `example.com` itself and `evilexample.com` do not.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, Method, header::CONTENT_TYPE, header::ORIGIN},
    middleware::Next,
    response::{IntoResponse, Response},
};
use regex::Regex;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::debug;
use url::Url;

use super::state::AuthState;
use crate::api::error::ProxyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginDecision {
    Allow,
    Deny,
}

#[derive(Debug, Clone)]
pub struct OriginPolicy {
    suffixes: Vec<String>,
    pattern: Regex,
}

impl OriginPolicy {
    /// Build the policy from trusted host suffixes such as `.example.com`.
    ///
    /// # Errors
    /// Returns an error if the list is empty or a suffix is blank.
    pub fn new<I, S>(suffixes: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized = Vec::new();
        for suffix in suffixes {
            let suffix = suffix
                .as_ref()
                .trim()
                .trim_start_matches('.')
                .trim_end_matches('.')
                .to_ascii_lowercase();
            if suffix.is_empty() {
                anyhow::bail!("trusted origin suffix must not be empty");
            }
            if !normalized.contains(&suffix) {
                normalized.push(suffix);
            }
        }
        if normalized.is_empty() {
            anyhow::bail!("at least one trusted origin suffix is required");
        }

        let alternatives = normalized
            .iter()
            .map(|suffix| regex::escape(suffix))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&format!(r"\.(?:{alternatives})$"))?;

        Ok(Self {
            suffixes: normalized,
            pattern,
        })
    }

    /// Normalized suffixes, without the leading dot.
    #[must_use]
    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }

    #[must_use]
    pub fn allows_host(&self, host: &str) -> bool {
        self.pattern.is_match(&host.to_ascii_lowercase())
    }

    /// Decide on the raw `Origin` header value, if any.
    #[must_use]
    pub fn decide(&self, origin: Option<&str>) -> OriginDecision {
        let Some(origin) = origin else {
            return OriginDecision::Allow;
        };
        // Opaque origins ("null") and anything without a host cannot match a suffix.
        let host = Url::parse(origin.trim())
            .ok()
            .and_then(|url| url.host_str().map(ToString::to_string));
        match host {
            Some(host) if self.allows_host(&host) => OriginDecision::Allow,
            _ => OriginDecision::Deny,
        }
    }

    /// Decide on the request headers. A non-UTF-8 `Origin` is denied.
    #[must_use]
    pub fn decide_headers(&self, headers: &HeaderMap) -> OriginDecision {
        match headers.get(ORIGIN) {
            None => OriginDecision::Allow,
            Some(value) => match value.to_str() {
                Ok(origin) => self.decide(Some(origin)),
                Err(_) => OriginDecision::Deny,
            },
        }
    }
}

/// Middleware rejecting requests from untrusted origins before any handler runs.
pub async fn origin_guard(
    State(state): State<Arc<AuthState>>,
    request: Request,
    next: Next,
) -> Response {
    match state.config().origin_policy().decide_headers(request.headers()) {
        OriginDecision::Allow => next.run(request).await,
        OriginDecision::Deny => {
            debug!(method = %request.method(), "Rejected request from untrusted origin");
            ProxyError::CorsRejected.into_response()
        }
    }
}

/// Credentialed CORS layer echoing only origins the policy allows.
#[must_use]
pub fn cors_layer(policy: &OriginPolicy) -> CorsLayer {
    let policy = policy.clone();
    CorsLayer::new()
        .allow_headers([CONTENT_TYPE])
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &axum::http::request::Parts| {
                origin
                    .to_str()
                    .is_ok_and(|origin| policy.decide(Some(origin)) == OriginDecision::Allow)
            },
        ))
        .allow_credentials(true)
}
