//! Identity provider password exchange.
//!
//! The provider is reached through [`IdentityProvider`] so handlers can be driven by a
//! fake in tests. [`GoTrueProvider`] speaks the GoTrue password grant used by Supabase:
//! `POST {base}/auth/v1/token?grant_type=password` with the public API key in both the
//! `apikey` and `Authorization` headers.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Value, json};
use std::{fmt, future::Future, pin::Pin, time::Duration};
use tracing::{Instrument, debug, error, info_span, warn};
use url::Url;

use crate::APP_USER_AGENT;

/// An email/password pair, alive for a single login request.
#[derive(Debug)]
pub struct Credentials {
    email: String,
    password: SecretString,
}

impl Credentials {
    #[must_use]
    pub fn new(email: String, password: SecretString) -> Self {
        Self { email, password }
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn password(&self) -> &SecretString {
        &self.password
    }
}

/// Session returned by a successful exchange; only the fields the cookie needs.
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct ProviderSession {
    pub access_token: String,
    pub expires_in: u64,
}

impl ProviderSession {
    /// A session is usable when it carries a cookie-safe token and a positive lifetime.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        !self.access_token.is_empty()
            && self.expires_in > 0
            && self.access_token.bytes().all(is_cookie_octet)
    }

    /// Cookie lifetime, `expires_in` seconds expressed exactly in milliseconds.
    #[must_use]
    pub fn cookie_max_age(&self) -> Duration {
        Duration::from_millis(self.expires_in.saturating_mul(1000))
    }
}

impl fmt::Debug for ProviderSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSession")
            .field("access_token", &"***")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

// RFC 6265 cookie-octet: visible ASCII minus DQUOTE, comma, semicolon and backslash.
fn is_cookie_octet(byte: u8) -> bool {
    matches!(byte, 0x21 | 0x23..=0x2B | 0x2D..=0x3A | 0x3C..=0x5B | 0x5D..=0x7E)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeOutcome {
    Session(ProviderSession),
    /// The provider denied the credentials or could not be reached.
    /// Carries the provider's own message when it sent one.
    Rejected(Option<String>),
}

pub trait IdentityProvider: Send + Sync {
    fn sign_in_with_password<'a>(
        &'a self,
        credentials: &'a Credentials,
    ) -> Pin<Box<dyn Future<Output = ExchangeOutcome> + Send + 'a>>;
}

pub struct GoTrueProvider {
    client: reqwest::Client,
    token_url: Url,
    api_key: SecretString,
}

impl fmt::Debug for GoTrueProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoTrueProvider")
            .field("token_url", &self.token_url.as_str())
            .field("api_key", &"***")
            .finish_non_exhaustive()
    }
}

impl GoTrueProvider {
    /// Build a provider client for `base_url`.
    ///
    /// # Errors
    /// Returns an error if the token URL cannot be derived or the HTTP client fails to build.
    pub fn new(base_url: &Url, api_key: SecretString, timeout: Duration) -> anyhow::Result<Self> {
        let token_url = token_url(base_url)?;
        let client = reqwest::Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            token_url,
            api_key,
        })
    }

    #[must_use]
    pub fn token_url(&self) -> &Url {
        &self.token_url
    }

    async fn exchange(&self, credentials: &Credentials) -> ExchangeOutcome {
        let body = json!({
            "email": credentials.email(),
            "password": credentials.password().expose_secret(),
        });

        let api_key = self.api_key.expose_secret();
        let response = match self
            .client
            .post(self.token_url.clone())
            .header("apikey", api_key)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                if err.is_timeout() {
                    warn!("Identity provider did not answer in time");
                } else {
                    error!("Identity provider request failed: {}", err.without_url());
                }
                return ExchangeOutcome::Rejected(None);
            }
        };

        let status = response.status();
        let payload = match response.bytes().await {
            Ok(bytes) => serde_json::from_slice::<Value>(&bytes).ok(),
            Err(err) => {
                warn!("Failed to read identity provider response: {}", err.without_url());
                return ExchangeOutcome::Rejected(None);
            }
        };

        if !status.is_success() {
            debug!(status = status.as_u16(), "Identity provider rejected credentials");
            return ExchangeOutcome::Rejected(payload.as_ref().and_then(provider_message));
        }

        match payload.map(serde_json::from_value::<ProviderSession>) {
            Some(Ok(session)) if session.is_usable() => ExchangeOutcome::Session(session),
            _ => {
                warn!(
                    status = status.as_u16(),
                    "Identity provider answered without a usable session"
                );
                ExchangeOutcome::Rejected(None)
            }
        }
    }
}

impl IdentityProvider for GoTrueProvider {
    fn sign_in_with_password<'a>(
        &'a self,
        credentials: &'a Credentials,
    ) -> Pin<Box<dyn Future<Output = ExchangeOutcome> + Send + 'a>> {
        let span = info_span!("provider.exchange", http.url = %self.token_url.path());
        Box::pin(self.exchange(credentials).instrument(span))
    }
}

fn token_url(base_url: &Url) -> anyhow::Result<Url> {
    let base = base_url.as_str().trim_end_matches('/');
    let mut url = Url::parse(&format!("{base}/auth/v1/token"))?;
    url.query_pairs_mut().append_pair("grant_type", "password");
    Ok(url)
}

/// Pick the human-readable message from a provider error body.
///
/// GoTrue versions disagree on the field name; `msg` wins over `message`, then
/// `error_description`, then `error`.
#[must_use]
pub fn provider_message(payload: &Value) -> Option<String> {
    ["msg", "message", "error_description", "error"]
        .iter()
        .filter_map(|key| payload.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|message| !message.is_empty())
        .map(ToString::to_string)
}
