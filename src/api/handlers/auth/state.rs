//! Auth configuration and the shared state injected into handlers.

use secrecy::SecretString;
use std::{fmt, sync::Arc, time::Duration};
use url::Url;

use super::{
    cookie::CookiePolicy,
    origin::OriginPolicy,
    provider::{GoTrueProvider, IdentityProvider},
    verifier::TokenVerifier,
};

const DEFAULT_PROVIDER_TIMEOUT_SECONDS: u64 = 10;

/// Immutable configuration, built once at startup.
#[derive(Clone)]
pub struct AuthConfig {
    provider_url: Url,
    provider_api_key: SecretString,
    provider_timeout: Duration,
    jwt_secret: SecretString,
    jwt_issuer: Option<String>,
    jwt_audience: Option<String>,
    jwt_leeway_seconds: u64,
    origin_policy: OriginPolicy,
    cookie_policy: CookiePolicy,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("provider_url", &self.provider_url.as_str())
            .field("provider_api_key", &"***")
            .field("provider_timeout", &self.provider_timeout)
            .field("jwt_secret", &"***")
            .field("jwt_issuer", &self.jwt_issuer)
            .field("jwt_audience", &self.jwt_audience)
            .field("jwt_leeway_seconds", &self.jwt_leeway_seconds)
            .field("origin_policy", &self.origin_policy.suffixes())
            .field("cookie_policy", &self.cookie_policy)
            .finish()
    }
}

impl AuthConfig {
    #[must_use]
    pub fn new(
        provider_url: Url,
        provider_api_key: SecretString,
        jwt_secret: SecretString,
        origin_policy: OriginPolicy,
        cookie_policy: CookiePolicy,
    ) -> Self {
        Self {
            provider_url,
            provider_api_key,
            provider_timeout: Duration::from_secs(DEFAULT_PROVIDER_TIMEOUT_SECONDS),
            jwt_secret,
            jwt_issuer: None,
            jwt_audience: None,
            jwt_leeway_seconds: 0,
            origin_policy,
            cookie_policy,
        }
    }

    #[must_use]
    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_jwt_issuer(mut self, issuer: Option<String>) -> Self {
        self.jwt_issuer = issuer;
        self
    }

    #[must_use]
    pub fn with_jwt_audience(mut self, audience: Option<String>) -> Self {
        self.jwt_audience = audience;
        self
    }

    #[must_use]
    pub fn with_jwt_leeway_seconds(mut self, seconds: u64) -> Self {
        self.jwt_leeway_seconds = seconds;
        self
    }

    #[must_use]
    pub fn provider_url(&self) -> &Url {
        &self.provider_url
    }

    #[must_use]
    pub fn provider_timeout(&self) -> Duration {
        self.provider_timeout
    }

    #[must_use]
    pub fn origin_policy(&self) -> &OriginPolicy {
        &self.origin_policy
    }

    #[must_use]
    pub fn cookie_policy(&self) -> &CookiePolicy {
        &self.cookie_policy
    }

    #[must_use]
    pub fn token_verifier(&self) -> TokenVerifier {
        TokenVerifier::new(
            &self.jwt_secret,
            self.jwt_issuer.as_deref(),
            self.jwt_audience.as_deref(),
            self.jwt_leeway_seconds,
        )
    }
}

pub struct AuthState {
    config: AuthConfig,
    verifier: TokenVerifier,
    provider: Arc<dyn IdentityProvider>,
}

impl fmt::Debug for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthState")
            .field("config", &self.config)
            .field("verifier", &self.verifier)
            .finish_non_exhaustive()
    }
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig, provider: Arc<dyn IdentityProvider>) -> Self {
        let verifier = config.token_verifier();
        Self {
            config,
            verifier,
            provider,
        }
    }

    /// Build the state with the HTTP provider client described by `config`.
    ///
    /// # Errors
    /// Returns an error if the provider client cannot be built.
    pub fn from_config(config: AuthConfig) -> anyhow::Result<Self> {
        let provider = GoTrueProvider::new(
            &config.provider_url,
            config.provider_api_key.clone(),
            config.provider_timeout,
        )?;
        Ok(Self::new(config, Arc::new(provider)))
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    pub(super) fn provider(&self) -> &dyn IdentityProvider {
        self.provider.as_ref()
    }
}
