//! Authentication pipeline: origin guard, session exchanger and access verifier.
//!
//! Every request first passes the [`origin`] guard. `/login` and `/logout` reach the
//! [`session`] exchanger, which trades credentials for a provider session and writes
//! it into the `access_token` cookie. Protected routes sit behind the [`verifier`],
//! which checks the cookie locally against the shared signing secret and hands the
//! decoded claims to the handler.

pub(crate) mod cookie;
pub(crate) mod origin;
pub(crate) mod provider;
pub(crate) mod session;
mod state;
pub(crate) mod types;
pub(crate) mod verifier;

pub use cookie::{
    CookiePolicy, DeploymentPolicy, Environment, SESSION_COOKIE_NAME, SameSite,
    extract_session_token,
};
pub use origin::{OriginDecision, OriginPolicy, cors_layer, origin_guard};
pub use provider::{
    Credentials, ExchangeOutcome, GoTrueProvider, IdentityProvider, ProviderSession,
    provider_message,
};
pub use state::{AuthConfig, AuthState};
pub use types::LoginRequest;
pub use verifier::{AccessDecision, TokenVerifier, VerifiedIdentity, require_session};

#[cfg(test)]
mod tests;
