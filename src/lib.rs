//! # Cookiebridge (Session Cookie Proxy)
//!
//! `cookiebridge` sits between a browser and a third-party identity provider. It
//! exchanges an email/password pair for a provider session and hands the resulting
//! access token back to the browser as an `HttpOnly` cookie, so page scripts never
//! touch a bearer token.
//!
//! ## Request Pipeline
//!
//! Every request crosses the same stages, in order:
//!
//! 1. **Origin Guard:** requests carrying an `Origin` header are only served when the
//!    origin hostname ends with a trusted suffix. Allowed origins get credentialed CORS
//!    headers (explicit origin echo, never `*`). Requests without an `Origin` header come
//!    from tools and servers and are not subject to browser policy.
//! 2. **Session Exchanger:** `POST /login` calls the provider's password grant and sets
//!    the `access_token` cookie; `POST /logout` clears it with the same attributes.
//! 3. **Access Verifier:** protected routes (`GET /me`) require the cookie to carry a
//!    token signed with the provider's shared secret. Verification is offline; the
//!    provider is never contacted to check a token.
//!
//! ## Cookie Policy
//!
//! - **`cross-site`:** `SameSite=None; Secure` with an explicit parent `Domain`, for
//!   frontends served from sibling subdomains.
//! - **`same-site`:** `SameSite=Strict`, host-only unless a domain is configured.
//!
//! `SameSite=None` without `Secure` is dropped by browsers, so that combination is
//! refused at startup.
//!
//! ## Limitations
//!
//! Logout only clears the cookie. The provider token stays valid until it expires and
//! nothing here refreshes it.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
