//! Session cookie attributes, encoding and lookup.
//!
//! The attribute set used to clear the cookie is the one used to set it: a clearing
//! cookie with a different `Domain` or `Path` is a different cookie for the browser.

use axum::http::{
    HeaderMap, HeaderValue,
    header::{COOKIE, InvalidHeaderValue},
};
use std::{
    str::FromStr,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

pub const SESSION_COOKIE_NAME: &str = "access_token";
const SESSION_COOKIE_PATH: &str = "/";
// Last second httpdate can format: 9999-12-31T23:59:59Z.
const LATEST_EXPIRES: Duration = Duration::from_secs(253_402_300_799);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    None,
}

impl SameSite {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "Strict",
            Self::None => "None",
        }
    }
}

/// Where the frontend lives relative to the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentPolicy {
    /// Frontend and proxy on different hosts of a shared parent domain.
    CrossSite,
    /// Frontend and proxy on the same site.
    SameSite,
}

impl FromStr for DeploymentPolicy {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "cross-site" => Ok(Self::CrossSite),
            "same-site" => Ok(Self::SameSite),
            other => Err(anyhow::anyhow!("unknown cookie policy: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Development,
}

impl Environment {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Development => "development",
        }
    }
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" => Ok(Self::Production),
            "development" => Ok(Self::Development),
            other => Err(anyhow::anyhow!("unknown environment: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookiePolicy {
    path: &'static str,
    domain: Option<String>,
    secure: bool,
    same_site: SameSite,
}

impl CookiePolicy {
    /// Resolve the cookie attributes for a deployment.
    ///
    /// # Errors
    /// Returns an error when a cross-site deployment would emit `SameSite=None`
    /// without `Secure`, has no shared parent domain to scope the cookie to, or
    /// the domain cannot be sent in a `Set-Cookie` header.
    pub fn new(
        policy: DeploymentPolicy,
        environment: Environment,
        domain: Option<String>,
    ) -> anyhow::Result<Self> {
        let secure = environment == Environment::Production;
        let domain = domain
            .map(|domain| domain.trim().to_ascii_lowercase())
            .filter(|domain| !domain.is_empty());

        if let Some(domain) = &domain {
            if domain.contains([';', ',', ' ', '=']) {
                anyhow::bail!("invalid cookie domain: {domain}");
            }
        }

        let cookie_policy = match policy {
            DeploymentPolicy::CrossSite => {
                if !secure {
                    anyhow::bail!(
                        "cross-site cookies require SameSite=None with Secure; use the same-site policy in development"
                    );
                }
                if domain.is_none() {
                    anyhow::bail!("cross-site cookies require a shared parent domain");
                }
                Self {
                    path: SESSION_COOKIE_PATH,
                    domain,
                    secure,
                    same_site: SameSite::None,
                }
            }
            DeploymentPolicy::SameSite => Self {
                path: SESSION_COOKIE_PATH,
                domain,
                secure,
                same_site: SameSite::Strict,
            },
        };

        cookie_policy.clear_cookie().map_err(|_| {
            anyhow::anyhow!(
                "invalid cookie domain: {}",
                cookie_policy.domain().unwrap_or_default().escape_default()
            )
        })?;

        Ok(cookie_policy)
    }

    #[must_use]
    pub fn path(&self) -> &str {
        self.path
    }

    #[must_use]
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    #[must_use]
    pub fn secure(&self) -> bool {
        self.secure
    }

    #[must_use]
    pub fn same_site(&self) -> SameSite {
        self.same_site
    }

    /// Build the `Set-Cookie` value carrying the session token.
    ///
    /// `Max-Age` is exact; `Expires` is capped at the end of year 9999.
    ///
    /// # Errors
    /// Returns an error if the token contains bytes not allowed in a header.
    pub fn set_cookie(
        &self,
        token: &str,
        max_age: Duration,
    ) -> Result<HeaderValue, InvalidHeaderValue> {
        let latest = UNIX_EPOCH + LATEST_EXPIRES;
        let expires = SystemTime::now()
            .checked_add(max_age)
            .map_or(latest, |expires| expires.min(latest));
        HeaderValue::from_str(&self.render(token, max_age.as_secs(), expires))
    }

    /// Build the `Set-Cookie` value that removes the session cookie.
    ///
    /// # Errors
    /// Returns an error if the configured domain cannot be encoded in a header.
    pub fn clear_cookie(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        HeaderValue::from_str(&self.render("", 0, UNIX_EPOCH))
    }

    fn render(&self, value: &str, max_age_seconds: u64, expires: SystemTime) -> String {
        let mut cookie = format!(
            "{SESSION_COOKIE_NAME}={value}; Path={}; Max-Age={max_age_seconds}; Expires={}",
            self.path,
            httpdate::fmt_http_date(expires)
        );
        if let Some(domain) = &self.domain {
            cookie.push_str("; Domain=");
            cookie.push_str(domain);
        }
        cookie.push_str("; HttpOnly");
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str("; SameSite=");
        cookie.push_str(self.same_site.as_str());
        cookie
    }
}

/// Read the session token from every `Cookie` header on the request.
///
/// An empty `access_token=` value is treated as no cookie at all.
#[must_use]
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| {
            let mut parts = pair.trim().splitn(2, '=');
            let key = parts.next()?.trim();
            let val = parts.next()?.trim();
            (key == SESSION_COOKIE_NAME).then_some(val)
        })
        .find(|val| !val.is_empty())
        .map(ToString::to_string)
}
