//! Router-level tests for the auth pipeline, driven by a fake identity provider.

use super::{
    AuthConfig, AuthState, CookiePolicy, Credentials, DeploymentPolicy, Environment,
    ExchangeOutcome, IdentityProvider, OriginPolicy, ProviderSession,
};
use crate::api::{ErrorResponse, router};
use anyhow::{Result, anyhow};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{
        HeaderMap, Request, StatusCode,
        header::{
            ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_ORIGIN,
            ACCESS_CONTROL_REQUEST_METHOD, CONTENT_TYPE, COOKIE, ORIGIN, SET_COOKIE,
        },
    },
    response::Response,
};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use std::{
    future::Future,
    pin::Pin,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::{SystemTime, UNIX_EPOCH},
};
use tower::ServiceExt;
use url::Url;

const SECRET: &str = "router-test-secret";
const TRUSTED_ORIGIN: &str = "https://app.example.com";

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn sign(claims: &Value, secret: &str) -> Result<String> {
    Ok(encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

fn claims_for(email: &str) -> Value {
    json!({
        "sub": "7d3f9c1e-0000-4000-8000-000000000001",
        "email": email,
        "aud": "authenticated",
        "role": "authenticated",
        "exp": now() + 3600,
    })
}

/// Accepts one fixed email/password pair and issues a real HS256 token for it.
struct FakeProvider {
    calls: AtomicUsize,
    rejection: Option<String>,
    expires_in: u64,
}

impl FakeProvider {
    fn accepting() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            rejection: None,
            expires_in: 3600,
        }
    }

    fn accepting_for(expires_in: u64) -> Self {
        Self {
            expires_in,
            ..Self::accepting()
        }
    }

    fn rejecting(reason: Option<&str>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            rejection: Some(reason.unwrap_or_default().to_string()),
            expires_in: 3600,
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl IdentityProvider for FakeProvider {
    fn sign_in_with_password<'a>(
        &'a self,
        credentials: &'a Credentials,
    ) -> Pin<Box<dyn Future<Output = ExchangeOutcome> + Send + 'a>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(reason) = &self.rejection {
                let reason = (!reason.is_empty()).then(|| reason.clone());
                return ExchangeOutcome::Rejected(reason);
            }
            if credentials.email() != "alice@example.com"
                || credentials.password().expose_secret() != "correct horse"
            {
                return ExchangeOutcome::Rejected(Some("Invalid login credentials".to_string()));
            }
            match sign(&claims_for(credentials.email()), SECRET) {
                Ok(access_token) => ExchangeOutcome::Session(ProviderSession {
                    access_token,
                    expires_in: self.expires_in,
                }),
                Err(_) => ExchangeOutcome::Rejected(None),
            }
        })
    }
}

fn cross_site_config() -> Result<AuthConfig> {
    Ok(AuthConfig::new(
        Url::parse("https://project.supabase.co")?,
        SecretString::from("anon-key".to_string()),
        SecretString::from(SECRET.to_string()),
        OriginPolicy::new([".example.com"])?,
        CookiePolicy::new(
            DeploymentPolicy::CrossSite,
            Environment::Production,
            Some(".example.com".to_string()),
        )?,
    ))
}

fn app_with(provider: Arc<FakeProvider>) -> Result<Router> {
    let state = AuthState::new(cross_site_config()?, provider);
    Ok(router(Arc::new(state)))
}

fn login_request(body: &Value) -> Result<Request<Body>> {
    Ok(Request::builder()
        .method("POST")
        .uri("/login")
        .header(ORIGIN, TRUSTED_ORIGIN)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body)?))?)
}

fn set_cookies(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .map(ToString::to_string)
        .collect()
}

fn attributes(cookie: &str) -> Vec<String> {
    cookie.split(';').map(|part| part.trim().to_string()).collect()
}

fn cookie_pair(cookie: &str) -> String {
    cookie.split(';').next().unwrap_or_default().to_string()
}

async fn json_body<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
    let body = to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&body)?)
}

async fn get_me(app: Router, cookie: Option<&str>) -> Result<Response> {
    let mut request = Request::builder().method("GET").uri("/me");
    if let Some(cookie) = cookie {
        request = request.header(COOKIE, cookie);
    }
    Ok(app.oneshot(request.body(Body::empty())?).await?)
}

#[tokio::test]
async fn login_sets_single_session_cookie() -> Result<()> {
    let provider = Arc::new(FakeProvider::accepting());
    let app = app_with(provider.clone())?;

    let response = app
        .oneshot(login_request(
            &json!({"email": "alice@example.com", "password": "correct horse"}),
        )?)
        .await?;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let cookies = set_cookies(response.headers());
    assert_eq!(cookies.len(), 1);

    let attrs = attributes(&cookies[0]);
    assert!(attrs[0].starts_with("access_token="));
    assert!(attrs.len() > 1);
    assert!(attrs.contains(&"Max-Age=3600".to_string()));
    assert!(attrs.contains(&"HttpOnly".to_string()));
    assert!(attrs.contains(&"Secure".to_string()));
    assert!(attrs.contains(&"SameSite=None".to_string()));
    assert!(attrs.contains(&"Domain=.example.com".to_string()));
    assert!(attrs.contains(&"Path=/".to_string()));
    assert_eq!(provider.calls(), 1);

    let body = to_bytes(response.into_body(), usize::MAX).await?;
    assert!(body.is_empty());
    Ok(())
}

#[tokio::test]
async fn login_with_far_future_expiry_still_sets_cookie() -> Result<()> {
    let app = app_with(Arc::new(FakeProvider::accepting_for(300_000_000_000)))?;

    let response = app
        .oneshot(login_request(
            &json!({"email": "alice@example.com", "password": "correct horse"}),
        )?)
        .await?;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let cookies = set_cookies(response.headers());
    assert_eq!(cookies.len(), 1);
    let attrs = attributes(&cookies[0]);
    assert!(attrs.contains(&"Max-Age=300000000000".to_string()));
    assert!(attrs.contains(&"Expires=Fri, 31 Dec 9999 23:59:59 GMT".to_string()));
    Ok(())
}

#[tokio::test]
async fn rejected_login_reports_provider_message() -> Result<()> {
    let app = app_with(Arc::new(FakeProvider::accepting()))?;

    let response = app
        .oneshot(login_request(
            &json!({"email": "alice@example.com", "password": "wrong"}),
        )?)
        .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookies(response.headers()).is_empty());
    let payload: ErrorResponse = json_body(response).await?;
    assert_eq!(payload.error, "Invalid login credentials");
    Ok(())
}

#[tokio::test]
async fn rejected_login_without_message_is_generic() -> Result<()> {
    let app = app_with(Arc::new(FakeProvider::rejecting(None)))?;

    let response = app
        .oneshot(login_request(
            &json!({"email": "alice@example.com", "password": "correct horse"}),
        )?)
        .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookies(response.headers()).is_empty());
    let payload: ErrorResponse = json_body(response).await?;
    assert_eq!(payload.error, "authentication failed");
    Ok(())
}

#[tokio::test]
async fn missing_credentials_skip_the_provider() -> Result<()> {
    let provider = Arc::new(FakeProvider::accepting());

    for body in [
        json!({"email": "alice@example.com"}),
        json!({"password": "correct horse"}),
        json!({"email": "", "password": "correct horse"}),
        json!({}),
    ] {
        let response = app_with(provider.clone())?
            .oneshot(login_request(&body)?)
            .await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(set_cookies(response.headers()).is_empty());
        let payload: ErrorResponse = json_body(response).await?;
        assert_eq!(payload.error, "email and password are required");
    }

    let response = app_with(provider.clone())?
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/login")
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from("not json"))?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    assert_eq!(provider.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn logout_clears_cookie_with_login_scope() -> Result<()> {
    let provider = Arc::new(FakeProvider::accepting());

    let login = app_with(provider.clone())?
        .oneshot(login_request(
            &json!({"email": "alice@example.com", "password": "correct horse"}),
        )?)
        .await?;
    let set = attributes(&set_cookies(login.headers())[0]);

    let logout = app_with(provider.clone())?
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/logout")
                .header(ORIGIN, TRUSTED_ORIGIN)
                .body(Body::empty())?,
        )
        .await?;

    assert_eq!(logout.status(), StatusCode::NO_CONTENT);
    let cleared = set_cookies(logout.headers());
    assert_eq!(cleared.len(), 1);
    let clear = attributes(&cleared[0]);
    assert_eq!(clear[0], "access_token=");
    assert!(clear.contains(&"Max-Age=0".to_string()));
    for attr in ["Path=/", "Domain=.example.com", "SameSite=None", "Secure"] {
        assert!(set.contains(&attr.to_string()), "login missing {attr}");
        assert!(clear.contains(&attr.to_string()), "logout missing {attr}");
    }
    assert_eq!(provider.calls(), 1);
    Ok(())
}

#[tokio::test]
async fn logout_is_idempotent() -> Result<()> {
    let provider = Arc::new(FakeProvider::accepting());
    let mut cleared = Vec::new();

    for _ in 0..2 {
        let response = app_with(provider.clone())?
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/logout")
                    .body(Body::empty())?,
            )
            .await?;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        cleared.push(set_cookies(response.headers()));
    }

    assert_eq!(cleared[0], cleared[1]);
    assert_eq!(provider.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn me_without_cookie_is_unauthorized() -> Result<()> {
    let app = app_with(Arc::new(FakeProvider::accepting()))?;
    let response = get_me(app, None).await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = to_bytes(response.into_body(), usize::MAX).await?;
    assert!(body.is_empty());
    Ok(())
}

#[tokio::test]
async fn me_returns_decoded_claims() -> Result<()> {
    let app = app_with(Arc::new(FakeProvider::accepting()))?;
    let claims = claims_for("bob@example.com");
    let token = sign(&claims, SECRET)?;

    let response = get_me(app, Some(&format!("theme=dark; access_token={token}"))).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let payload: Value = json_body(response).await?;
    assert_eq!(payload, claims);
    Ok(())
}

#[tokio::test]
async fn me_rejects_wrong_secret_and_expired_tokens() -> Result<()> {
    let forged = sign(&claims_for("bob@example.com"), "not-the-secret")?;
    let mut expired_claims = claims_for("bob@example.com");
    expired_claims["exp"] = json!(now() - 3600);
    let expired = sign(&expired_claims, SECRET)?;

    for token in [forged, expired, "garbage".to_string()] {
        let app = app_with(Arc::new(FakeProvider::accepting()))?;
        let response = get_me(app, Some(&format!("access_token={token}"))).await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = to_bytes(response.into_body(), usize::MAX).await?;
        assert!(body.is_empty());
    }
    Ok(())
}

#[tokio::test]
async fn login_then_me_round_trip() -> Result<()> {
    let provider = Arc::new(FakeProvider::accepting());

    let login = app_with(provider.clone())?
        .oneshot(login_request(
            &json!({"email": "alice@example.com", "password": "correct horse"}),
        )?)
        .await?;
    let cookie = set_cookies(login.headers())
        .first()
        .map(|cookie| cookie_pair(cookie))
        .ok_or_else(|| anyhow!("login did not set a cookie"))?;

    let response = get_me(app_with(provider)?, Some(&cookie)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let payload: Value = json_body(response).await?;
    assert_eq!(payload["email"], "alice@example.com");
    Ok(())
}

#[tokio::test]
async fn untrusted_origin_is_rejected_before_handlers() -> Result<()> {
    let provider = Arc::new(FakeProvider::accepting());

    let response = app_with(provider.clone())?
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/login")
                .header(ORIGIN, "https://evil.test")
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({"email": "alice@example.com", "password": "correct horse"}).to_string(),
                ))?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(set_cookies(response.headers()).is_empty());
    assert!(
        !response
            .headers()
            .contains_key(ACCESS_CONTROL_ALLOW_ORIGIN)
    );
    let payload: ErrorResponse = json_body(response).await?;
    assert_eq!(payload.error, "origin not allowed");
    assert_eq!(provider.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn trusted_origin_gets_credentialed_cors_headers() -> Result<()> {
    let app = app_with(Arc::new(FakeProvider::accepting()))?;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/logout")
                .header(ORIGIN, TRUSTED_ORIGIN)
                .body(Body::empty())?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        response
            .headers()
            .get(ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|value| value.to_str().ok()),
        Some(TRUSTED_ORIGIN)
    );
    assert_eq!(
        response
            .headers()
            .get(ACCESS_CONTROL_ALLOW_CREDENTIALS)
            .and_then(|value| value.to_str().ok()),
        Some("true")
    );
    Ok(())
}

#[tokio::test]
async fn preflight_from_trusted_origin_is_answered() -> Result<()> {
    let app = app_with(Arc::new(FakeProvider::accepting()))?;

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/login")
                .header(ORIGIN, TRUSTED_ORIGIN)
                .header(ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|value| value.to_str().ok()),
        Some(TRUSTED_ORIGIN)
    );
    Ok(())
}

#[tokio::test]
async fn preflight_from_untrusted_origin_is_forbidden() -> Result<()> {
    let app = app_with(Arc::new(FakeProvider::accepting()))?;

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/login")
                .header(ORIGIN, "https://example.com")
                .header(ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(
        !response
            .headers()
            .contains_key(ACCESS_CONTROL_ALLOW_ORIGIN)
    );
    Ok(())
}

#[tokio::test]
async fn responses_carry_request_id() -> Result<()> {
    let app = app_with(Arc::new(FakeProvider::accepting()))?;
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let app = app_with(Arc::new(FakeProvider::accepting()))?;
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "caller-supplied")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|value| value.to_str().ok()),
        Some("caller-supplied")
    );
    Ok(())
}
