use crate::api::{
    self,
    handlers::auth::{
        AuthConfig, AuthState, CookiePolicy, DeploymentPolicy, Environment, OriginPolicy,
    },
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::{sync::Arc, time::Duration};
use tracing::info;
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub provider_url: Url,
    pub provider_api_key: SecretString,
    pub provider_timeout_seconds: u64,
    pub jwt_secret: SecretString,
    pub jwt_issuer: Option<String>,
    pub jwt_audience: Option<String>,
    pub jwt_leeway_seconds: u64,
    pub trusted_origin_suffixes: Vec<String>,
    pub cookie_policy: DeploymentPolicy,
    pub cookie_domain: Option<String>,
    pub environment: Environment,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the configuration is inconsistent or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let port = args.port;
    let state = build_state(args)?;
    api::new(port, Arc::new(state)).await
}

/// Validate the arguments and assemble the shared auth state.
///
/// # Errors
/// Returns an error for an empty origin suffix, an insecure cross-site cookie policy,
/// or a provider client that cannot be built.
pub fn build_state(args: Args) -> Result<AuthState> {
    let origin_policy = OriginPolicy::new(args.trusted_origin_suffixes)
        .context("Invalid trusted origin suffix")?;

    // Cross-site cookies default to the parent domain of the first trusted suffix.
    let cookie_domain = match (args.cookie_policy, args.cookie_domain) {
        (_, Some(domain)) => Some(domain),
        (DeploymentPolicy::CrossSite, None) => origin_policy
            .suffixes()
            .first()
            .map(|suffix| format!(".{suffix}")),
        (DeploymentPolicy::SameSite, None) => None,
    };
    let cookie_policy = CookiePolicy::new(args.cookie_policy, args.environment, cookie_domain)
        .context("Invalid cookie policy")?;

    log_startup(
        args.port,
        &args.provider_url,
        &origin_policy,
        &cookie_policy,
        args.environment,
    );

    let config = AuthConfig::new(
        args.provider_url,
        args.provider_api_key,
        args.jwt_secret,
        origin_policy,
        cookie_policy,
    )
    .with_provider_timeout(Duration::from_secs(args.provider_timeout_seconds))
    .with_jwt_issuer(args.jwt_issuer)
    .with_jwt_audience(args.jwt_audience)
    .with_jwt_leeway_seconds(args.jwt_leeway_seconds);

    AuthState::from_config(config)
}

fn log_startup(
    port: u16,
    provider_url: &Url,
    origin_policy: &OriginPolicy,
    cookie_policy: &CookiePolicy,
    environment: Environment,
) {
    let entries = [
        ("listen", format!("tcp:{port}")),
        ("provider_url", provider_url.to_string()),
        ("trusted_origins", origin_policy.suffixes().join(",")),
        ("cookie_same_site", cookie_policy.same_site().as_str().to_string()),
        (
            "cookie_domain",
            cookie_policy
                .domain()
                .map_or_else(|| "host-only".to_string(), ToString::to_string),
        ),
        ("cookie_secure", cookie_policy.secure().to_string()),
        ("environment", environment.as_str().to_string()),
    ];

    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!(
        "{} {} - {}\n\nStartup configuration:",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        short_commit(crate::GIT_COMMIT_HASH)
    );
    for (key, value) in entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ =
            std::fmt::Write::write_fmt(&mut message, format_args!("\n  {key}:{padding} {value}"));
    }
    info!("{message}");
}

fn short_commit(hash: &str) -> String {
    let trimmed = hash.trim();
    if trimmed.len() > 7 {
        trimmed[..7].to_string()
    } else {
        trimmed.to_string()
    }
}
