//! Command-line argument dispatch.
//!
//! Maps validated CLI matches to an [`Action`], collecting every option group into
//! the server arguments.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{jwt, provider, session};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(4444);

    let provider_opts = provider::Options::parse(matches)?;
    let jwt_opts = jwt::Options::parse(matches)?;
    let session_opts = session::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        provider_url: provider_opts.url,
        provider_api_key: provider_opts.api_key,
        provider_timeout_seconds: provider_opts.timeout_seconds,
        jwt_secret: jwt_opts.secret,
        jwt_issuer: jwt_opts.issuer,
        jwt_audience: jwt_opts.audience,
        jwt_leeway_seconds: jwt_opts.leeway_seconds,
        trusted_origin_suffixes: session_opts.trusted_origin_suffixes,
        cookie_policy: session_opts.cookie_policy,
        cookie_domain: session_opts.cookie_domain,
        environment: session_opts.environment,
    }))
}
