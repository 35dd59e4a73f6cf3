use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_JWT_SECRET: &str = "jwt-secret";
pub const ARG_JWT_ISSUER: &str = "jwt-issuer";
pub const ARG_JWT_AUDIENCE: &str = "jwt-audience";
pub const ARG_JWT_LEEWAY_SECONDS: &str = "jwt-leeway-seconds";

#[derive(Debug, Clone)]
pub struct Options {
    pub secret: SecretString,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    pub leeway_seconds: u64,
}

impl Options {
    /// Parse token verification arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the signing secret is missing.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let secret = match matches.get_one::<String>(ARG_JWT_SECRET) {
            Some(value) if !value.is_empty() => SecretString::from(value.clone()),
            _ => anyhow::bail!("missing required argument: --{ARG_JWT_SECRET}"),
        };

        // Helper to filter empty strings which clap might pass through if env vars are set to ""
        let get_non_empty = |id: &str| {
            matches
                .get_one::<String>(id)
                .cloned()
                .filter(|v| !v.trim().is_empty())
        };

        Ok(Self {
            secret,
            issuer: get_non_empty(ARG_JWT_ISSUER),
            audience: get_non_empty(ARG_JWT_AUDIENCE),
            leeway_seconds: matches
                .get_one::<u64>(ARG_JWT_LEEWAY_SECONDS)
                .copied()
                .unwrap_or(0),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_JWT_SECRET)
                .long(ARG_JWT_SECRET)
                .help("Shared secret the provider signs access tokens with (HMAC)")
                .long_help(
                    "Shared secret the provider signs access tokens with (HS256/HS384/HS512).\n\nTokens presented in the access_token cookie are verified locally against this secret;\nthe provider is never called to validate a token.",
                )
                .env("COOKIEBRIDGE_JWT_SECRET")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_JWT_ISSUER)
                .long(ARG_JWT_ISSUER)
                .help("Expected token issuer (iss), not checked when unset")
                .env("COOKIEBRIDGE_JWT_ISSUER"),
        )
        .arg(
            Arg::new(ARG_JWT_AUDIENCE)
                .long(ARG_JWT_AUDIENCE)
                .help("Expected token audience (aud), not checked when unset")
                .env("COOKIEBRIDGE_JWT_AUDIENCE"),
        )
        .arg(
            Arg::new(ARG_JWT_LEEWAY_SECONDS)
                .long(ARG_JWT_LEEWAY_SECONDS)
                .help("Clock skew tolerated when checking exp/nbf, in seconds")
                .env("COOKIEBRIDGE_JWT_LEEWAY_SECONDS")
                .default_value("0")
                .value_parser(clap::value_parser!(u64).range(0..=300)),
        )
}
