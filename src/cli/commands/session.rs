use crate::api::handlers::auth::{DeploymentPolicy, Environment};
use clap::{Arg, ArgMatches, Command};

pub const ARG_TRUSTED_ORIGIN_SUFFIX: &str = "trusted-origin-suffix";
pub const ARG_COOKIE_POLICY: &str = "cookie-policy";
pub const ARG_COOKIE_DOMAIN: &str = "cookie-domain";
pub const ARG_ENVIRONMENT: &str = "environment";

#[derive(Debug, Clone)]
pub struct Options {
    pub trusted_origin_suffixes: Vec<String>,
    pub cookie_policy: DeploymentPolicy,
    pub cookie_domain: Option<String>,
    pub environment: Environment,
}

impl Options {
    /// Parse origin and cookie arguments from matches.
    ///
    /// # Errors
    /// Returns an error if no trusted suffix is configured, or a policy value is unknown.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let trusted_origin_suffixes: Vec<String> = matches
            .get_many::<String>(ARG_TRUSTED_ORIGIN_SUFFIX)
            .map(|values| values.cloned().collect())
            .unwrap_or_default();
        if trusted_origin_suffixes.is_empty() {
            anyhow::bail!("missing required argument: --{ARG_TRUSTED_ORIGIN_SUFFIX}");
        }

        let cookie_policy = matches
            .get_one::<String>(ARG_COOKIE_POLICY)
            .map_or("cross-site", String::as_str)
            .parse::<DeploymentPolicy>()?;

        let environment = matches
            .get_one::<String>(ARG_ENVIRONMENT)
            .map_or("production", String::as_str)
            .parse::<Environment>()?;

        let cookie_domain = matches
            .get_one::<String>(ARG_COOKIE_DOMAIN)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        Ok(Self {
            trusted_origin_suffixes,
            cookie_policy,
            cookie_domain,
            environment,
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_TRUSTED_ORIGIN_SUFFIX)
                .long(ARG_TRUSTED_ORIGIN_SUFFIX)
                .help("Trusted origin host suffix, comma separated, example: .example.com")
                .long_help(
                    "Browser origins whose hostname ends with one of these suffixes may call the proxy.\n\nThe apex domain itself is not trusted: with suffix example.com, app.example.com is\nallowed and example.com is not. Requests without an Origin header are allowed.",
                )
                .env("COOKIEBRIDGE_TRUSTED_ORIGIN_SUFFIX")
                .value_delimiter(','),
        )
        .arg(
            Arg::new(ARG_COOKIE_POLICY)
                .long(ARG_COOKIE_POLICY)
                .help("Session cookie deployment policy")
                .long_help(
                    "Session cookie deployment policy.\n\ncross-site: SameSite=None; Secure; Domain=<cookie domain>. Frontend and proxy live on\ndifferent hosts of the trusted domain.\nsame-site: SameSite=Strict; Secure; host-only cookie.",
                )
                .env("COOKIEBRIDGE_COOKIE_POLICY")
                .default_value("cross-site")
                .value_parser(["cross-site", "same-site"]),
        )
        .arg(
            Arg::new(ARG_COOKIE_DOMAIN)
                .long(ARG_COOKIE_DOMAIN)
                .help("Cookie Domain attribute, defaults to the first trusted suffix for cross-site")
                .env("COOKIEBRIDGE_COOKIE_DOMAIN"),
        )
        .arg(
            Arg::new(ARG_ENVIRONMENT)
                .long(ARG_ENVIRONMENT)
                .help("Deployment environment, development drops the Secure attribute")
                .env("COOKIEBRIDGE_ENVIRONMENT")
                .default_value("production")
                .value_parser(["production", "development"]),
        )
}
