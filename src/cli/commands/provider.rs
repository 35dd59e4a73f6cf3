use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;
use url::Url;

pub const ARG_PROVIDER_URL: &str = "provider-url";
pub const ARG_PROVIDER_API_KEY: &str = "provider-api-key";
pub const ARG_PROVIDER_TIMEOUT_SECONDS: &str = "provider-timeout-seconds";

#[derive(Debug, Clone)]
pub struct Options {
    pub url: Url,
    pub api_key: SecretString,
    pub timeout_seconds: u64,
}

impl Options {
    /// Parse identity provider arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the URL or API key is missing, or the URL is not http(s).
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let url = match matches.get_one::<String>(ARG_PROVIDER_URL) {
            Some(value) if !value.trim().is_empty() => value.trim().to_string(),
            _ => anyhow::bail!("missing required argument: --{ARG_PROVIDER_URL}"),
        };
        let url = Url::parse(&url)
            .map_err(|err| anyhow::anyhow!("invalid --{ARG_PROVIDER_URL} {url}: {err}"))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("--{ARG_PROVIDER_URL} must use http or https: {url}");
        }

        let api_key = match matches.get_one::<String>(ARG_PROVIDER_API_KEY) {
            Some(value) if !value.trim().is_empty() => SecretString::from(value.trim().to_string()),
            _ => anyhow::bail!("missing required argument: --{ARG_PROVIDER_API_KEY}"),
        };

        let timeout_seconds = matches
            .get_one::<u64>(ARG_PROVIDER_TIMEOUT_SECONDS)
            .copied()
            .unwrap_or(10);

        Ok(Self {
            url,
            api_key,
            timeout_seconds,
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_PROVIDER_URL)
                .long(ARG_PROVIDER_URL)
                .help("Identity provider base URL, example: https://<project>.supabase.co")
                .env("COOKIEBRIDGE_PROVIDER_URL"),
        )
        .arg(
            Arg::new(ARG_PROVIDER_API_KEY)
                .long(ARG_PROVIDER_API_KEY)
                .help("Identity provider public (anon) API key")
                .env("COOKIEBRIDGE_PROVIDER_API_KEY")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_PROVIDER_TIMEOUT_SECONDS)
                .long(ARG_PROVIDER_TIMEOUT_SECONDS)
                .help("Timeout for the credential exchange call, in seconds")
                .env("COOKIEBRIDGE_PROVIDER_TIMEOUT_SECONDS")
                .default_value("10")
                .value_parser(clap::value_parser!(u64).range(1..=60)),
        )
}
