use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};

pub const ARG_UPSTREAM_URL: &str = "upstream-url";
pub const ARG_UPSTREAM_TIMEOUT_SECONDS: &str = "upstream-timeout-seconds";
pub const ARG_REFRESH_TIMEOUT_SECONDS: &str = "refresh-timeout-seconds";

#[derive(Debug)]
pub struct Options {
    pub url: String,
    pub timeout_seconds: u64,
    pub refresh_timeout_seconds: u64,
}

impl Options {
    /// # Errors
    /// Returns an error if the upstream URL is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let url = matches
            .get_one::<String>(ARG_UPSTREAM_URL)
            .cloned()
            .context("missing required argument: --upstream-url")?;

        Ok(Self {
            url,
            timeout_seconds: matches
                .get_one::<u64>(ARG_UPSTREAM_TIMEOUT_SECONDS)
                .copied()
                .unwrap_or(10),
            refresh_timeout_seconds: matches
                .get_one::<u64>(ARG_REFRESH_TIMEOUT_SECONDS)
                .copied()
                .unwrap_or(15),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_UPSTREAM_URL)
                .short('u')
                .long(ARG_UPSTREAM_URL)
                .help("Base URL of the upstream identity API")
                .env("PORTERO_UPSTREAM_URL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_UPSTREAM_TIMEOUT_SECONDS)
                .long(ARG_UPSTREAM_TIMEOUT_SECONDS)
                .help("Timeout for a single upstream request in seconds")
                .env("PORTERO_UPSTREAM_TIMEOUT_SECONDS")
                .default_value("10")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new(ARG_REFRESH_TIMEOUT_SECONDS)
                .long(ARG_REFRESH_TIMEOUT_SECONDS)
                .help("Upper bound for a shared token refresh in seconds")
                .env("PORTERO_REFRESH_TIMEOUT_SECONDS")
                .default_value("15")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}
