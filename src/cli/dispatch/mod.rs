//! Map validated CLI arguments to the action the binary runs.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{cookies, upstream};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);

    crate::cli::commands::validate(matches).map_err(|e| anyhow::anyhow!(e))?;

    let upstream_opts = upstream::Options::parse(matches)?;
    let cookie_opts = cookies::Options::parse(matches);

    Ok(Action::Server(Args {
        port,
        upstream_url: upstream_opts.url,
        upstream_timeout_seconds: upstream_opts.timeout_seconds,
        refresh_timeout_seconds: upstream_opts.refresh_timeout_seconds,
        production: cookie_opts.production,
        access_cookie_name: cookie_opts.access_name,
        refresh_cookie_name: cookie_opts.refresh_name,
        access_cookie_max_age_seconds: cookie_opts.access_max_age_seconds,
        refresh_cookie_max_age_seconds: cookie_opts.refresh_max_age_seconds,
    }))
}
