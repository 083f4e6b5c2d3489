pub mod cookies;
pub mod logging;
pub mod upstream;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ColorChoice, Command,
};

use self::upstream::ARG_UPSTREAM_URL;

/// Validate that the upstream URL is an absolute `http(s)` URL.
///
/// # Errors
/// Returns an error string if the URL cannot be parsed or uses another scheme.
pub fn validate(matches: &clap::ArgMatches) -> Result<(), String> {
    let Some(raw) = matches.get_one::<String>(ARG_UPSTREAM_URL) else {
        return Ok(()); // Should be handled by required=true in clap
    };

    let url = url::Url::parse(raw).map_err(|err| format!("Invalid --{ARG_UPSTREAM_URL}: {err}"))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(format!(
            "Invalid --{ARG_UPSTREAM_URL}: unsupported scheme {scheme}"
        )),
    }
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("portero")
        .about("Cookie session edge for an upstream identity API")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("PORTERO_PORT")
                .value_parser(clap::value_parser!(u16)),
        );

    let command = upstream::with_args(command);
    let command = cookies::with_args(command);
    logging::with_args(command)
}
