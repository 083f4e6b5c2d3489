use clap::{Arg, ArgMatches, Command};

pub const ARG_ENVIRONMENT: &str = "environment";
pub const ARG_ACCESS_COOKIE_NAME: &str = "access-cookie-name";
pub const ARG_REFRESH_COOKIE_NAME: &str = "refresh-cookie-name";
pub const ARG_ACCESS_COOKIE_MAX_AGE_SECONDS: &str = "access-cookie-max-age-seconds";
pub const ARG_REFRESH_COOKIE_MAX_AGE_SECONDS: &str = "refresh-cookie-max-age-seconds";

#[derive(Debug)]
pub struct Options {
    pub production: bool,
    pub access_name: String,
    pub refresh_name: String,
    pub access_max_age_seconds: i64,
    pub refresh_max_age_seconds: i64,
}

impl Options {
    #[must_use]
    pub fn parse(matches: &ArgMatches) -> Self {
        let string = |id: &str, default: &str| {
            matches
                .get_one::<String>(id)
                .cloned()
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            production: matches
                .get_one::<String>(ARG_ENVIRONMENT)
                .is_some_and(|env| env == "production"),
            access_name: string(ARG_ACCESS_COOKIE_NAME, "access_token"),
            refresh_name: string(ARG_REFRESH_COOKIE_NAME, "refresh_token"),
            access_max_age_seconds: matches
                .get_one::<i64>(ARG_ACCESS_COOKIE_MAX_AGE_SECONDS)
                .copied()
                .unwrap_or(900),
            refresh_max_age_seconds: matches
                .get_one::<i64>(ARG_REFRESH_COOKIE_MAX_AGE_SECONDS)
                .copied()
                .unwrap_or(2_592_000),
        }
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_ENVIRONMENT)
                .short('e')
                .long(ARG_ENVIRONMENT)
                .help("Deployment environment; production marks cookies Secure")
                .env("PORTERO_ENV")
                .default_value("development")
                .value_parser(["development", "production"]),
        )
        .arg(
            Arg::new(ARG_ACCESS_COOKIE_NAME)
                .long(ARG_ACCESS_COOKIE_NAME)
                .help("Name of the access credential cookie")
                .env("PORTERO_ACCESS_COOKIE_NAME")
                .default_value("access_token"),
        )
        .arg(
            Arg::new(ARG_REFRESH_COOKIE_NAME)
                .long(ARG_REFRESH_COOKIE_NAME)
                .help("Name of the refresh credential cookie")
                .env("PORTERO_REFRESH_COOKIE_NAME")
                .default_value("refresh_token"),
        )
        .arg(
            Arg::new(ARG_ACCESS_COOKIE_MAX_AGE_SECONDS)
                .long(ARG_ACCESS_COOKIE_MAX_AGE_SECONDS)
                .help("Max-Age of the access cookie in seconds, 0 for a session cookie")
                .env("PORTERO_ACCESS_COOKIE_MAX_AGE_SECONDS")
                .default_value("900")
                .value_parser(clap::value_parser!(i64).range(0..)),
        )
        .arg(
            Arg::new(ARG_REFRESH_COOKIE_MAX_AGE_SECONDS)
                .long(ARG_REFRESH_COOKIE_MAX_AGE_SECONDS)
                .help("Max-Age of the refresh cookie in seconds, 0 for a session cookie")
                .env("PORTERO_REFRESH_COOKIE_MAX_AGE_SECONDS")
                .default_value("2592000")
                .value_parser(clap::value_parser!(i64).range(0..)),
        )
}
