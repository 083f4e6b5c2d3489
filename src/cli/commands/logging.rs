use clap::{builder::ValueParser, Arg, ArgMatches, Command};

pub const ARG_VERBOSITY: &str = "verbosity";
pub const ARG_LOG_LEVEL: &str = "log-level";

#[must_use]
pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

/// Effective verbosity: `-v` occurrences win, otherwise `--log-level`.
#[must_use]
pub fn verbosity(matches: &ArgMatches) -> u8 {
    match matches.get_one::<u8>(ARG_VERBOSITY).copied() {
        Some(count) if count > 0 => count,
        _ => matches.get_one::<u8>(ARG_LOG_LEVEL).copied().unwrap_or(0),
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_VERBOSITY)
                .short('v')
                .long("verbose")
                .help("Increase verbosity: -v WARN, -vv INFO, -vvv DEBUG, -vvvv TRACE")
                .global(true)
                .action(clap::ArgAction::Count),
        )
        .arg(
            Arg::new(ARG_LOG_LEVEL)
                .long(ARG_LOG_LEVEL)
                .help("Log level: ERROR, WARN, INFO, DEBUG, TRACE or 0-5 (default: ERROR)")
                .env("PORTERO_LOG_LEVEL")
                .global(true)
                .value_parser(validator_log_level()),
        )
}
