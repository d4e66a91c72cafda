//! Configuration loading from the command line and environment.

use std::ffi::OsString;

use clap::Parser;
use thiserror::Error;

use super::schema::{Config, Settings};
use super::validation::{validate_config, ValidationError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Args(#[from] clap::Error),

    #[error("failed to parse config: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Load and validate configuration from the process arguments and environment.
pub fn load_config() -> Result<Settings, ConfigError> {
    load_config_from(std::env::args_os())
}

/// Load and validate configuration from explicit arguments, first being the program name.
pub fn load_config_from<I, T>(args: I) -> Result<Settings, ConfigError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let config = Config::try_parse_from(args)?;
    validate_config(&config).map_err(ConfigError::Validation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let settings = load_config_from([
            "calculator-service",
            "--listen-grpc",
            "127.0.0.1:50051",
            "--loglevel",
            "warn",
            "--logfmt",
            "quick",
            "--startup-grace-ms",
            "250",
        ])
        .unwrap();

        assert_eq!(settings.listen_grpc, "127.0.0.1:50051".parse().unwrap());
        assert_eq!(settings.log.level.as_deref(), Some("warn"));
        assert_eq!(settings.log.format, "quick");
        assert_eq!(settings.startup_grace.as_millis(), 250);
    }

    #[test]
    fn validation_errors_are_joined() {
        let err = load_config_from(["calculator-service", "--listen-http", "nowhere"]).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().starts_with("failed to parse config: LISTEN_HTTP"));
    }

    #[test]
    fn logplain_accepts_any_truthy_value() {
        for (value, plain) in [("1", true), ("yes", true), ("true", true), ("0", false), ("false", false)] {
            std::env::set_var("LOGPLAIN", value);
            let settings = load_config_from(["calculator-service"]);
            std::env::remove_var("LOGPLAIN");
            assert_eq!(settings.unwrap().log.plain, plain, "LOGPLAIN={value}");
        }

        let settings = load_config_from(["calculator-service", "--logplain"]).unwrap();
        assert!(settings.log.plain);
    }

    #[test]
    fn unknown_flag_is_an_argument_error() {
        let err = load_config_from(["calculator-service", "--no-such-flag"]).unwrap_err();
        assert!(matches!(err, ConfigError::Args(_)));
    }
}
