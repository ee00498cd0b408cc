use std::env;
use std::io::Write;

use env_logger::fmt::WriteStyle;
use log::LevelFilter;

use crate::utils::error::Error;

pub const DEFAULT_LOGGER_NAME: &str = "radiusRP";

/// Env variable that determines the log level
pub const LOG_LEVEL_ENV: &str = "RADIUS_LOG_LEVEL";
/// Env variable that determines the logger config presets
pub const LOG_PROFILE_ENV: &str = "RADIUS_LOG_PROFILE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggerProfile {
    Production,
    Development,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Normal,
    Verbose,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerConfig {
    pub name: String,
    pub profile: LoggerProfile,
    /// Overrides the level chosen by the profile when set.
    pub verbosity: Option<Verbosity>,
}

impl LoggerConfig {
    /// Reads `RADIUS_LOG_PROFILE` and `RADIUS_LOG_LEVEL` from the process environment.
    pub fn from_env(name: &str) -> Result<LoggerConfig, Error> {
        let profile = env::var(LOG_PROFILE_ENV).ok();
        let level = env::var(LOG_LEVEL_ENV).ok();

        LoggerConfig::from_values(name, profile.as_deref(), level.as_deref())
    }

    /// Builds a configuration from raw switch values. Empty values count as unset.
    pub fn from_values(
        name: &str,
        profile: Option<&str>,
        level: Option<&str>,
    ) -> Result<LoggerConfig, Error> {
        let name = if name.is_empty() {
            DEFAULT_LOGGER_NAME
        } else {
            name
        };

        let profile = match profile.filter(|profile| !profile.is_empty()) {
            None => LoggerProfile::Production,
            Some(profile) if profile.eq_ignore_ascii_case("production") => {
                LoggerProfile::Production
            }
            Some(profile) if profile.eq_ignore_ascii_case("development") => {
                LoggerProfile::Development
            }
            Some(profile) => return Err(Error::InvalidLoggerProfile(profile.to_string())),
        };

        // unrecognized levels fall back to normal rather than failing startup
        let verbosity = level
            .filter(|level| !level.is_empty())
            .map(|level| {
                if level.eq_ignore_ascii_case("verbose") {
                    Verbosity::Verbose
                } else {
                    Verbosity::Normal
                }
            });

        Ok(LoggerConfig {
            name: name.to_string(),
            profile,
            verbosity,
        })
    }

    pub fn level_filter(&self) -> LevelFilter {
        match (self.verbosity, self.profile) {
            (Some(Verbosity::Verbose), _) => LevelFilter::Debug,
            (Some(Verbosity::Normal), _) => LevelFilter::Info,
            (None, LoggerProfile::Development) => LevelFilter::Debug,
            (None, LoggerProfile::Production) => LevelFilter::Info,
        }
    }

    /// Creates an `env_logger` builder carrying the profile preset.
    pub fn builder(&self) -> env_logger::Builder {
        let mut builder = env_logger::Builder::new();
        builder.filter_level(self.level_filter());

        let name = self.name.clone();
        match self.profile {
            LoggerProfile::Production => {
                builder.write_style(WriteStyle::Never);
                builder.format(move |buf, record| {
                    writeln!(
                        buf,
                        "{} {} {}: {}",
                        buf.timestamp_seconds(),
                        record.level(),
                        name,
                        record.args()
                    )
                });
            }
            LoggerProfile::Development => {
                builder.write_style(WriteStyle::Auto);
                builder.format(move |buf, record| {
                    writeln!(
                        buf,
                        "{} {} {} [{}]: {}",
                        buf.timestamp_millis(),
                        buf.default_styled_level(record.level()),
                        name,
                        record.module_path().unwrap_or("-"),
                        record.args()
                    )
                });
            }
        }

        builder
    }
}

/// Installs the global logger configured from the environment.
pub fn init_logger(name: &str) -> Result<LoggerConfig, Error> {
    let config = LoggerConfig::from_env(name)?;
    config.builder().try_init()?;

    Ok(config)
}
