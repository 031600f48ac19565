// Logger setup
// Terminal output is colored and the log file can be rotated every day.

use std::{fs, path::Path, str::FromStr};

use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Log level override for a single module, written `module=level`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleConfig {
    pub module: String,
    pub level: LogLevel,
}

impl FromStr for ModuleConfig {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (module, level) = s
            .split_once('=')
            .ok_or_else(|| LoggerError::InvalidModuleConfig(s.to_owned()))?;
        let level = LogLevel::from_str(level.trim())
            .map_err(|_| LoggerError::InvalidModuleConfig(s.to_owned()))?;

        Ok(Self {
            module: module.trim().to_owned(),
            level,
        })
    }
}

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("Invalid module log configuration '{0}', expected module=level")]
    InvalidModuleConfig(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    SetLogger(#[from] log::SetLoggerError),
}

pub fn default_logs_datetime_format() -> String {
    "[%Y-%m-%d] (%H:%M:%S%.3f)".to_owned()
}

pub struct LoggerConfig<'a> {
    pub level: LogLevel,
    pub file_level: LogLevel,
    pub dir_path: &'a str,
    pub filename_log: &'a str,
    pub disable_file_logging: bool,
    pub disable_file_log_date_based: bool,
    pub disable_colors: bool,
    pub module_logs: Vec<ModuleConfig>,
    pub logs_datetime_format: String,
}

/// Install the global logger, can only be called once per process
pub fn init_logger(config: LoggerConfig<'_>) -> Result<(), LoggerError> {
    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Cyan)
        .trace(Color::Magenta);

    let max_level = LevelFilter::from(config.level).max(LevelFilter::from(config.file_level));
    let mut base = fern::Dispatch::new().level(max_level);
    for module in &config.module_logs {
        base = base.level_for(module.module.clone(), module.level.into());
    }

    let datetime_format = config.logs_datetime_format.clone();
    let disable_colors = config.disable_colors;
    let terminal = fern::Dispatch::new()
        .level(config.level.into())
        .format(move |out, message, record| {
            let now = chrono::Local::now().format(&datetime_format);
            if disable_colors {
                out.finish(format_args!(
                    "{} {} {} > {}",
                    now,
                    record.level(),
                    record.target(),
                    message
                ))
            } else {
                out.finish(format_args!(
                    "{} {} {} > {}",
                    now,
                    colors.color(record.level()),
                    record.target(),
                    message
                ))
            }
        })
        .chain(std::io::stdout());
    base = base.chain(terminal);

    if !config.disable_file_logging {
        fs::create_dir_all(config.dir_path)?;

        let datetime_format = config.logs_datetime_format.clone();
        let file = fern::Dispatch::new()
            .level(config.file_level.into())
            .format(move |out, message, record| {
                out.finish(format_args!(
                    "{} {} {} > {}",
                    chrono::Local::now().format(&datetime_format),
                    record.level(),
                    record.target(),
                    message
                ))
            });

        let file = if config.disable_file_log_date_based {
            file.chain(fern::log_file(
                Path::new(config.dir_path).join(config.filename_log),
            )?)
        } else {
            // dir_path ends with a separator, the date is part of the file name
            file.chain(fern::DateBased::new(
                config.dir_path,
                format!("%Y-%m-%d.{}", config.filename_log),
            ))
        };
        base = base.chain(file);
    }

    base.apply()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_config_parse() {
        let config = ModuleConfig::from_str("harvest_daemon::core::storage=trace").unwrap();
        assert_eq!(config.module, "harvest_daemon::core::storage");
        assert_eq!(config.level, LogLevel::Trace);

        assert!(ModuleConfig::from_str("no_level").is_err());
        assert!(ModuleConfig::from_str("module=loud").is_err());
    }

    #[test]
    fn test_log_level_names() {
        assert_eq!(LogLevel::from_str("WARN").unwrap(), LogLevel::Warn);
        assert_eq!(LogLevel::Debug.to_string(), "debug");
        assert_eq!(LevelFilter::from(LogLevel::Off), LevelFilter::Off);
    }
}
