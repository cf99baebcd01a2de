//! Leveled logging for components.
//!
//! Components log through the [`Logger`] handed out by the kernel. The
//! default [`LogFacadeLogger`] forwards to the `log` facade, so whatever
//! backend the host installed (usually `env_logger`) receives the records.
use std::fmt;
use std::str::FromStr;

use crate::kernel::constants::LOG_TARGET;
use crate::kernel::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    /// Logged as an error. Never terminates the process.
    Fatal,
}

impl From<LogLevel> for log::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Info => log::Level::Info,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Error | LogLevel::Fatal => log::Level::Error,
        }
    }
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        log::Level::from(level).to_level_filter()
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Fatal => "fatal",
        };
        f.write_str(name)
    }
}

impl FromStr for LogLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "fatal" => Ok(LogLevel::Fatal),
            other => Err(Error::InvalidInput(format!("unknown log level '{}'", other))),
        }
    }
}

pub trait Logger: Send + Sync + fmt::Debug {
    fn log(&self, level: LogLevel, message: &str);

    /// Log preformatted arguments, as produced by `format_args!`.
    fn logf(&self, level: LogLevel, args: fmt::Arguments<'_>) {
        self.log(level, &args.to_string());
    }
}

/// [`Logger`] backed by the `log` crate.
#[derive(Debug, Clone)]
pub struct LogFacadeLogger {
    target: String,
}

impl LogFacadeLogger {
    pub fn new(target: impl Into<String>) -> Self {
        Self { target: target.into() }
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

impl Default for LogFacadeLogger {
    fn default() -> Self {
        Self::new(LOG_TARGET)
    }
}

impl Logger for LogFacadeLogger {
    fn log(&self, level: LogLevel, message: &str) {
        log::log!(target: &self.target, log::Level::from(level), "{}", message);
    }
}
