use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

/// A single log entry.
///
/// `scope` names the component that produced the entry, e.g. `cache` or
/// `realtime`, so entries can be filtered when reading the log file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct LogMessage {
    /// The severity level of the message
    pub level: LogLevel,
    /// The component that emitted the message
    pub scope: &'static str,
    /// The actual message content
    pub message: String,
}

impl Display for LogMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] [{}] [{}] {}",
            chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
            self.level,
            self.scope,
            self.message
        )
    }
}

/// Describes the log level of a message.
///
/// # Ordering
/// The levels are ordered by severity: `Info` < `Warning` < `Error`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    /// Regular operational information
    Info,
    /// Something went wrong but the cache can carry on
    Warning,
    /// A failure that the user should look at
    Error,
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            _ => Err(anyhow::anyhow!("Invalid log level: {}", s)),
        }
    }
}
