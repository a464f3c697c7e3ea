use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{ArcStr, log::LogLevel};

/// Options for path-based configuration values.
#[derive(Debug, Clone, Copy)]
pub enum PathOpt {
    /// Directory where log files are stored
    LogDir,
}

/// Options for numeric configuration values.
#[derive(Debug, Clone, Copy)]
pub enum USizeOpt {
    /// Maximum age of log files in days before they are deleted
    MaxAge,
    /// Timeout for network requests in seconds
    Timeout,
    /// Items requested per page when the caller does not say
    PageSize,
    /// Seconds between reconnection attempts of the push channel
    RetryTimeout,
    /// Failed transport rounds tolerated before giving up on the push channel
    MaxRetryAttempts,
}

/// The configuration data structure that holds all configurable values.
///
/// Missing keys in the TOML file fall back to [`Data::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Data {
    /// Base URL of the pump.io server
    domain: ArcStr,
    /// OAuth bearer token sent with every request
    access_token: Option<ArcStr>,
    /// Directory where log files are stored
    log_dir: PathBuf,
    /// Current log level
    log_level: LogLevel,
    /// Maximum age of log files in days before they are deleted
    max_age: usize,
    /// Timeout for network requests in seconds
    timeout: usize,
    page_size: usize,
    retry_timeout: usize,
    max_retry_attempts: usize,
}

impl Default for Data {
    fn default() -> Self {
        Self {
            domain: ArcStr::from("http://localhost:31337"),
            access_token: None,
            log_dir: PathBuf::from("/tmp/pump-stream/logs"),
            log_level: LogLevel::Warning,
            max_age: 0,
            timeout: 30,
            page_size: 20,
            retry_timeout: 30,
            max_retry_attempts: 10,
        }
    }
}

impl Data {
    pub fn path(&self, opt: PathOpt) -> PathBuf {
        match opt {
            PathOpt::LogDir => self.log_dir.clone(),
        }
    }

    pub fn set_path(&mut self, opt: PathOpt, path: PathBuf) {
        match opt {
            PathOpt::LogDir => self.log_dir = path,
        }
    }

    pub fn log_level(&self) -> LogLevel {
        self.log_level
    }

    pub fn set_log_level(&mut self, level: LogLevel) {
        self.log_level = level;
    }

    pub fn usize(&self, opt: USizeOpt) -> usize {
        match opt {
            USizeOpt::MaxAge => self.max_age,
            USizeOpt::Timeout => self.timeout,
            USizeOpt::PageSize => self.page_size,
            USizeOpt::RetryTimeout => self.retry_timeout,
            USizeOpt::MaxRetryAttempts => self.max_retry_attempts,
        }
    }

    pub fn set_usize(&mut self, opt: USizeOpt, value: usize) {
        match opt {
            USizeOpt::MaxAge => self.max_age = value,
            USizeOpt::Timeout => self.timeout = value,
            USizeOpt::PageSize => self.page_size = value,
            USizeOpt::RetryTimeout => self.retry_timeout = value,
            USizeOpt::MaxRetryAttempts => self.max_retry_attempts = value,
        }
    }

    pub fn domain(&self) -> ArcStr {
        self.domain.clone()
    }

    pub fn set_domain(&mut self, domain: ArcStr) {
        self.domain = domain;
    }

    pub fn access_token(&self) -> Option<ArcStr> {
        self.access_token.clone()
    }

    pub fn set_access_token(&mut self, token: Option<ArcStr>) {
        self.access_token = token;
    }
}
