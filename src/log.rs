use std::{
    fmt::Display,
    path::PathBuf,
    sync::{Arc, Mutex},
};

use tokio::{
    sync::mpsc::{Sender, error::TrySendError},
    task::JoinHandle,
};

mod core;
mod data;
pub mod message;

pub use self::core::LogCore;
pub use data::{LogLevel, LogMessage};
use message::Message;

/// The logging actor.
///
/// Every call names the `scope` that emits it so the log file can be read
/// per component. Cloning is cheap as it only copies the channel sender.
///
/// # Examples
/// ```ignore
/// let log = Log::spawn(LogLevel::Warning, 7, log_dir).await?;
/// log.info("cache", "stream opened");
/// ```
#[derive(Debug, Clone)]
pub enum Log {
    /// A real logging actor that writes to files and stderr
    Actual(Sender<Message>),
    /// A mock that keeps every message in memory
    Mock(Arc<Mutex<Vec<LogMessage>>>),
}

impl From<LogCore> for Log {
    fn from(value: LogCore) -> Self {
        value.spawn().0
    }
}

impl Log {
    /// Builds a [`LogCore`] and spawns it.
    pub async fn spawn(level: LogLevel, max_age: usize, log_dir: PathBuf) -> anyhow::Result<Self> {
        Ok(LogCore::build(level, max_age, log_dir).await?.into())
    }

    pub fn mock() -> Self {
        Self::Mock(Arc::new(Mutex::new(Vec::new())))
    }

    /// Queues a message without blocking the caller. Messages sent after a
    /// flush are dropped.
    fn log(&self, scope: &'static str, message: String, level: LogLevel) {
        let message = LogMessage {
            level,
            scope,
            message,
        };

        match self {
            Log::Mock(messages) => {
                if let Ok(mut lock) = messages.lock() {
                    lock.push(message);
                }
            }
            Log::Actual(sender) => {
                if let Err(TrySendError::Full(message)) = sender.try_send(Message::Log(message)) {
                    let sender = sender.clone();
                    tokio::spawn(async move {
                        let _ = sender.send(message).await;
                    });
                }
            }
        }
    }

    /// Log a message with the `INFO` level
    pub fn info<M: Display>(&self, scope: &'static str, message: M) {
        self.log(scope, message.to_string(), LogLevel::Info);
    }

    /// Log a message with the `WARNING` level
    pub fn warn<M: Display>(&self, scope: &'static str, message: M) {
        self.log(scope, message.to_string(), LogLevel::Warning);
    }

    /// Log a message with the `ERROR` level
    pub fn error<M: Display>(&self, scope: &'static str, message: M) {
        self.log(scope, message.to_string(), LogLevel::Error);
    }

    /// Log an info message if the result is an error
    /// and return the result as is
    pub fn info_on_error<T, E: Display>(
        &self,
        scope: &'static str,
        result: Result<T, E>,
    ) -> Result<T, E> {
        if let Err(err) = &result {
            self.log(scope, err.to_string(), LogLevel::Info);
        }
        result
    }

    /// Log a warning message if the result is an error
    /// and return the result as is
    pub fn warn_on_error<T, E: Display>(
        &self,
        scope: &'static str,
        result: Result<T, E>,
    ) -> Result<T, E> {
        if let Err(err) = &result {
            self.log(scope, err.to_string(), LogLevel::Warning);
        }
        result
    }

    /// Log an error message if the result is an error
    /// and return the result as is
    pub fn error_on_error<T, E: Display>(
        &self,
        scope: &'static str,
        result: Result<T, E>,
    ) -> Result<T, E> {
        if let Err(err) = &result {
            self.log(scope, err.to_string(), LogLevel::Error);
        }
        result
    }

    /// Prints the buffered messages to stderr and stops the logger. Messages
    /// logged afterwards are discarded.
    pub fn flush(self) -> JoinHandle<()> {
        match self {
            Log::Actual(sender) => tokio::spawn(async move {
                let _ = sender.send(Message::Flush).await;
            }),
            Log::Mock(messages) => tokio::spawn(async move {
                if let Ok(lock) = messages.lock() {
                    for message in lock.iter() {
                        eprintln!("{message}");
                    }
                }
            }),
        }
    }

    /// Deletes log files older than the `max_age` given to [`Log::spawn`].
    pub async fn collect_garbage(&self) {
        let Self::Actual(sender) = self else {
            return;
        };
        let _ = sender.send(Message::CollectGarbage).await;
    }

    /// Messages recorded by the mock, in order. Empty for the real logger.
    pub fn messages(&self) -> Vec<LogMessage> {
        match self {
            Log::Mock(messages) => messages
                .lock()
                .map(|lock| lock.clone())
                .unwrap_or_default(),
            Log::Actual(_) => Vec::new(),
        }
    }
}
