use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use tokio::sync::{Mutex, mpsc::Sender, oneshot};

pub use data::{Data, PathOpt, USizeOpt};
use message::Message;

use crate::{ArcStr, log::LogLevel};

mod core;
mod data;
pub mod message;
#[cfg(test)]
mod tests;

/// The configuration actor, backed by a TOML file.
///
/// # Examples
/// ```ignore
/// let config = Config::spawn(path);
/// config.load().await?;
/// let page_size = config.usize(USizeOpt::PageSize).await?;
/// ```
#[derive(Debug, Clone)]
pub enum Config {
    /// A real configuration actor that reads from and writes to a file
    Actual(Sender<Message>),
    /// A mock implementation for testing that stores data in memory
    Mock(Arc<Mutex<Data>>),
}

impl Config {
    /// Spawns a configuration actor for the file at `path`. Nothing is read
    /// until [`Config::load`] is called.
    pub fn spawn(path: PathBuf) -> Self {
        let (config, _) = self::core::Core::new(path).spawn();
        config
    }

    pub fn mock(data: Data) -> Self {
        Self::Mock(Arc::new(Mutex::new(data)))
    }

    /// Default location: `$HOME/.config/pump-stream/config.toml`.
    pub fn default_path() -> PathBuf {
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir)
            .join(".config")
            .join("pump-stream")
            .join("config.toml")
    }

    async fn request<T>(
        sender: &Sender<Message>,
        message: impl FnOnce(oneshot::Sender<T>) -> Message,
    ) -> anyhow::Result<T> {
        let (tx, rx) = oneshot::channel();
        sender
            .send(message(tx))
            .await
            .context("Sending message to Config actor")?;
        rx.await.context("Awaiting response from Config actor")
    }

    async fn notify(sender: &Sender<Message>, message: Message) -> anyhow::Result<()> {
        sender
            .send(message)
            .await
            .context("Sending message to Config actor")
    }

    /// Loads the configuration from the file. For the mock this is a no-op.
    pub async fn load(&self) -> anyhow::Result<()> {
        match self {
            Self::Actual(sender) => Self::request(sender, |tx| Message::Load { tx }).await?,
            Self::Mock(_) => Ok(()),
        }
    }

    /// Saves the current configuration to the file. For the mock this is a no-op.
    pub async fn save(&self) -> anyhow::Result<()> {
        match self {
            Self::Actual(sender) => Self::request(sender, |tx| Message::Save { tx }).await?,
            Self::Mock(_) => Ok(()),
        }
    }

    pub async fn path(&self, opt: PathOpt) -> anyhow::Result<PathBuf> {
        match self {
            Self::Actual(sender) => Self::request(sender, |tx| Message::GetPath { opt, tx }).await,
            Self::Mock(data) => Ok(data.lock().await.path(opt)),
        }
    }

    pub async fn set_path(&self, opt: PathOpt, path: PathBuf) -> anyhow::Result<()> {
        match self {
            Self::Actual(sender) => Self::notify(sender, Message::SetPath { opt, path }).await,
            Self::Mock(data) => {
                data.lock().await.set_path(opt, path);
                Ok(())
            }
        }
    }

    pub async fn log_level(&self) -> anyhow::Result<LogLevel> {
        match self {
            Self::Actual(sender) => Self::request(sender, |tx| Message::GetLogLevel { tx }).await,
            Self::Mock(data) => Ok(data.lock().await.log_level()),
        }
    }

    pub async fn set_log_level(&self, level: LogLevel) -> anyhow::Result<()> {
        match self {
            Self::Actual(sender) => Self::notify(sender, Message::SetLogLevel { level }).await,
            Self::Mock(data) => {
                data.lock().await.set_log_level(level);
                Ok(())
            }
        }
    }

    pub async fn usize(&self, opt: USizeOpt) -> anyhow::Result<usize> {
        match self {
            Self::Actual(sender) => Self::request(sender, |tx| Message::GetUSize { opt, tx }).await,
            Self::Mock(data) => Ok(data.lock().await.usize(opt)),
        }
    }

    pub async fn set_usize(&self, opt: USizeOpt, size: usize) -> anyhow::Result<()> {
        match self {
            Self::Actual(sender) => Self::notify(sender, Message::SetUSize { opt, size }).await,
            Self::Mock(data) => {
                data.lock().await.set_usize(opt, size);
                Ok(())
            }
        }
    }

    /// Base URL of the server relative stream URLs are resolved against.
    pub async fn domain(&self) -> anyhow::Result<ArcStr> {
        match self {
            Self::Actual(sender) => Self::request(sender, |tx| Message::GetDomain { tx }).await,
            Self::Mock(data) => Ok(data.lock().await.domain()),
        }
    }

    pub async fn set_domain(&self, domain: ArcStr) -> anyhow::Result<()> {
        match self {
            Self::Actual(sender) => Self::notify(sender, Message::SetDomain { domain }).await,
            Self::Mock(data) => {
                data.lock().await.set_domain(domain);
                Ok(())
            }
        }
    }

    pub async fn access_token(&self) -> anyhow::Result<Option<ArcStr>> {
        match self {
            Self::Actual(sender) => {
                Self::request(sender, |tx| Message::GetAccessToken { tx }).await
            }
            Self::Mock(data) => Ok(data.lock().await.access_token()),
        }
    }

    pub async fn set_access_token(&self, token: Option<ArcStr>) -> anyhow::Result<()> {
        match self {
            Self::Actual(sender) => Self::notify(sender, Message::SetAccessToken { token }).await,
            Self::Mock(data) => {
                data.lock().await.set_access_token(token);
                Ok(())
            }
        }
    }
}
