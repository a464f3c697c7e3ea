use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde_json::Value;
use tokio::sync::{Mutex, mpsc, oneshot};

use crate::{
    ArcStr,
    cache::StreamCache,
    config::{Config, USizeOpt},
    log::Log,
};

mod core;
pub mod data;
pub mod message;

pub use data::{Challenge, Command, PushEvent, Reconnect, ReconnectPolicy};
use message::Message;

/// The realtime actor, the cache's end of the push channel.
///
/// The transport reads frames off the socket and hands them to
/// [`Realtime::receive`], reports opens and closes, and writes out the
/// [`Command`]s it is given.
///
/// # Examples
/// ```ignore
/// let (commands_tx, mut commands) = tokio::sync::mpsc::channel(16);
/// let (challenges_tx, mut challenges) = tokio::sync::mpsc::channel(16);
/// let realtime = Realtime::spawn(cache, config, log, commands_tx, challenges_tx).await?;
/// realtime.opened().await?;
/// realtime.receive(frame).await?;
/// ```
#[derive(Debug, Clone)]
pub enum Realtime {
    Actual(mpsc::Sender<Message>),
    /// A mock recording every frame and command instead of dispatching them
    Mock(Arc<Mutex<MockData>>),
}

#[derive(Debug, Default)]
pub struct MockData {
    pub frames: Vec<ArcStr>,
    pub commands: Vec<Command>,
}

impl Realtime {
    pub async fn spawn(
        cache: StreamCache,
        config: Config,
        log: Log,
        commands: mpsc::Sender<Command>,
        challenges: mpsc::Sender<Challenge>,
    ) -> anyhow::Result<Self> {
        let retry_timeout = config.usize(USizeOpt::RetryTimeout).await?;
        let max_retry_attempts = config.usize(USizeOpt::MaxRetryAttempts).await?;

        let (realtime, _) = self::core::Core::new(
            cache,
            log,
            Duration::from_secs(retry_timeout as u64),
            max_retry_attempts,
            commands,
            challenges,
        )
        .spawn();
        Ok(realtime)
    }

    pub fn mock() -> Self {
        Self::Mock(Arc::new(Mutex::new(MockData::default())))
    }

    async fn request<T>(
        sender: &mpsc::Sender<Message>,
        message: impl FnOnce(oneshot::Sender<T>) -> Message,
    ) -> anyhow::Result<T> {
        let (tx, rx) = oneshot::channel();
        sender
            .send(message(tx))
            .await
            .context("Sending message to Realtime actor")?;
        rx.await.context("Awaiting response from Realtime actor")
    }

    /// Dispatches a frame read from the push channel. Returns whether it
    /// changed an open stream; malformed frames are logged and skipped.
    pub async fn receive(&self, frame: ArcStr) -> anyhow::Result<bool> {
        match self {
            Self::Actual(sender) => {
                Self::request(sender, |tx| Message::Receive { frame, tx }).await?
            }
            Self::Mock(data) => {
                data.lock().await.frames.push(frame);
                Ok(false)
            }
        }
    }

    /// The push channel is up: follow every open stream, refreshing them
    /// when this is a reconnect. Returns how many streams are followed.
    pub async fn opened(&self) -> anyhow::Result<usize> {
        match self {
            Self::Actual(sender) => Self::request(sender, |tx| Message::Opened { tx }).await?,
            Self::Mock(_) => Ok(0),
        }
    }

    /// The push channel closed with `code`. Returns what to do next.
    pub async fn closed(&self, code: u16) -> anyhow::Result<Reconnect> {
        match self {
            Self::Actual(sender) => Self::request(sender, |tx| Message::Closed { code, tx }).await,
            Self::Mock(_) => Ok(Reconnect::Stop),
        }
    }

    pub async fn follow(&self, url: ArcStr) -> anyhow::Result<()> {
        match self {
            Self::Actual(sender) => Self::request(sender, |tx| Message::Follow { url, tx }).await?,
            Self::Mock(data) => {
                data.lock().await.commands.push(Command::Follow { url });
                Ok(())
            }
        }
    }

    pub async fn unfollow(&self, url: ArcStr) -> anyhow::Result<()> {
        match self {
            Self::Actual(sender) => {
                Self::request(sender, |tx| Message::Unfollow { url, tx }).await?
            }
            Self::Mock(data) => {
                data.lock().await.commands.push(Command::Unfollow { url });
                Ok(())
            }
        }
    }

    /// Sends a signed answer to a [`Challenge`].
    pub async fn rise(&self, message: Value) -> anyhow::Result<()> {
        match self {
            Self::Actual(sender) => Self::request(sender, |tx| Message::Rise { message, tx }).await?,
            Self::Mock(data) => {
                data.lock().await.commands.push(Command::Rise { message });
                Ok(())
            }
        }
    }
}
