use std::time::Duration;

use anyhow::Context;
use tokio::{sync::mpsc, task::JoinHandle};

use super::data::{Challenge, Command, PushEvent, Reconnect, ReconnectPolicy};
use super::message::Message;
use crate::{ArcStr, BUFFER_SIZE, cache::StreamCache, log::Log};

const SCOPE: &str = "realtime";

/// Dispatches push frames into the [`StreamCache`] and keeps the server
/// following the open streams.
///
/// Frames are handled in arrival order. Outgoing commands are written to
/// `commands`; the transport owning the socket drains that channel.
#[derive(Debug)]
pub struct Core {
    cache: StreamCache,
    log: Log,
    policy: ReconnectPolicy,
    commands: mpsc::Sender<Command>,
    /// Challenges go to whoever can sign them
    challenges: mpsc::Sender<Challenge>,
}

impl Core {
    pub fn new(
        cache: StreamCache,
        log: Log,
        retry_timeout: Duration,
        max_retry_attempts: usize,
        commands: mpsc::Sender<Command>,
        challenges: mpsc::Sender<Challenge>,
    ) -> Self {
        Self {
            cache,
            log,
            policy: ReconnectPolicy::new(retry_timeout, max_retry_attempts),
            commands,
            challenges,
        }
    }

    pub fn spawn(mut self) -> (super::Realtime, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel(BUFFER_SIZE);

        let handle = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                match message {
                    Message::Receive { frame, tx } => {
                        let _ = tx.send(self.receive(&frame).await);
                    }
                    Message::Opened { tx } => {
                        let _ = tx.send(self.opened().await);
                    }
                    Message::Closed { code, tx } => {
                        let _ = tx.send(self.closed(code));
                    }
                    Message::Follow { url, tx } => {
                        let _ = tx.send(self.send(Command::Follow { url }).await);
                    }
                    Message::Unfollow { url, tx } => {
                        let _ = tx.send(self.send(Command::Unfollow { url }).await);
                    }
                    Message::Rise { message, tx } => {
                        let _ = tx.send(self.send(Command::Rise { message }).await);
                    }
                }
            }
        });

        (super::Realtime::Actual(tx), handle)
    }

    async fn send(&self, command: Command) -> anyhow::Result<()> {
        self.commands
            .send(command)
            .await
            .context("Sending command to the push channel")
    }

    /// Applies one frame. Returns whether it changed an open stream.
    async fn receive(&self, frame: &str) -> anyhow::Result<bool> {
        let event = match serde_json::from_str::<PushEvent>(frame) {
            Ok(event) => event,
            Err(e) => {
                self.log.warn(SCOPE, format!("Skipping malformed frame: {e}"));
                return Ok(false);
            }
        };

        match event {
            PushEvent::Update { url, activity } => {
                self.cache.apply_push_update(url, activity).await
            }
            PushEvent::Challenge(challenge) => {
                self.log
                    .info(SCOPE, format!("Challenged on {}", challenge.url));
                self.challenges
                    .send(challenge)
                    .await
                    .context("Forwarding challenge")?;
                Ok(false)
            }
        }
    }

    /// Follows every open stream. After a reconnect the streams are also
    /// refreshed, since updates pushed while offline were lost.
    async fn opened(&mut self) -> anyhow::Result<usize> {
        let reopened = self.policy.opened();
        let urls = self.cache.open_urls().await?;

        for url in &urls {
            self.send(Command::Follow {
                url: ArcStr::clone(url),
            })
            .await?;
        }

        if reopened {
            let refreshed = self.cache.refresh_open().await?;
            self.log.info(
                SCOPE,
                format!("Reconnected, refreshed {refreshed} of {} streams", urls.len()),
            );
        }

        Ok(urls.len())
    }

    fn closed(&mut self, code: u16) -> Reconnect {
        let reconnect = self.policy.closed(code);

        match reconnect {
            Reconnect::GiveUp { offline: true } => self
                .log
                .error(SCOPE, "You seem to be offline, realtime is disabled"),
            Reconnect::GiveUp { offline: false } => self
                .log
                .error(SCOPE, "The server's realtime channel is unsupported here"),
            Reconnect::Immediately | Reconnect::After(_) => self.log.info(
                SCOPE,
                format!(
                    "Connection closed with code {code}, attempt {}",
                    self.policy.retry_attempts()
                ),
            ),
            Reconnect::Stop => {}
        }

        reconnect
    }
}
