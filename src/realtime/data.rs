use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ArcStr;

/// Close code of a connection the client shut down on purpose.
pub const NORMAL_CLOSE: u16 = 1000;
/// Close code reported when no transport could reach the server.
pub const ALL_TRANSPORTS_FAILED: u16 = 2000;

/// A frame pushed by the server.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "cmd", rename_all = "lowercase")]
pub enum PushEvent {
    /// A new activity for the stream at `url`
    Update { url: ArcStr, activity: Value },
    Challenge(Challenge),
}

/// The server wants the client to prove who it is before following `url`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Challenge {
    pub url: ArcStr,
    pub method: ArcStr,
}

/// A frame sent to the server.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "cmd", rename_all = "lowercase")]
pub enum Command {
    Follow { url: ArcStr },
    Unfollow { url: ArcStr },
    /// Answer to a [`PushEvent::Challenge`], signed by the caller
    Rise { message: Value },
}

/// What to do after the push connection closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconnect {
    /// Closed on purpose, or already given up
    Stop,
    Immediately,
    After(Duration),
    /// Retries are exhausted. Reported once; `offline` is set when the
    /// channel never opened.
    GiveUp { offline: bool },
}

/// Decides when the push channel reconnects.
///
/// The first retry after a healthy connection is immediate, later ones wait
/// `retry_timeout`. Once every transport has failed more than
/// `max_retry_attempts` times the channel gives up for good.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    retry_timeout: Duration,
    max_retry_attempts: usize,
    reconnecting: bool,
    retry_attempts: usize,
    connected: bool,
    gave_up: bool,
}

impl ReconnectPolicy {
    pub fn new(retry_timeout: Duration, max_retry_attempts: usize) -> Self {
        Self {
            retry_timeout,
            max_retry_attempts,
            reconnecting: false,
            retry_attempts: 0,
            connected: false,
            gave_up: false,
        }
    }

    /// Returns `true` when this open follows a dropped connection.
    pub fn opened(&mut self) -> bool {
        let reopened = self.connected;
        self.connected = true;
        self.reconnecting = false;
        self.retry_attempts = 0;
        self.gave_up = false;
        reopened
    }

    pub fn closed(&mut self, code: u16) -> Reconnect {
        if code == NORMAL_CLOSE {
            return Reconnect::Stop;
        }

        self.retry_attempts += 1;

        if code == ALL_TRANSPORTS_FAILED && self.retry_attempts > self.max_retry_attempts {
            if self.gave_up {
                return Reconnect::Stop;
            }
            self.gave_up = true;
            return Reconnect::GiveUp {
                offline: !self.connected,
            };
        }

        if self.reconnecting {
            Reconnect::After(self.retry_timeout)
        } else {
            self.reconnecting = true;
            Reconnect::Immediately
        }
    }

    pub fn retry_attempts(&self) -> usize {
        self.retry_attempts
    }
}
