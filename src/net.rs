use std::collections::HashMap;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::mpsc::Sender;

use crate::{ArcStr, config::Config, config::USizeOpt, log::Log};
use message::Message;

mod core;
pub mod message;
mod mock;

pub use mock::MockResponse;

/// The networking actor.
///
/// # Examples
/// ```ignore
/// let net = Net::spawn(config, log).await?;
/// let body = net.get(url, None).await?;
/// ```
#[derive(Debug, Clone)]
pub enum Net {
    /// A real networking actor that performs HTTP requests
    Actual(Sender<Message>),
    /// A mock answering from a fixed URL table
    Mock(mock::Mock),
}

impl Net {
    /// Spawns a networking actor using the configured request timeout.
    pub async fn spawn(config: Config, log: Log) -> anyhow::Result<Self> {
        let timeout = config.usize(USizeOpt::Timeout).await?;
        let (net, _) = self::core::Core::new(log, Duration::from_secs(timeout as u64))?.spawn();
        Ok(net)
    }

    pub fn mock(responses: HashMap<ArcStr, MockResponse>) -> Self {
        Self::Mock(mock::Mock::new(responses))
    }

    /// Performs an HTTP GET request and returns the response body.
    ///
    /// Non-success statuses fail with [`crate::Error::Network`].
    pub async fn get(
        &self,
        url: ArcStr,
        headers: Option<HashMap<ArcStr, ArcStr>>,
    ) -> anyhow::Result<ArcStr> {
        match self {
            Net::Actual(sender) => {
                let (tx, rx) = tokio::sync::oneshot::channel();
                sender
                    .send(Message::Get { url, headers, tx })
                    .await
                    .context("Sending message to Net actor")?;
                rx.await.context("Awaiting response from Net actor")?
            }
            Net::Mock(mock) => mock.get(url).await,
        }
    }

    /// Sets the mock answer for `url`. Does nothing on the real actor.
    pub async fn respond(&self, url: impl Into<ArcStr>, response: MockResponse) {
        if let Net::Mock(mock) = self {
            mock.respond(url.into(), response).await;
        }
    }

    /// URLs requested from the mock, in order. Empty for the real actor.
    pub async fn requests(&self) -> Vec<ArcStr> {
        match self {
            Net::Mock(mock) => mock.requests().await,
            Net::Actual(_) => Vec::new(),
        }
    }
}
