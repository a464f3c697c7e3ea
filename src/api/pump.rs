use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::{Mutex, mpsc::Sender};

use crate::{ArcStr, Error, config::Config, net::Net};

mod core;
pub mod data;
pub mod message;
pub mod parse;

pub use data::{Link, Links, Page};
use message::Message;

/// The pump.io API actor.
///
/// Sits between the stream cache and the networking actor: resolves
/// collection URLs against the server, authenticates and parses pages.
///
/// # Examples
/// ```ignore
/// let api = PumpApi::spawn(net, config).await?;
/// let page = api.get_page("/api/user/evan/feed".into()).await?;
/// ```
#[derive(Debug, Clone)]
pub enum PumpApi {
    Actual(Sender<Message>),
    /// A mock serving fixed pages by URL
    Mock(Arc<Mutex<MockData>>),
}

#[derive(Debug, Default)]
pub struct MockData {
    pub pages: HashMap<ArcStr, Page>,
    /// URLs answered with a network error carrying this status
    pub failures: HashMap<ArcStr, u16>,
    /// Every requested URL, in order
    pub requests: Vec<ArcStr>,
}

impl PumpApi {
    /// Spawns an API actor for the configured server and credentials.
    pub async fn spawn(net: Net, config: Config) -> anyhow::Result<Self> {
        let domain = config.domain().await?;
        let access_token = config.access_token().await?;
        Ok(Self::spawn_with_domain(net, domain, access_token))
    }

    pub fn spawn_with_domain(net: Net, domain: ArcStr, access_token: Option<ArcStr>) -> Self {
        let (api, _) = self::core::Core::new(net, domain, access_token).spawn();
        api
    }

    pub fn mock(data: MockData) -> Self {
        Self::Mock(Arc::new(Mutex::new(data)))
    }

    /// Fetches one page of the collection at `url`.
    pub async fn get_page(&self, url: ArcStr) -> anyhow::Result<Page> {
        match self {
            Self::Actual(sender) => {
                let (tx, rx) = tokio::sync::oneshot::channel();
                sender
                    .send(Message::GetPage { url, tx })
                    .await
                    .context("Sending message to PumpApi actor")?;
                rx.await.context("Awaiting response from PumpApi actor")?
            }
            Self::Mock(data) => {
                let mut data = data.lock().await;
                data.requests.push(url.clone());

                if let Some(status) = data.failures.get(&url) {
                    return Err(Error::Network {
                        url: url.clone(),
                        status: Some(*status),
                        message: "mock failure".into(),
                    }
                    .into());
                }

                data.pages.get(&url).cloned().ok_or_else(|| {
                    Error::Network {
                        url,
                        status: Some(404),
                        message: "page not found in mock".into(),
                    }
                    .into()
                })
            }
        }
    }

    /// URLs requested from the mock, in order. Empty for the real actor.
    pub async fn requests(&self) -> Vec<ArcStr> {
        match self {
            Self::Mock(data) => data.lock().await.requests.clone(),
            Self::Actual(_) => Vec::new(),
        }
    }
}
