use std::sync::Arc;

use anyhow::Context;
use serde_json::Value;
use tokio::sync::{Mutex, mpsc::Sender, oneshot};

use crate::{
    ArcStr,
    api::pump::PumpApi,
    config::{Config, USizeOpt},
    log::Log,
    model::{Direction, EntityId, Kind},
};

mod core;
pub mod data;
pub mod message;

pub use data::CacheData;
use message::Message;

/// The stream cache actor.
///
/// Keeps one entity per remote object, however many streams reference it,
/// and pages collections in through [`PumpApi`]. Handles are cheap to clone.
///
/// # Examples
/// ```ignore
/// let cache = StreamCache::spawn(api, config, log).await?;
/// cache.open(Kind::ActivityStream, url.clone()).await?;
/// cache.fetch_full(url.clone()).await?;
/// let items = cache.items(url).await?;
/// ```
#[derive(Debug, Clone)]
pub enum StreamCache {
    Actual(Sender<Message>),
    /// A mock with no server behind it; fetches add nothing
    Mock(Arc<Mutex<CacheData>>),
}

impl StreamCache {
    pub async fn spawn(api: PumpApi, config: Config, log: Log) -> anyhow::Result<Self> {
        let page_size = config.usize(USizeOpt::PageSize).await?;
        Ok(Self::spawn_with_page_size(api, log, page_size))
    }

    pub fn spawn_with_page_size(api: PumpApi, log: Log, page_size: usize) -> Self {
        let (cache, _) = self::core::Core::new(api, log, page_size).spawn();
        cache
    }

    pub fn mock() -> Self {
        Self::Mock(Arc::new(Mutex::new(CacheData::new())))
    }

    async fn request<T>(
        sender: &Sender<Message>,
        message: impl FnOnce(oneshot::Sender<T>) -> Message,
    ) -> anyhow::Result<T> {
        let (tx, rx) = oneshot::channel();
        sender
            .send(message(tx))
            .await
            .context("Sending message to StreamCache actor")?;
        rx.await.context("Awaiting response from StreamCache actor")
    }

    /// Returns the entity for `props`, creating it on first sight and merging
    /// `props` into it otherwise.
    pub async fn resolve(&self, kind: Kind, props: Value) -> anyhow::Result<EntityId> {
        match self {
            Self::Actual(sender) => {
                Self::request(sender, |tx| Message::Resolve { kind, props, tx }).await?
            }
            Self::Mock(data) => Ok(data.lock().await.resolve(kind, &props)?),
        }
    }

    pub async fn merge(&self, id: EntityId, props: Value) -> anyhow::Result<()> {
        match self {
            Self::Actual(sender) => {
                Self::request(sender, |tx| Message::Merge { id, props, tx }).await?
            }
            Self::Mock(data) => Ok(data.lock().await.merge(id, &props)?),
        }
    }

    /// The entity as JSON. `None` if the handle outlived a [`clear`](Self::clear).
    pub async fn serialize(&self, id: EntityId) -> anyhow::Result<Option<Value>> {
        match self {
            Self::Actual(sender) => Self::request(sender, |tx| Message::Serialize { id, tx }).await,
            Self::Mock(data) => Ok(data.lock().await.serialize(id)),
        }
    }

    pub async fn lookup(&self, kind: Kind, key: ArcStr) -> anyhow::Result<Option<EntityId>> {
        match self {
            Self::Actual(sender) => {
                Self::request(sender, |tx| Message::Lookup { kind, key, tx }).await
            }
            Self::Mock(data) => Ok(data.lock().await.lookup(kind, &key)),
        }
    }

    /// Marks the stream at `url` as open so push updates reach it.
    pub async fn open(&self, kind: Kind, url: ArcStr) -> anyhow::Result<EntityId> {
        match self {
            Self::Actual(sender) => {
                Self::request(sender, |tx| Message::Open { kind, url, tx }).await?
            }
            Self::Mock(data) => Ok(data.lock().await.open(kind, &url)?),
        }
    }

    pub async fn close(&self, url: ArcStr) -> anyhow::Result<bool> {
        match self {
            Self::Actual(sender) => Self::request(sender, |tx| Message::Close { url, tx }).await,
            Self::Mock(data) => Ok(data.lock().await.close(&url)),
        }
    }

    pub async fn open_urls(&self) -> anyhow::Result<Vec<ArcStr>> {
        match self {
            Self::Actual(sender) => Self::request(sender, |tx| Message::OpenUrls { tx }).await,
            Self::Mock(data) => Ok(data.lock().await.open_urls()),
        }
    }

    /// The stream's items, newest first, serialized.
    pub async fn items(&self, url: ArcStr) -> anyhow::Result<Vec<Value>> {
        match self {
            Self::Actual(sender) => Self::request(sender, |tx| Message::Items { url, tx }).await?,
            Self::Mock(data) => Ok(data.lock().await.items(&url)?),
        }
    }

    pub async fn len(&self, url: ArcStr) -> anyhow::Result<usize> {
        match self {
            Self::Actual(sender) => Self::request(sender, |tx| Message::Len { url, tx }).await?,
            Self::Mock(data) => Ok(data.lock().await.len(&url)?),
        }
    }

    async fn fetch(
        &self,
        url: ArcStr,
        direction: Direction,
        count: Option<usize>,
        all: bool,
    ) -> anyhow::Result<usize> {
        match self {
            Self::Actual(sender) => {
                Self::request(sender, |tx| match all {
                    true => Message::FetchAll {
                        url,
                        direction,
                        count,
                        tx,
                    },
                    false => Message::Fetch {
                        url,
                        direction,
                        count,
                        tx,
                    },
                })
                .await?
            }
            Self::Mock(data) => {
                data.lock().await.stream(&url)?;
                Ok(0)
            }
        }
    }

    /// Fetches the page of items newer than the newest one held.
    pub async fn fetch_newer(&self, url: ArcStr, count: Option<usize>) -> anyhow::Result<usize> {
        self.fetch(url, Direction::Newer, count, false).await
    }

    /// Fetches the page of items older than the oldest one held.
    pub async fn fetch_older(&self, url: ArcStr, count: Option<usize>) -> anyhow::Result<usize> {
        self.fetch(url, Direction::Older, count, false).await
    }

    pub async fn fetch_all_newer(&self, url: ArcStr, count: Option<usize>) -> anyhow::Result<usize> {
        self.fetch(url, Direction::Newer, count, true).await
    }

    pub async fn fetch_all_older(&self, url: ArcStr, count: Option<usize>) -> anyhow::Result<usize> {
        self.fetch(url, Direction::Older, count, true).await
    }

    /// Loads the whole stream, paging both ways at once when possible.
    pub async fn fetch_full(&self, url: ArcStr) -> anyhow::Result<usize> {
        match self {
            Self::Actual(sender) => {
                Self::request(sender, |tx| Message::FetchFull { url, tx }).await?
            }
            Self::Mock(data) => {
                data.lock().await.stream(&url)?;
                Ok(0)
            }
        }
    }

    /// Applies an activity pushed by the server for the stream at `url`.
    /// Returns `false` if that stream is not open.
    pub async fn apply_push_update(&self, url: ArcStr, activity: Value) -> anyhow::Result<bool> {
        match self {
            Self::Actual(sender) => {
                Self::request(sender, |tx| Message::PushUpdate { url, activity, tx }).await?
            }
            Self::Mock(data) => Ok(data.lock().await.apply_push_update(&url, &activity)?),
        }
    }

    /// Fetches newer items for every open stream. Returns how many succeeded.
    pub async fn refresh_open(&self) -> anyhow::Result<usize> {
        match self {
            Self::Actual(sender) => Self::request(sender, |tx| Message::RefreshOpen { tx }).await,
            Self::Mock(data) => Ok(data.lock().await.open_urls().len()),
        }
    }

    /// Forgets every entity. Handles issued before become stale.
    pub async fn clear(&self) -> anyhow::Result<()> {
        match self {
            Self::Actual(sender) => Self::request(sender, |tx| Message::Clear { tx }).await,
            Self::Mock(data) => {
                data.lock().await.clear();
                Ok(())
            }
        }
    }
}
