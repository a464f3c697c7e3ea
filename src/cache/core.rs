use anyhow::Context;
use tokio::{sync::Mutex, task::JoinHandle};

use super::data::CacheData;
use super::message::Message;
use crate::{
    ArcStr, BUFFER_SIZE, Error,
    api::pump::PumpApi,
    log::Log,
    model::{Direction, EntityId, MAX_PAGE_SIZE},
    utils::append_query,
};

const SCOPE: &str = "cache";

/// Owns the object graph and pages streams in through [`PumpApi`].
///
/// Messages are handled one at a time, so a push update that arrives while a
/// fetch is in flight is applied once the fetch returns. The data sits
/// behind a mutex only so the two halves of [`Core::fetch_full`] can share
/// it; the lock is never held across a request.
#[derive(Debug)]
pub struct Core {
    api: PumpApi,
    log: Log,
    /// Page size used when a single-page fetch names no count
    page_size: usize,
    data: Mutex<CacheData>,
}

impl Core {
    pub fn new(api: PumpApi, log: Log, page_size: usize) -> Self {
        Self {
            api,
            log,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
            data: Mutex::new(CacheData::new()),
        }
    }

    pub fn spawn(self) -> (super::StreamCache, JoinHandle<()>) {
        let (tx, mut rx) = tokio::sync::mpsc::channel(BUFFER_SIZE);

        let handle = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                self.handle(message).await;
            }
        });

        (super::StreamCache::Actual(tx), handle)
    }

    async fn handle(&self, message: Message) {
        match message {
            Message::Resolve { kind, props, tx } => {
                let result = self.data.lock().await.resolve(kind, &props);
                let _ = tx.send(result.map_err(Into::into));
            }
            Message::Merge { id, props, tx } => {
                let result = self.data.lock().await.merge(id, &props);
                let _ = tx.send(result.map_err(Into::into));
            }
            Message::Serialize { id, tx } => {
                let _ = tx.send(self.data.lock().await.serialize(id));
            }
            Message::Lookup { kind, key, tx } => {
                let _ = tx.send(self.data.lock().await.lookup(kind, &key));
            }
            Message::Open { kind, url, tx } => {
                let result = self.data.lock().await.open(kind, &url);
                if result.is_ok() {
                    self.log.info(SCOPE, format!("Opened {kind} {url}"));
                }
                let _ = tx.send(result.map_err(Into::into));
            }
            Message::Close { url, tx } => {
                let _ = tx.send(self.data.lock().await.close(&url));
            }
            Message::OpenUrls { tx } => {
                let _ = tx.send(self.data.lock().await.open_urls());
            }
            Message::Items { url, tx } => {
                let result = self.data.lock().await.items(&url);
                let _ = tx.send(result.map_err(Into::into));
            }
            Message::Len { url, tx } => {
                let result = self.data.lock().await.len(&url);
                let _ = tx.send(result.map_err(Into::into));
            }
            Message::Fetch {
                url,
                direction,
                count,
                tx,
            } => {
                let count = count.unwrap_or(self.page_size);
                let _ = tx.send(self.fetch(&url, direction, count).await);
            }
            Message::FetchAll {
                url,
                direction,
                count,
                tx,
            } => {
                let _ = tx.send(self.fetch_all(&url, direction, count).await);
            }
            Message::FetchFull { url, tx } => {
                let _ = tx.send(self.fetch_full(&url).await);
            }
            Message::PushUpdate { url, activity, tx } => {
                let result = self.data.lock().await.apply_push_update(&url, &activity);
                if let Ok(false) = result {
                    self.log
                        .warn(SCOPE, format!("Dropped update for unopened stream {url}"));
                }
                let _ = tx.send(result.map_err(Into::into));
            }
            Message::RefreshOpen { tx } => {
                let _ = tx.send(self.refresh_open().await);
            }
            Message::Clear { tx } => {
                self.data.lock().await.clear();
                self.log.info(SCOPE, "Cleared cache");
                let _ = tx.send(());
            }
        }
    }

    /// Fetches one page and merges it. Returns how many items were new.
    async fn fetch(&self, url: &str, direction: Direction, count: usize) -> anyhow::Result<usize> {
        let (stream, cursor) = self
            .data
            .lock()
            .await
            .cursor(url, direction, count.clamp(1, MAX_PAGE_SIZE))?;

        self.fetch_cursor(stream, direction, cursor).await
    }

    async fn fetch_cursor(
        &self,
        stream: EntityId,
        direction: Direction,
        cursor: ArcStr,
    ) -> anyhow::Result<usize> {
        let page = self.api.get_page(cursor.clone()).await?;
        let added = self.data.lock().await.apply_page(stream, direction, &page)?;
        self.log.info(
            SCOPE,
            format!("Fetched {} items ({added} new) from {cursor}", page.items.len()),
        );
        Ok(added)
    }

    /// Fetches pages in `direction` until the stream holds every item the
    /// server reported or a page brings nothing new.
    async fn fetch_all(
        &self,
        url: &str,
        direction: Direction,
        count: Option<usize>,
    ) -> anyhow::Result<usize> {
        let mut total_added = 0;
        let mut first = true;

        loop {
            let next = {
                let data = self.data.lock().await;
                let stream = data.stream(url)?;
                let count = count
                    .unwrap_or_else(|| data.max_count(stream))
                    .clamp(1, MAX_PAGE_SIZE);
                data.cursor(url, direction, count)
            };

            let (stream, cursor) = match next {
                Ok(next) => next,
                Err(Error::NoCursor(_)) if !first => break,
                Err(e) => return Err(e.into()),
            };
            first = false;

            let added = self
                .fetch_cursor(stream, direction, cursor)
                .await
                .with_context(|| format!("Fetching all {direction:?} items of {url}"))?;
            total_added += added;

            let (len, total) = self.data.lock().await.progress(stream);
            if added == 0 || total.is_some_and(|total| len as u64 >= total) {
                break;
            }
        }

        Ok(total_added)
    }

    /// Fills the stream in both directions at once, or with a single large
    /// request when it has no cursor to page from.
    async fn fetch_full(&self, url: &str) -> anyhow::Result<usize> {
        let (stream, both, url_count) = {
            let data = self.data.lock().await;
            let stream = data.stream(url)?;
            let both = data.has_cursor(stream, Direction::Newer)
                && data.has_cursor(stream, Direction::Older);
            let base = data.stream_url(stream).unwrap_or_else(|| url.to_string());
            let url_count = append_query(&base, "count", &data.max_count(stream).to_string());
            (stream, both, url_count)
        };

        if both {
            let (newer, older) = tokio::try_join!(
                self.fetch_all(url, Direction::Newer, None),
                self.fetch_all(url, Direction::Older, None),
            )?;
            return Ok(newer + older);
        }

        let page = self.api.get_page(arc_str!(url_count.as_str())).await?;
        let added = self.data.lock().await.apply_full(stream, &page)?;
        self.log
            .info(SCOPE, format!("Fetched {added} new items from {url_count}"));
        Ok(added)
    }

    /// Pulls the newest page of every open stream. Returns how many streams
    /// were refreshed without error.
    async fn refresh_open(&self) -> usize {
        let urls = self.data.lock().await.open_urls();
        let mut refreshed = 0;

        for url in urls {
            match self.fetch(&url, Direction::Newer, self.page_size).await {
                Ok(_) => refreshed += 1,
                Err(e) => self
                    .log
                    .warn(SCOPE, format!("Failed to refresh {url}: {e:#}")),
            }
        }

        refreshed
    }
}
