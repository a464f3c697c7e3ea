use serde_json::{Value, json};

use crate::{
    ArcStr, Error,
    api::pump::Page,
    model::{DEFAULT_PAGE_SIZE, Direction, EntityId, Kind, Store, fold},
};

/// State of the stream cache: the object graph plus the streams currently
/// on display.
///
/// Both the actor and the mock operate on this type, so every rule about
/// merging pages and push updates lives here.
#[derive(Debug, Default)]
pub struct CacheData {
    store: Store,
    /// Streams open in the client, in the order they were opened
    open: Vec<EntityId>,
}

impl CacheData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn resolve(&mut self, kind: Kind, props: &Value) -> Result<EntityId, Error> {
        self.store.resolve(kind, props)
    }

    pub fn merge(&mut self, id: EntityId, props: &Value) -> Result<(), Error> {
        self.store.merge(id, props)
    }

    pub fn serialize(&self, id: EntityId) -> Option<Value> {
        self.store.serialize(id)
    }

    pub fn lookup(&self, kind: Kind, key: &str) -> Option<EntityId> {
        self.store.lookup(kind, key)
    }

    /// Resolves the stream at `url` and marks it open.
    pub fn open(&mut self, kind: Kind, url: &str) -> Result<EntityId, Error> {
        if !kind.is_stream() {
            return Err(Error::UnsupportedData(format!("{kind} is not a stream")));
        }

        let id = self.store.resolve(kind, &json!({ "url": url }))?;
        if !self.open.contains(&id) {
            self.open.push(id);
        }
        Ok(id)
    }

    /// Unmarks the stream. The stream and its items stay cached.
    pub fn close(&mut self, url: &str) -> bool {
        let store = &self.store;
        let before = self.open.len();
        self.open.retain(|id| !matches_url(store, *id, url));
        self.open.len() != before
    }

    /// URLs the open streams are fetched and followed by, proxy URLs
    /// included.
    pub fn open_urls(&self) -> Vec<ArcStr> {
        self.open
            .iter()
            .filter_map(|id| self.store.stream_url(*id).map(ArcStr::from))
            .collect()
    }

    fn find_open(&self, url: &str) -> Option<EntityId> {
        self.open
            .iter()
            .copied()
            .find(|id| matches_url(&self.store, *id, url))
    }

    /// The cached stream with this URL or proxy URL.
    pub fn stream(&self, url: &str) -> Result<EntityId, Error> {
        self.store
            .lookup(Kind::ActivityStream, url)
            .or_else(|| self.find_open(url))
            .ok_or_else(|| Error::UnknownStream(ArcStr::from(url)))
    }

    pub fn items(&self, url: &str) -> Result<Vec<Value>, Error> {
        let stream = self.stream(url)?;
        let entity = self.store.get(stream).ok_or(Error::StaleHandle)?;
        Ok(entity
            .items()
            .iter()
            .filter_map(|item| self.store.serialize(*item))
            .collect())
    }

    pub fn len(&self, url: &str) -> Result<usize, Error> {
        let stream = self.stream(url)?;
        Ok(self
            .store
            .get(stream)
            .map(|entity| entity.items().len())
            .unwrap_or_default())
    }

    /// Number of local items and the server-reported total.
    pub fn progress(&self, stream: EntityId) -> (usize, Option<u64>) {
        let len = self
            .store
            .get(stream)
            .map(|entity| entity.items().len())
            .unwrap_or_default();
        (len, self.store.total_items(stream))
    }

    /// Cursor URL for the next page in `direction`.
    pub fn cursor(
        &self,
        url: &str,
        direction: Direction,
        count: usize,
    ) -> Result<(EntityId, ArcStr), Error> {
        let stream = self.stream(url)?;
        let cursor = self
            .store
            .cursor(stream, direction, count)
            .ok_or_else(|| Error::NoCursor(ArcStr::from(url)))?;
        Ok((stream, ArcStr::from(cursor)))
    }

    pub fn has_cursor(&self, stream: EntityId, direction: Direction) -> bool {
        self.store
            .cursor(stream, direction, DEFAULT_PAGE_SIZE)
            .is_some()
    }

    pub fn max_count(&self, stream: EntityId) -> usize {
        self.store.max_count(stream)
    }

    /// URL of the stream itself, honouring the proxy.
    pub fn stream_url(&self, stream: EntityId) -> Option<String> {
        self.store.stream_url(stream)
    }

    /// Merges a page fetched in `direction`. Newer pages go to the front and
    /// refresh the `prev` link; older pages go to the back and replace the
    /// `next` link, dropping it when the server sent none.
    ///
    /// Returns how many items were new to the stream.
    pub fn apply_page(
        &mut self,
        stream: EntityId,
        direction: Direction,
        page: &Page,
    ) -> Result<usize, Error> {
        let items = self.resolve_items(stream, page)?;
        let added = self
            .store
            .insert_items(stream, &items, direction == Direction::Newer);

        match direction {
            Direction::Newer => {
                if let Some(prev) = page.prev() {
                    self.store.set_link(stream, "prev", Some(prev))?;
                }
            }
            Direction::Older => {
                self.store.set_link(stream, "next", page.next())?;
            }
        }

        if let Some(total) = page.total_items {
            self.store.set_total_items(stream, total)?;
        }

        Ok(added)
    }

    /// Merges the answer to a whole-stream request: items are appended and
    /// both links are adopted when present.
    pub fn apply_full(&mut self, stream: EntityId, page: &Page) -> Result<usize, Error> {
        let items = self.resolve_items(stream, page)?;
        let added = self.store.insert_items(stream, &items, false);

        if let Some(next) = page.next() {
            self.store.set_link(stream, "next", Some(next))?;
        }
        if let Some(prev) = page.prev() {
            self.store.set_link(stream, "prev", Some(prev))?;
        }
        if let Some(total) = page.total_items {
            self.store.set_total_items(stream, total)?;
        }

        Ok(added)
    }

    /// Resolves the items of a page. The page is rejected as a whole before
    /// anything is registered if one of its items is not an object.
    fn resolve_items(&mut self, stream: EntityId, page: &Page) -> Result<Vec<EntityId>, Error> {
        let kind = self.store.get(stream).ok_or(Error::StaleHandle)?.kind();
        let item_kind = kind.item_kind().unwrap_or(Kind::ActivityObject);
        if let Some(position) = page.items.iter().position(|item| !item.is_object()) {
            return Err(Error::UnsupportedData(format!(
                "page item {position} is not an object"
            )));
        }

        page.items
            .iter()
            .map(|item| self.store.resolve(item_kind, item))
            .collect()
    }

    /// Adds a pushed activity to the open stream at `url` and folds its
    /// effects into the posts it targets. Returns `false` when no open
    /// stream has that URL.
    pub fn apply_push_update(&mut self, url: &str, activity: &Value) -> Result<bool, Error> {
        let Some(stream) = self.find_open(url) else {
            return Ok(false);
        };

        let activity = self.store.resolve(Kind::Activity, activity)?;
        self.store.insert_items(stream, &[activity], true);
        fold(&mut self.store, &self.open, activity);
        Ok(true)
    }

    /// Drops every entity and closes every stream.
    pub fn clear(&mut self) {
        self.store.clear();
        self.open.clear();
    }
}

fn matches_url(store: &Store, id: EntityId, url: &str) -> bool {
    store.get(id).and_then(|entity| entity.key()) == Some(url)
        || store.stream_url(id).as_deref() == Some(url)
}
