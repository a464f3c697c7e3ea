use serde_json::{Map, Value, json};

use super::kind::Kind;
use super::store::{EntityId, Store};
use crate::Error;
use crate::utils::append_query;

/// Page size assumed by the server when no `count` is given.
pub const DEFAULT_PAGE_SIZE: usize = 20;
/// Largest page the server hands out.
pub const MAX_PAGE_SIZE: usize = 200;

/// Which end of a stream a page extends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Items published after the first local item
    Newer,
    /// Items published before the last local item
    Older,
}

impl Direction {
    /// Relation name of the server-provided link for this direction.
    pub fn rel(self) -> &'static str {
        match self {
            Direction::Newer => "prev",
            Direction::Older => "next",
        }
    }
}

impl Store {
    /// URL used to fetch the stream: the proxy URL when the stream lives on
    /// a remote server, otherwise its own `url`.
    pub fn stream_url(&self, id: EntityId) -> Option<String> {
        let entity = self.get(id)?;
        entity
            .attr("pump_io")
            .and_then(|pump_io| pump_io.get("proxyURL"))
            .and_then(Value::as_str)
            .or_else(|| entity.attr("url").and_then(Value::as_str))
            .map(str::to_string)
    }

    /// The `href` of link `rel`, if the server provided one.
    pub fn link(&self, id: EntityId, rel: &str) -> Option<String> {
        self.get(id)?
            .attr("links")?
            .get(rel)?
            .get("href")?
            .as_str()
            .map(str::to_string)
    }

    /// Sets or removes the link `rel`.
    pub fn set_link(&mut self, id: EntityId, rel: &str, href: Option<&str>) -> Result<(), Error> {
        let mut links = match self.live(id)?.attr("links") {
            Some(Value::Object(links)) => links.clone(),
            _ => Map::new(),
        };

        match href {
            Some(href) => {
                links.insert(rel.to_string(), json!({ "href": href }));
            }
            None => {
                links.remove(rel);
            }
        }

        self.set(id, "links", Value::Object(links))
    }

    pub fn total_items(&self, id: EntityId) -> Option<u64> {
        self.get(id)?.attr("totalItems")?.as_u64()
    }

    pub fn set_total_items(&mut self, id: EntityId, total: u64) -> Result<(), Error> {
        self.set(id, "totalItems", Value::from(total))
    }

    /// Largest useful page size for the stream.
    pub fn max_count(&self, id: EntityId) -> usize {
        match self.total_items(id) {
            Some(total) => (total as usize).clamp(1, MAX_PAGE_SIZE),
            None => MAX_PAGE_SIZE,
        }
    }

    /// URL of the next page in `direction`.
    ///
    /// Server links win. Otherwise the cursor is derived from the first
    /// (newer) or last (older) local item. `count` is only sent when it
    /// differs from the server default, and people streams always ask
    /// for persons.
    pub fn cursor(&self, id: EntityId, direction: Direction, count: usize) -> Option<String> {
        let entity = self.get(id)?;

        let mut url = match self.link(id, direction.rel()) {
            Some(href) => href,
            None => {
                let (item, param) = match direction {
                    Direction::Newer => (entity.items().first(), "since"),
                    Direction::Older => (entity.items().last(), "before"),
                };
                let item = self.get(*item?)?;
                let url = append_query(&self.stream_url(id)?, param, item.key()?);
                match item.attr("objectType").and_then(Value::as_str) {
                    Some(object_type) => append_query(&url, "type", object_type),
                    None => url,
                }
            }
        };

        if count != DEFAULT_PAGE_SIZE {
            url = append_query(&url, "count", &count.to_string());
        }

        if entity.kind() == Kind::PeopleStream && !url.contains("type=person") {
            url = append_query(&url, "type", "person");
        }

        Some(url)
    }
}

/// The per-user streams every local account exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum UserStream {
    Inbox,
    MajorInbox,
    MinorInbox,
    DirectInbox,
    MajorDirectInbox,
    MinorDirectInbox,
    Feed,
    MajorFeed,
    MinorFeed,
}

impl UserStream {
    pub const ALL: [UserStream; 9] = [
        UserStream::Inbox,
        UserStream::MajorInbox,
        UserStream::MinorInbox,
        UserStream::DirectInbox,
        UserStream::MajorDirectInbox,
        UserStream::MinorDirectInbox,
        UserStream::Feed,
        UserStream::MajorFeed,
        UserStream::MinorFeed,
    ];

    pub fn path(self) -> &'static str {
        match self {
            UserStream::Inbox => "inbox",
            UserStream::MajorInbox => "inbox/major",
            UserStream::MinorInbox => "inbox/minor",
            UserStream::DirectInbox => "inbox/direct",
            UserStream::MajorDirectInbox => "inbox/direct/major",
            UserStream::MinorDirectInbox => "inbox/direct/minor",
            UserStream::Feed => "feed",
            UserStream::MajorFeed => "feed/major",
            UserStream::MinorFeed => "feed/minor",
        }
    }

    /// Absolute URL of this stream for `nickname` on `domain`.
    pub fn url(self, domain: &str, nickname: &str) -> String {
        format!(
            "{}/api/user/{}/{}",
            domain.trim_end_matches('/'),
            nickname,
            self.path()
        )
    }
}
