use serde_json::Value;
use tokio::sync::oneshot::Sender;

use crate::{
    ArcStr,
    model::{Direction, EntityId, Kind},
};

/// Messages that can be sent to the stream cache actor.
#[derive(Debug)]
pub enum Message {
    Resolve {
        kind: Kind,
        props: Value,
        tx: Sender<anyhow::Result<EntityId>>,
    },
    Merge {
        id: EntityId,
        props: Value,
        tx: Sender<anyhow::Result<()>>,
    },
    Serialize {
        id: EntityId,
        tx: Sender<Option<Value>>,
    },
    Lookup {
        kind: Kind,
        key: ArcStr,
        tx: Sender<Option<EntityId>>,
    },
    Open {
        kind: Kind,
        url: ArcStr,
        tx: Sender<anyhow::Result<EntityId>>,
    },
    Close {
        url: ArcStr,
        tx: Sender<bool>,
    },
    OpenUrls {
        tx: Sender<Vec<ArcStr>>,
    },
    Items {
        url: ArcStr,
        tx: Sender<anyhow::Result<Vec<Value>>>,
    },
    Len {
        url: ArcStr,
        tx: Sender<anyhow::Result<usize>>,
    },
    /// Fetches one page in `direction`
    Fetch {
        url: ArcStr,
        direction: Direction,
        count: Option<usize>,
        tx: Sender<anyhow::Result<usize>>,
    },
    /// Fetches pages in `direction` until the stream is complete
    FetchAll {
        url: ArcStr,
        direction: Direction,
        count: Option<usize>,
        tx: Sender<anyhow::Result<usize>>,
    },
    FetchFull {
        url: ArcStr,
        tx: Sender<anyhow::Result<usize>>,
    },
    PushUpdate {
        url: ArcStr,
        activity: Value,
        tx: Sender<anyhow::Result<bool>>,
    },
    RefreshOpen {
        tx: Sender<usize>,
    },
    Clear {
        tx: Sender<()>,
    },
}
