use serde_json::Value;
use tokio::sync::oneshot::Sender;

use super::data::Reconnect;
use crate::ArcStr;

/// Messages that can be sent to the realtime actor.
#[derive(Debug)]
pub enum Message {
    /// A raw frame read from the push channel
    Receive {
        frame: ArcStr,
        tx: Sender<anyhow::Result<bool>>,
    },
    Opened {
        tx: Sender<anyhow::Result<usize>>,
    },
    Closed {
        code: u16,
        tx: Sender<Reconnect>,
    },
    Follow {
        url: ArcStr,
        tx: Sender<anyhow::Result<()>>,
    },
    Unfollow {
        url: ArcStr,
        tx: Sender<anyhow::Result<()>>,
    },
    Rise {
        message: Value,
        tx: Sender<anyhow::Result<()>>,
    },
}
