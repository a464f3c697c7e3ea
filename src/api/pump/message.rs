use tokio::sync::oneshot::Sender;

use super::data::Page;
use crate::ArcStr;

/// Messages that can be sent to the pump.io API actor.
#[derive(Debug)]
pub enum Message {
    /// Fetches and parses one collection page
    GetPage {
        url: ArcStr,
        tx: Sender<anyhow::Result<Page>>,
    },
}
