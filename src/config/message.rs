use std::path::PathBuf;

use tokio::sync::oneshot;

use super::data::{PathOpt, USizeOpt};
use crate::{ArcStr, log::LogLevel};

/// Messages that can be sent to the configuration actor.
#[derive(Debug)]
pub enum Message {
    /// Load configuration from file
    Load {
        tx: oneshot::Sender<anyhow::Result<()>>,
    },
    /// Save configuration to file
    Save {
        tx: oneshot::Sender<anyhow::Result<()>>,
    },
    GetPath {
        opt: PathOpt,
        tx: oneshot::Sender<PathBuf>,
    },
    GetLogLevel {
        tx: oneshot::Sender<LogLevel>,
    },
    GetUSize {
        opt: USizeOpt,
        tx: oneshot::Sender<usize>,
    },
    GetDomain {
        tx: oneshot::Sender<ArcStr>,
    },
    GetAccessToken {
        tx: oneshot::Sender<Option<ArcStr>>,
    },
    SetPath {
        opt: PathOpt,
        path: PathBuf,
    },
    SetLogLevel {
        level: LogLevel,
    },
    SetUSize {
        opt: USizeOpt,
        size: usize,
    },
    SetDomain {
        domain: ArcStr,
    },
    SetAccessToken {
        token: Option<ArcStr>,
    },
}
