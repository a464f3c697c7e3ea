use std::path::PathBuf;

use anyhow::Context;

use super::{data::Data, message::Message};
use crate::BUFFER_SIZE;

/// The core configuration actor that owns the TOML file and its contents.
pub struct Core {
    /// The path to the configuration file
    path: PathBuf,
    /// The current configuration data
    data: Data,
}

impl Core {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: Data::default(),
        }
    }

    pub fn spawn(mut self) -> (super::Config, tokio::task::JoinHandle<()>) {
        let (tx, mut rx) = tokio::sync::mpsc::channel(BUFFER_SIZE);
        let handle = tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                match msg {
                    Message::Load { tx } => {
                        let res = self.load().await;
                        let _ = tx.send(res);
                    }
                    Message::Save { tx } => {
                        let res = self.save().await;
                        let _ = tx.send(res);
                    }
                    Message::GetPath { opt, tx } => {
                        let _ = tx.send(self.data.path(opt));
                    }
                    Message::GetLogLevel { tx } => {
                        let _ = tx.send(self.data.log_level());
                    }
                    Message::GetUSize { opt, tx } => {
                        let _ = tx.send(self.data.usize(opt));
                    }
                    Message::GetDomain { tx } => {
                        let _ = tx.send(self.data.domain());
                    }
                    Message::GetAccessToken { tx } => {
                        let _ = tx.send(self.data.access_token());
                    }
                    Message::SetPath { opt, path } => {
                        self.data.set_path(opt, path);
                    }
                    Message::SetLogLevel { level } => {
                        self.data.set_log_level(level);
                    }
                    Message::SetUSize { opt, size } => {
                        self.data.set_usize(opt, size);
                    }
                    Message::SetDomain { domain } => {
                        self.data.set_domain(domain);
                    }
                    Message::SetAccessToken { token } => {
                        self.data.set_access_token(token);
                    }
                }
            }
        });
        (super::Config::Actual(tx), handle)
    }

    /// Loads the configuration file, writing the defaults when it does not
    /// exist yet.
    async fn load(&mut self) -> anyhow::Result<()> {
        if !tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            self.data = Data::default();
            return self.save().await;
        }

        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read config file: {}", self.path.display()))?;
        self.data = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", self.path.display()))?;
        Ok(())
    }

    async fn save(&self) -> anyhow::Result<()> {
        let contents = toml::to_string(&self.data).context("Failed to serialize config")?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }
        tokio::fs::write(&self.path, contents)
            .await
            .with_context(|| format!("Failed to write config file: {}", self.path.display()))
    }
}
