use std::collections::HashMap;
use std::time::Duration;

use anyhow::Context;
use reqwest::Client;
use tokio::task::JoinHandle;

use crate::{
    ArcStr, BUFFER_SIZE, Error,
    log::Log,
    net::{Net, message::Message},
};

const SCOPE: &str = "net";

/// The core of the networking system.
///
/// Wraps a `reqwest` client. Transport failures and non-success statuses are
/// reported as [`Error::Network`] so callers can inspect the status.
#[derive(Debug)]
pub struct Core {
    log: Log,
    /// HTTP client for making requests
    client: Client,
}

impl Core {
    pub fn new(log: Log, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Building HTTP client")?;

        Ok(Self { log, client })
    }

    pub fn spawn(self) -> (Net, JoinHandle<()>) {
        let (tx, mut rx) = tokio::sync::mpsc::channel(BUFFER_SIZE);

        let handle = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                match message {
                    Message::Get { url, headers, tx } => {
                        // Requests run concurrently; only the client is shared.
                        let client = self.client.clone();
                        let log = self.log.clone();
                        tokio::spawn(async move {
                            let response = handle_get_request(&client, url.clone(), headers)
                                .await
                                .with_context(|| format!("GET request failed for URL: {}", url));
                            let response = log.warn_on_error(SCOPE, response);
                            let _ = tx.send(response);
                        });
                    }
                }
            }
        });

        (Net::Actual(tx), handle)
    }
}

async fn handle_get_request(
    client: &Client,
    url: ArcStr,
    headers: Option<HashMap<ArcStr, ArcStr>>,
) -> anyhow::Result<ArcStr> {
    let mut request = client.get(&*url);

    for (key, value) in headers.into_iter().flatten() {
        request = request.header(&*key, &*value);
    }

    let response = request.send().await.map_err(|err| Error::Network {
        url: url.clone(),
        status: err.status().map(|status| status.as_u16()),
        message: err.to_string(),
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::Network {
            url,
            status: Some(status.as_u16()),
            message: status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string(),
        }
        .into());
    }

    let text = response.text().await.context("Reading response body")?;
    Ok(ArcStr::from(text))
}
