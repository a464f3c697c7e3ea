use std::collections::HashMap;

use anyhow::Context;
use tokio::task::JoinHandle;

use super::data::Page;
use super::message::Message;
use super::parse::parse_page;
use crate::{ArcStr, BUFFER_SIZE, net::Net, utils::absolute_url};

/// Fetches collection pages from a pump.io server through [`Net`].
#[derive(Debug)]
pub struct Core {
    net: Net,
    /// Base URL relative collection URLs are resolved against
    domain: ArcStr,
    /// OAuth bearer token, if the user is signed in
    access_token: Option<ArcStr>,
}

impl Core {
    pub fn new(net: Net, domain: ArcStr, access_token: Option<ArcStr>) -> Self {
        Self {
            net,
            domain,
            access_token,
        }
    }

    pub fn spawn(self) -> (super::PumpApi, JoinHandle<()>) {
        let (tx, mut rx) = tokio::sync::mpsc::channel(BUFFER_SIZE);

        let handle = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                match message {
                    Message::GetPage { url, tx } => {
                        let url = ArcStr::from(absolute_url(&self.domain, &url));
                        let net = self.net.clone();
                        let headers = self.headers();
                        tokio::spawn(async move {
                            let response = get_page(&net, url.clone(), headers)
                                .await
                                .with_context(|| format!("GET page failed for stream: {}", url));
                            let _ = tx.send(response);
                        });
                    }
                }
            }
        });

        (super::PumpApi::Actual(tx), handle)
    }

    fn headers(&self) -> HashMap<ArcStr, ArcStr> {
        let mut headers = HashMap::from([(
            ArcStr::from("Accept"),
            ArcStr::from("application/json"),
        )]);
        if let Some(token) = &self.access_token {
            headers.insert(
                ArcStr::from("Authorization"),
                ArcStr::from(format!("Bearer {token}")),
            );
        }
        headers
    }
}

async fn get_page(
    net: &Net,
    url: ArcStr,
    headers: HashMap<ArcStr, ArcStr>,
) -> anyhow::Result<Page> {
    let body = net.get(url, Some(headers)).await?;
    Ok(parse_page(&body)?)
}
