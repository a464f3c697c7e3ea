use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{ArcStr, Error};

/// Canned answer of the mock for one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockResponse {
    /// A successful response with this body
    Body(ArcStr),
    /// A failed response with this HTTP status
    Status(u16),
}

/// Mock implementation of the Net actor.
///
/// Answers from a fixed URL table and records every requested URL so tests
/// can assert on the exact sequence of requests. Unknown URLs answer 404.
#[derive(Debug, Clone, Default)]
pub struct Mock {
    responses: Arc<Mutex<HashMap<ArcStr, MockResponse>>>,
    requests: Arc<Mutex<Vec<ArcStr>>>,
}

impl Mock {
    pub fn new(responses: HashMap<ArcStr, MockResponse>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            requests: Arc::default(),
        }
    }

    pub async fn get(&self, url: ArcStr) -> anyhow::Result<ArcStr> {
        self.requests.lock().await.push(url.clone());

        match self.responses.lock().await.get(&url).cloned() {
            Some(MockResponse::Body(body)) => Ok(body),
            Some(MockResponse::Status(status)) => Err(Error::Network {
                url,
                status: Some(status),
                message: "mock failure".into(),
            }
            .into()),
            None => Err(Error::Network {
                url,
                status: Some(404),
                message: "not found in mock responses".into(),
            }
            .into()),
        }
    }

    pub async fn respond(&self, url: ArcStr, response: MockResponse) {
        self.responses.lock().await.insert(url, response);
    }

    pub async fn requests(&self) -> Vec<ArcStr> {
        self.requests.lock().await.clone()
    }
}
