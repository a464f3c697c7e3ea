use thiserror::Error;

use crate::ArcStr;

/// Failures surfaced by the stream cache and the services feeding it.
///
/// Actor plumbing wraps these in [`anyhow::Error`] with extra context;
/// callers recover the variant with `err.downcast_ref::<Error>()`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The HTTP request failed or the server answered with a non-success status
    #[error("request to {url} failed{}: {message}", status_suffix(.status))]
    Network {
        url: ArcStr,
        status: Option<u16>,
        message: String,
    },
    /// No pagination cursor can be derived for the stream in that direction
    #[error("no pagination cursor available for stream {0}")]
    NoCursor(ArcStr),
    /// A payload did not have the shape required to build an entity
    #[error("unsupported data: {0}")]
    UnsupportedData(String),
    /// The cache has never seen a stream with that URL
    #[error("unknown stream {0}")]
    UnknownStream(ArcStr),
    /// The entity handle was issued before the cache was cleared
    #[error("stale entity handle")]
    StaleHandle,
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" with status {s}")).unwrap_or_default()
}

impl Error {
    /// HTTP status carried by a network failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Network { status, .. } => *status,
            _ => None,
        }
    }

    /// Whether repeating the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Network { status, .. } if *status != Some(404))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_error_display() {
        let err = Error::Network {
            url: "http://example.com/feed".into(),
            status: Some(500),
            message: "Internal Server Error".into(),
        };
        assert_eq!(
            err.to_string(),
            "request to http://example.com/feed failed with status 500: Internal Server Error"
        );
        assert_eq!(err.status(), Some(500));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_not_found_is_not_retryable() {
        let err = Error::Network {
            url: "http://example.com/gone".into(),
            status: Some(404),
            message: "Not Found".into(),
        };
        assert!(!err.is_retryable());
        assert!(!Error::NoCursor("http://example.com/feed".into()).is_retryable());
    }

    #[test]
    fn test_status_is_none_for_other_errors() {
        assert_eq!(Error::UnsupportedData("x".into()).status(), None);
    }
}
