use std::sync::Arc;

/// Immutable, cheaply clonable string shared between actors.
pub type ArcStr = Arc<str>;

/// Appends a `key=value` pair to the query string of `url`.
///
/// Absolute URLs go through [`reqwest::Url`] so the value is percent encoded.
/// Anything that does not parse is extended textually.
pub fn append_query(url: &str, key: &str, value: &str) -> String {
    match reqwest::Url::parse(url) {
        Ok(mut parsed) => {
            parsed.query_pairs_mut().append_pair(key, value);
            parsed.to_string()
        }
        Err(_) => {
            let separator = if url.contains('?') { '&' } else { '?' };
            format!("{url}{separator}{key}={value}")
        }
    }
}

/// Resolves `url` against `domain` when it is relative.
pub fn absolute_url(domain: &str, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        return url.to_string();
    }

    match reqwest::Url::parse(domain).and_then(|base| base.join(url)) {
        Ok(joined) => joined.to_string(),
        Err(_) => format!(
            "{}/{}",
            domain.trim_end_matches('/'),
            url.trim_start_matches('/')
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_query_to_plain_url() {
        assert_eq!(
            append_query("http://example.com/api/feed", "count", "50"),
            "http://example.com/api/feed?count=50"
        );
    }

    #[test]
    fn test_append_query_to_url_with_query() {
        assert_eq!(
            append_query("http://example.com/api/feed?before=a", "count", "50"),
            "http://example.com/api/feed?before=a&count=50"
        );
    }

    #[test]
    fn test_append_query_to_relative_url() {
        assert_eq!(append_query("/api/feed", "type", "person"), "/api/feed?type=person");
    }

    #[test]
    fn test_absolute_url() {
        assert_eq!(
            absolute_url("http://example.com", "/api/user/evan/feed"),
            "http://example.com/api/user/evan/feed"
        );
        assert_eq!(
            absolute_url("http://example.com", "https://other.net/x"),
            "https://other.net/x"
        );
    }
}
