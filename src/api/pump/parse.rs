use serde_json::Value;

use super::data::Page;
use crate::Error;

/// Parses a collection page.
///
/// A missing `items` member is an empty page. Anything that is not a JSON
/// object, or whose `items` is not an array, is rejected.
pub fn parse_page(body: &str) -> Result<Page, Error> {
    let value: Value = serde_json::from_str(body)
        .map_err(|err| Error::UnsupportedData(format!("page is not valid JSON: {err}")))?;

    let Value::Object(map) = &value else {
        return Err(Error::UnsupportedData("page is not a JSON object".into()));
    };
    if map.get("items").is_some_and(|items| !items.is_array()) {
        return Err(Error::UnsupportedData("page items is not an array".into()));
    }

    serde_json::from_value(value)
        .map_err(|err| Error::UnsupportedData(format!("malformed page: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_page() {
        let page = parse_page(
            r#"{
                "displayName": "Activities by Evan",
                "totalItems": 45,
                "items": [{ "id": "a1" }, { "id": "a2" }],
                "links": {
                    "next": { "href": "http://example.com/feed?before=a2" },
                    "prev": { "href": "http://example.com/feed?since=a1" }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total_items, Some(45));
        assert_eq!(page.next(), Some("http://example.com/feed?before=a2"));
        assert_eq!(page.prev(), Some("http://example.com/feed?since=a1"));
    }

    #[test]
    fn test_parse_page_without_items() {
        let page = parse_page(r#"{ "totalItems": 0 }"#).unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.next(), None);
    }

    #[test]
    fn test_parse_rejects_non_array_items() {
        let err = parse_page(r#"{ "items": { "id": "a1" } }"#).unwrap_err();
        assert!(matches!(err, Error::UnsupportedData(_)));
    }

    #[test]
    fn test_parse_rejects_non_object() {
        assert!(matches!(
            parse_page("[1, 2]").unwrap_err(),
            Error::UnsupportedData(_)
        ));
        assert!(matches!(
            parse_page("<html>").unwrap_err(),
            Error::UnsupportedData(_)
        ));
    }
}
