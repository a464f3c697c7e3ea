use serde::Deserialize;
use serde_json::Value;

/// One page of a collection endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Page {
    /// Raw members of the page, newest first
    #[serde(default)]
    pub items: Vec<Value>,
    /// Size of the whole collection, when the server reports it
    #[serde(rename = "totalItems", default)]
    pub total_items: Option<u64>,
    #[serde(default)]
    pub links: Links,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Links {
    #[serde(default)]
    pub next: Option<Link>,
    #[serde(default)]
    pub prev: Option<Link>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Link {
    #[serde(default)]
    pub href: Option<String>,
}

impl Page {
    /// Link to older items.
    pub fn next(&self) -> Option<&str> {
        self.links.next.as_ref()?.href.as_deref()
    }

    /// Link to newer items.
    pub fn prev(&self) -> Option<&str> {
        self.links.prev.as_ref()?.href.as_deref()
    }
}
