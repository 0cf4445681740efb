//! Decoded response tree
//!
//! Decoders turn a raw body into a [`ResponseNode`] tree so that services can
//! pull single fields by path without knowing the wire format.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Generic decoded response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseNode {
    Text(String),
    List(Vec<ResponseNode>),
    Map(BTreeMap<String, ResponseNode>),
}

impl ResponseNode {
    pub fn empty() -> Self {
        Self::Map(BTreeMap::new())
    }

    /// Child by key (maps) or zero-based index (lists)
    pub fn get(&self, key: &str) -> Option<&ResponseNode> {
        match self {
            Self::Map(entries) => entries.get(key),
            Self::List(items) => key.parse::<usize>().ok().and_then(|index| items.get(index)),
            Self::Text(_) => None,
        }
    }

    /// Node at `path`, or `None` if any segment is missing
    pub fn at(&self, path: &[&str]) -> Option<&ResponseNode> {
        path.iter().try_fold(self, |node, segment| node.get(segment))
    }

    /// Text value at `path`
    pub fn extract(&self, path: &[&str]) -> Option<&str> {
        self.at(path).and_then(Self::as_text)
    }

    /// Nodes under `path`
    ///
    /// A list yields its items, any other node yields itself, a missing path
    /// yields nothing. Single-element lists are often collapsed by encoders,
    /// so callers iterate the same way either way.
    pub fn children(&self, path: &[&str]) -> &[ResponseNode] {
        match self.at(path) {
            Some(Self::List(items)) => items,
            Some(node) => std::slice::from_ref(node),
            None => &[],
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    /// Text-valued entries of a map node; other nodes yield an empty map
    pub fn text_entries(&self) -> BTreeMap<String, String> {
        match self {
            Self::Map(entries) => entries
                .iter()
                .filter_map(|(key, value)| value.as_text().map(|text| (key.clone(), text.to_string())))
                .collect(),
            _ => BTreeMap::new(),
        }
    }
}

impl From<&str> for ResponseNode {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ResponseNode {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<K: Into<String>> FromIterator<(K, ResponseNode)> for ResponseNode {
    fn from_iter<I: IntoIterator<Item = (K, ResponseNode)>>(iter: I) -> Self {
        Self::Map(iter.into_iter().map(|(key, value)| (key.into(), value)).collect())
    }
}
