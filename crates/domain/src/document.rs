//! Raw documents as read from the hierarchical store.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A stored document.
///
/// `path` is the full segment chain from the root, alternating collection and
/// document ids and ending with this document's own id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub path: Vec<String>,
    pub id: String,
    #[serde(default)]
    pub data: Option<Map<String, Value>>,
}

impl StoredDocument {
    /// Build a document whose id is the last path segment.
    pub fn new(path: Vec<String>, data: Option<Map<String, Value>>) -> Self {
        let id = path.last().cloned().unwrap_or_default();
        Self { path, id, data }
    }

    /// The segment `levels_up` positions above this document, if the path is deep enough.
    pub fn ancestor(&self, levels_up: usize) -> Option<&str> {
        let index = self.path.len().checked_sub(1 + levels_up)?;
        self.path.get(index).map(String::as_str)
    }

    pub fn has_payload(&self) -> bool {
        self.data.is_some()
    }
}
