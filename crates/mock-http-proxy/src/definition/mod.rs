//! Mock definition model and the directory-backed store.
//!
//! One JSON file holds one definition:
//!
//! ```json
//! {
//!   "url": "http://api.example.com/users",
//!   "method": "GET",
//!   "content_type": "application/json",
//!   "response": {
//!     "{{if eq .Query.id \"5\"}}true{{end}}": {"found": true},
//!     "default": {"found": false}
//!   }
//! }
//! ```

mod store;
mod value;

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub use store::{DefinitionError, DefinitionStore, Definitions};
pub use value::ResponseValue;

/// Response key used when no predicate evaluates to `true`.
pub const DEFAULT_KEY: &str = "default";

/// One unit of stubbing configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MockDefinition {
    /// Absolute URL (`scheme://host/path`) the definition answers for
    pub url: String,
    /// HTTP method, compared case-sensitively
    pub method: String,
    /// Explicit response content type; empty means infer from the value
    #[serde(default, alias = "contentType")]
    pub content_type: String,
    /// Predicate (or `default`) to response value, in declaration order
    #[serde(default)]
    pub response: ResponseTable,
}

impl MockDefinition {
    /// The explicit content type, verbatim, if one was declared.
    pub fn content_type(&self) -> Option<&str> {
        if self.content_type.is_empty() {
            None
        } else {
            Some(&self.content_type)
        }
    }
}

/// Ordered mapping from predicate template (or [`DEFAULT_KEY`]) to response value.
///
/// Keys keep the order they were declared in. A repeated key keeps its first
/// position and takes the last value, like a JSON object decoder would.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseTable {
    entries: Vec<(String, ResponseValue)>,
}

impl ResponseTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry, keeping the original position on replace.
    pub fn insert(&mut self, key: impl Into<String>, value: ResponseValue) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&ResponseValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value)
    }

    /// The value of the `default` key.
    pub fn default_response(&self) -> Option<&ResponseValue> {
        self.get(DEFAULT_KEY)
    }

    /// Predicate entries in declaration order, `default` excluded.
    pub fn predicates(&self) -> impl Iterator<Item = (&str, &ResponseValue)> {
        self.entries
            .iter()
            .filter(|(key, _)| key != DEFAULT_KEY)
            .map(|(key, value)| (key.as_str(), value))
    }

    /// All entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResponseValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }
}

impl<K: Into<String>> FromIterator<(K, ResponseValue)> for ResponseTable {
    fn from_iter<T: IntoIterator<Item = (K, ResponseValue)>>(iter: T) -> Self {
        let mut table = ResponseTable::new();
        for (key, value) in iter {
            table.insert(key, value);
        }
        table
    }
}

impl Serialize for ResponseTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ResponseTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TableVisitor;

        impl<'de> Visitor<'de> for TableVisitor {
            type Value = ResponseTable;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping predicates to responses")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut table = ResponseTable::new();
                while let Some((key, value)) = access.next_entry::<String, ResponseValue>()? {
                    table.insert(key, value);
                }
                Ok(table)
            }

            fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
                Ok(ResponseTable::new())
            }
        }

        deserializer.deserialize_any(TableVisitor)
    }
}
