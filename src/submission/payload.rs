//! Flat answer mapping sent to the server and kept in local storage

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field id -> answer. A name seen once maps to a string; a repeated name
/// maps to an array of its values in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(Map<String, Value>);

impl Payload {
    /// Collect `(name, value)` entries, collapsing repeated names
    pub fn from_entries(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut map = Map::new();
        for (name, value) in entries {
            match map.get_mut(&name) {
                None => {
                    map.insert(name, Value::String(value));
                }
                Some(Value::Array(values)) => values.push(Value::String(value)),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, Value::String(value)]);
                }
            }
        }
        Self(map)
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
