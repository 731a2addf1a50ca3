//! Per-pipeline operation parameters.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Operation name to parameters. Opaque to the pipeline itself; engines
/// decide what each entry means.
///
/// Owned by exactly one pipeline. Cloning a pipeline deep-copies this map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Operations(BTreeMap<String, Value>);

impl Operations {
    /// Set an operation, returning the previous parameters.
    pub fn insert(&mut self, name: impl Into<String>, params: Value) -> Option<Value> {
        self.0.insert(name.into(), params)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_replaces() {
        let mut ops = Operations::default();
        assert_eq!(ops.insert("rotate", json!(90)), None);
        assert_eq!(ops.insert("rotate", json!(180)), Some(json!(90)));
        assert_eq!(ops.get("rotate"), Some(&json!(180)));
        assert_eq!(ops.len(), 1);
    }

    #[test]
    fn test_clone_is_deep() {
        let mut a = Operations::default();
        a.insert("resize", json!({ "width": 800 }));
        let mut b = a.clone();
        b.insert("resize", json!({ "width": 100 }));
        b.remove("missing");

        assert_eq!(a.get("resize"), Some(&json!({ "width": 800 })));
        assert_eq!(b.get("resize"), Some(&json!({ "width": 100 })));
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let mut ops = Operations::default();
        ops.insert("format", json!("webp"));
        ops.insert("blur", json!(1.5));
        assert_eq!(
            serde_json::to_string(&ops).unwrap(),
            r#"{"blur":1.5,"format":"webp"}"#
        );
    }
}
