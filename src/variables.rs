//! Operation variables tree.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Number, Value};

use crate::Upload;

/// Top-level `variables` object of an operation.
pub type Variables = BTreeMap<String, Variable>;

/// A node of the variables tree.
///
/// Mirrors JSON values, plus [`Variable::Upload`] for file sections bound into the tree.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub enum Variable {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    List(Vec<Variable>),
    Object(Variables),
    Upload(Upload),
}

impl Variable {
    pub fn is_null(&self) -> bool {
        matches!(self, Variable::Null)
    }

    pub fn as_upload(&self) -> Option<&Upload> {
        match self {
            Variable::Upload(upload) => Some(upload),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Variable::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Variable]> {
        match self {
            Variable::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Variables> {
        match self {
            Variable::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up a field of an object node.
    pub fn get(&self, key: &str) -> Option<&Variable> {
        self.as_object()?.get(key)
    }

    /// Looks up an element of a list node.
    pub fn index(&self, index: usize) -> Option<&Variable> {
        self.as_list()?.get(index)
    }
}

impl From<Value> for Variable {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Variable::Null,
            Value::Bool(b) => Variable::Bool(b),
            Value::Number(n) => Variable::Number(n),
            Value::String(s) => Variable::String(s),
            Value::Array(items) => Variable::List(items.into_iter().map(Variable::from).collect()),
            Value::Object(map) => Variable::Object(
                map.into_iter()
                    .map(|(key, value)| (key, Variable::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<Upload> for Variable {
    fn from(upload: Upload) -> Self {
        Variable::Upload(upload)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn from_json() {
        let vars: Variables = serde_json::from_value(json!({
            "file": null,
            "list": [1, "two", true],
            "nested": { "x": 1.5 },
        }))
        .unwrap();

        assert!(vars["file"].is_null());
        assert_eq!(vars["list"].index(1).and_then(Variable::as_str), Some("two"));
        assert_eq!(vars["list"].index(2), Some(&Variable::Bool(true)));
        assert!(matches!(vars["nested"].get("x"), Some(Variable::Number(_))));
        assert!(vars["nested"].get("y").is_none());
    }
}
