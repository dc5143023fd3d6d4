use std::{fmt, sync::Arc};

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value};

pub type FormMap = IndexMap<String, FormValue>;

/// Nested form data with shared containers.
///
/// Arrays and objects sit behind `Arc`, so cloning a value is shallow and a
/// write through [`crate::path::set_in`] copies only the containers on the
/// written path. Untouched subtrees stay pointer-equal to the previous value.
#[derive(Debug, Clone, Default)]
pub enum FormValue {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Arc<Vec<FormValue>>),
    Object(Arc<FormMap>),
}

impl FormValue {
    pub fn object() -> Self {
        FormValue::Object(Arc::new(FormMap::new()))
    }

    pub fn array() -> Self {
        FormValue::Array(Arc::new(Vec::new()))
    }

    pub fn from_items(items: Vec<FormValue>) -> Self {
        FormValue::Array(Arc::new(items))
    }

    pub fn from_map(map: FormMap) -> Self {
        FormValue::Object(Arc::new(map))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FormValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FormValue::String(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FormValue::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FormValue::Number(number) => number.as_i64(),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[FormValue]> {
        match self {
            FormValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&FormMap> {
        match self {
            FormValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, FormValue::Array(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, FormValue::Object(_))
    }

    /// Truthiness as the list operations see it: null, `false`, zero, NaN and
    /// the empty string are falsy; every container is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            FormValue::Null => false,
            FormValue::Bool(flag) => *flag,
            FormValue::Number(number) => number
                .as_f64()
                .map(|n| n != 0.0 && !n.is_nan())
                .unwrap_or(true),
            FormValue::String(text) => !text.is_empty(),
            FormValue::Array(_) | FormValue::Object(_) => true,
        }
    }

    pub fn is_empty_container(&self) -> bool {
        match self {
            FormValue::Array(items) => items.is_empty(),
            FormValue::Object(map) => map.is_empty(),
            _ => false,
        }
    }

    /// Null, or a container whose every descendant is hollow.
    pub fn is_hollow(&self) -> bool {
        match self {
            FormValue::Null => true,
            FormValue::Array(items) => items.iter().all(FormValue::is_hollow),
            FormValue::Object(map) => map.values().all(FormValue::is_hollow),
            _ => false,
        }
    }

    /// Number of non-empty string leaves.
    pub fn count_messages(&self) -> usize {
        match self {
            FormValue::String(text) if !text.is_empty() => 1,
            FormValue::Array(items) => items.iter().map(FormValue::count_messages).sum(),
            FormValue::Object(map) => map.values().map(FormValue::count_messages).sum(),
            _ => 0,
        }
    }

    /// True when both values share the same container allocation.
    /// Scalars compare by value.
    pub fn ptr_eq(&self, other: &FormValue) -> bool {
        match (self, other) {
            (FormValue::Array(a), FormValue::Array(b)) => Arc::ptr_eq(a, b),
            (FormValue::Object(a), FormValue::Object(b)) => Arc::ptr_eq(a, b),
            (a, b) => a == b,
        }
    }

    pub fn to_json(&self) -> Value {
        Value::from(self)
    }
}

impl PartialEq for FormValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FormValue::Null, FormValue::Null) => true,
            (FormValue::Bool(a), FormValue::Bool(b)) => a == b,
            (FormValue::Number(a), FormValue::Number(b)) => a == b,
            (FormValue::String(a), FormValue::String(b)) => a == b,
            (FormValue::Array(a), FormValue::Array(b)) => Arc::ptr_eq(a, b) || a == b,
            (FormValue::Object(a), FormValue::Object(b)) => Arc::ptr_eq(a, b) || a == b,
            _ => false,
        }
    }
}

impl fmt::Display for FormValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl From<Value> for FormValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FormValue::Null,
            Value::Bool(flag) => FormValue::Bool(flag),
            Value::Number(number) => FormValue::Number(number),
            Value::String(text) => FormValue::String(text),
            Value::Array(items) => {
                FormValue::from_items(items.into_iter().map(FormValue::from).collect())
            }
            Value::Object(map) => FormValue::from_map(
                map.into_iter()
                    .map(|(key, value)| (key, FormValue::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<&FormValue> for Value {
    fn from(value: &FormValue) -> Self {
        match value {
            FormValue::Null => Value::Null,
            FormValue::Bool(flag) => Value::Bool(*flag),
            FormValue::Number(number) => Value::Number(number.clone()),
            FormValue::String(text) => Value::String(text.clone()),
            FormValue::Array(items) => Value::Array(items.iter().map(Value::from).collect()),
            FormValue::Object(map) => Value::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), Value::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<FormValue> for Value {
    fn from(value: FormValue) -> Self {
        Value::from(&value)
    }
}

impl From<&str> for FormValue {
    fn from(text: &str) -> Self {
        FormValue::String(text.to_string())
    }
}

impl From<String> for FormValue {
    fn from(text: String) -> Self {
        FormValue::String(text)
    }
}

impl From<bool> for FormValue {
    fn from(flag: bool) -> Self {
        FormValue::Bool(flag)
    }
}

impl From<i64> for FormValue {
    fn from(number: i64) -> Self {
        FormValue::Number(number.into())
    }
}

impl From<i32> for FormValue {
    fn from(number: i32) -> Self {
        FormValue::Number(number.into())
    }
}

impl From<u64> for FormValue {
    fn from(number: u64) -> Self {
        FormValue::Number(number.into())
    }
}

impl From<f64> for FormValue {
    fn from(number: f64) -> Self {
        Number::from_f64(number)
            .map(FormValue::Number)
            .unwrap_or(FormValue::Null)
    }
}

impl From<Vec<FormValue>> for FormValue {
    fn from(items: Vec<FormValue>) -> Self {
        FormValue::from_items(items)
    }
}

impl From<FormMap> for FormValue {
    fn from(map: FormMap) -> Self {
        FormValue::from_map(map)
    }
}

impl Serialize for FormValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FormValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(FormValue::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn converts_json_both_ways() {
        let raw = json!({"name": "x", "tags": ["a", 1, null], "nested": {"ok": true}});
        let value = FormValue::from(raw.clone());
        assert_eq!(value.to_json(), raw);
    }

    #[test]
    fn truthiness_follows_form_conventions() {
        assert!(!FormValue::Null.is_truthy());
        assert!(!FormValue::from("").is_truthy());
        assert!(!FormValue::from(0).is_truthy());
        assert!(FormValue::object().is_truthy());
        assert!(FormValue::from("x").is_truthy());
    }

    #[test]
    fn hollow_detects_nested_empties() {
        assert!(FormValue::from(json!({"a": {"b": null}, "c": []})).is_hollow());
        assert!(!FormValue::from(json!({"a": {"b": "err"}})).is_hollow());
    }

    #[test]
    fn counts_only_non_empty_messages() {
        let errors = FormValue::from(json!({"a": "x", "b": ["y", null, ""], "c": {"d": "z"}}));
        assert_eq!(errors.count_messages(), 3);
    }
}
