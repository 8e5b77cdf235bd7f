//! Persistence traits shared by parameters, curves and gradients.
//!
//! Two formats are supported:
//!
//! - **JSON** through [`JsonValueSerializable`], working on `serde_json::Value`
//!   trees. Loaders are lenient: missing or mistyped fields read as zero.
//! - **Data blocks** through [`DataBlockSerializable`], working on
//!   [`DataBlock`] trees that encode to a compact binary form.

use crate::data_block::DataBlock;
use serde_json::{Map, Value};

/// Types that load from and save to a JSON value tree.
pub trait JsonValueSerializable {
    /// Overwrite `self` from `value`. Never fails; unreadable fields fall back to defaults.
    fn load_from_json_value(&mut self, value: &Value);

    fn to_json_value(&self) -> Value;

    /// Compact JSON text of [`to_json_value`](Self::to_json_value).
    fn to_json_string(&self) -> String {
        self.to_json_value().to_string()
    }

    /// Parse JSON text and load it. Returns the parse error; on error `self` is untouched.
    fn load_from_json_str(&mut self, text: &str) -> Result<(), serde_json::Error> {
        let value: Value = serde_json::from_str(text)?;
        self.load_from_json_value(&value);
        Ok(())
    }
}

/// Types that load from and save to a [`DataBlock`].
pub trait DataBlockSerializable {
    /// Overwrite `self` from `block`.
    ///
    /// Returns `true` on success. Loaders in this crate tolerate partial data
    /// and always succeed; the return value keeps the interface uniform with
    /// stricter implementors.
    fn load_from_data_block(&mut self, block: &DataBlock) -> bool;

    fn to_data_block(&self, block: &mut DataBlock);
}

/// Read a float field, 0 when missing or not a number.
pub(crate) fn json_f32(value: &Value, key: &str) -> f32 {
    value.get(key).and_then(Value::as_f64).unwrap_or(0.0) as f32
}

/// Read an integer field, 0 when missing or not an integer.
///
/// Out-of-range integers saturate so that a later enum conversion sees an
/// unknown value instead of a wrapped valid one.
pub(crate) fn json_i32(value: &Value, key: &str) -> i32 {
    match value.get(key) {
        Some(v) => match v.as_i64() {
            Some(n) => n.clamp(i32::MIN as i64, i32::MAX as i64) as i32,
            None => 0,
        },
        None => 0,
    }
}

/// Iterate the elements of an array field; empty when missing.
pub(crate) fn json_array<'a>(value: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter())
        .into_iter()
        .flatten()
}

/// Build a JSON object from key/value pairs.
pub(crate) fn json_object<const N: usize>(fields: [(&str, Value); N]) -> Value {
    let mut map = Map::new();
    for (key, value) in fields {
        map.insert(key.to_owned(), value);
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lenient_readers() {
        let value = json!({ "f": 1.5, "i": 4, "s": "text", "big": 1_i64 << 40 });
        assert_eq!(json_f32(&value, "f"), 1.5);
        assert_eq!(json_f32(&value, "i"), 4.0);
        assert_eq!(json_f32(&value, "s"), 0.0);
        assert_eq!(json_f32(&value, "missing"), 0.0);
        assert_eq!(json_i32(&value, "i"), 4);
        assert_eq!(json_i32(&value, "f"), 0);
        assert_eq!(json_i32(&value, "big"), i32::MAX);
        assert_eq!(json_array(&value, "missing").count(), 0);
    }

    #[test]
    fn test_json_object() {
        let value = json_object([("a", json!(1)), ("b", json!([]))]);
        assert_eq!(value, json!({ "a": 1, "b": [] }));
    }
}
