use layerconf_core::{normalize, Value};

use crate::error::DriverError;
use crate::parser::Parser;

/// Decodes a JSON document via `serde_json`, then normalizes it.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonParser;

impl Parser for JsonParser {
    fn parse(&self, bytes: &[u8]) -> Result<Value, DriverError> {
        let raw: serde_json::Value =
            serde_json::from_slice(bytes).map_err(|e| DriverError::Parse {
                path: "<bytes>".to_string(),
                format: "json".to_string(),
                source: Box::new(e),
            })?;
        Ok(normalize(from_json(raw)))
    }
}

pub(crate) fn from_json(value: serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else {
                Value::Float(n.as_f64().unwrap_or(0.0))
            }
        }
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(items) => Value::Seq(items.into_iter().map(from_json).collect()),
        serde_json::Value::Object(map) => {
            let mut bag = layerconf_core::Bag::new();
            for (k, v) in map {
                bag.insert(k, from_json(v));
            }
            Value::Map(bag)
        }
    }
}
