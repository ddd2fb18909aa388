use layerconf_core::{normalize, Value};

use crate::error::DriverError;
use crate::parser::Parser;

/// Decodes a YAML document via `serde_yaml`, then normalizes it.
///
/// YAML, unlike JSON, permits non-string mapping keys (`1: foo`, `true:
/// bar`); since the internal model only ever has string keys, any scalar key
/// is stringified via its `Debug` rendering before normalization lowercases
/// it — matching the original's fallback of formatting a non-string key
/// rather than rejecting the document.
#[derive(Debug, Default, Clone, Copy)]
pub struct YamlParser;

impl Parser for YamlParser {
    fn parse(&self, bytes: &[u8]) -> Result<Value, DriverError> {
        let raw: serde_yaml::Value =
            serde_yaml::from_slice(bytes).map_err(|e| DriverError::Parse {
                path: "<bytes>".to_string(),
                format: "yaml".to_string(),
                source: Box::new(e),
            })?;
        Ok(normalize(from_yaml(raw)))
    }
}

fn from_yaml(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else {
                Value::Float(n.as_f64().unwrap_or(0.0))
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => Value::Seq(items.into_iter().map(from_yaml).collect()),
        serde_yaml::Value::Mapping(map) => {
            let mut bag = layerconf_core::Bag::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s,
                    other => format!("{other:?}"),
                };
                bag.insert(key, from_yaml(v));
            }
            Value::Map(bag)
        }
        serde_yaml::Value::Tagged(tagged) => from_yaml(tagged.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_normalizes_yaml_mapping() {
        let parser = YamlParser;
        let value = parser.parse(b"db:\n  port: 5432\n  host: x\n").unwrap();
        match value {
            Value::Map(bag) => {
                assert_eq!(bag.get("db.port"), Value::Int(5432));
                assert_eq!(bag.get("db.host"), Value::String("x".into()));
            }
            other => panic!("expected a map, got {other:?}"),
        }
    }

    #[test]
    fn non_string_keys_are_stringified() {
        let parser = YamlParser;
        let value = parser.parse(b"1: one\n").unwrap();
        match value {
            Value::Map(bag) => assert!(bag.has("1")),
            other => panic!("expected a map, got {other:?}"),
        }
    }
}
