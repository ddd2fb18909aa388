use layerconf_core::{normalize, Bag, ConfigError, Source, Value};

use crate::json_parser::from_json as convert_json;
use crate::rest_requester::RestRequester;

/// Resolves a dotted path against a parsed JSON body, walking object fields
/// only (no array indexing) — the same traversal shape as [`Bag::get`], kept
/// separate since this walks a `serde_json::Value` before it ever becomes
/// one of ours.
pub(crate) fn resolve_json_path<'a>(body: &'a serde_json::Value, path: &str) -> Option<&'a serde_json::Value> {
    path.split('.').try_fold(body, |current, segment| current.get(segment))
}

/// Extracts and normalizes the mapping at `config_path` inside a REST
/// response body into a `Bag`. Shared by [`RestSource`] and
/// [`super::observable_rest::ObservableRestSource`].
pub(crate) fn extract_config(body: &serde_json::Value, config_path: &str) -> Result<Bag, ConfigError> {
    let config = resolve_json_path(body, config_path)
        .ok_or_else(|| ConfigError::RestConfigNotFound { path: config_path.to_string() })?;
    match normalize(convert_json(config.clone())) {
        Value::Map(bag) => Ok(bag),
        _ => Err(ConfigError::RestInvalidConfig { path: config_path.to_string() }),
    }
}

/// A one-shot REST config source: fetched once at construction, never
/// re-fetched. See [`super::observable_rest::ObservableRestSource`] for the
/// timestamp-gated variant.
pub struct RestSource {
    priority: i64,
    tree: Bag,
}

impl RestSource {
    pub fn new(
        priority: i64,
        uri: &str,
        config_path: &str,
        requester: &dyn RestRequester,
    ) -> Result<Self, ConfigError> {
        let body = requester.get(uri).map_err(ConfigError::from)?;
        let tree = extract_config(&body, config_path)?;
        Ok(Self { priority, tree })
    }
}

impl Source for RestSource {
    fn priority(&self) -> i64 {
        self.priority
    }

    fn set_priority(&mut self, priority: i64) {
        self.priority = priority;
    }

    fn tree(&self) -> Bag {
        self.tree.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DriverError;

    struct StubRequester(serde_json::Value);
    impl RestRequester for StubRequester {
        fn get(&self, _url: &str) -> Result<serde_json::Value, DriverError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn extracts_config_field() {
        let requester = StubRequester(serde_json::json!({"config": {"x": 1}}));
        let source = RestSource::new(0, "http://example.invalid/config", "config", &requester).unwrap();
        assert_eq!(source.tree().get("x"), Value::Int(1));
    }

    #[test]
    fn resolves_a_nested_dotted_config_path() {
        let requester = StubRequester(serde_json::json!({"data": {"settings": {"x": 9}}}));
        let source =
            RestSource::new(0, "http://example.invalid/config", "data.settings", &requester).unwrap();
        assert_eq!(source.tree().get("x"), Value::Int(9));
    }

    #[test]
    fn missing_config_field_errors() {
        let requester = StubRequester(serde_json::json!({}));
        assert!(matches!(
            RestSource::new(0, "http://example.invalid/config", "config", &requester),
            Err(ConfigError::RestConfigNotFound { .. })
        ));
    }
}
