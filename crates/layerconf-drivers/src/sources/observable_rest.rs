use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use layerconf_core::{Bag, ConfigError, Source};

use crate::rest_requester::RestRequester;

use super::rest::{extract_config, resolve_json_path};

fn extract_timestamp(body: &serde_json::Value, timestamp_path: &str) -> Result<OffsetDateTime, ConfigError> {
    let raw = resolve_json_path(body, timestamp_path)
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| ConfigError::RestTimestampNotFound { path: timestamp_path.to_string() })?;
    OffsetDateTime::parse(raw, &Rfc3339)
        .map_err(|_| ConfigError::RestInvalidTimestamp { path: timestamp_path.to_string() })
}

/// A REST config source that re-fetches on reload, but only rebuilds its
/// tree when the response's timestamp field is strictly newer than the last
/// one observed — a fetch whose timestamp hasn't advanced is treated as
/// unchanged even if the body bytes differ.
pub struct ObservableRestSource {
    priority: i64,
    uri: String,
    config_path: String,
    timestamp_path: String,
    requester: Box<dyn RestRequester>,
    tree: Bag,
    last_timestamp: OffsetDateTime,
}

impl ObservableRestSource {
    pub fn new(
        priority: i64,
        uri: impl Into<String>,
        config_path: impl Into<String>,
        timestamp_path: impl Into<String>,
        requester: Box<dyn RestRequester>,
    ) -> Result<Self, ConfigError> {
        let uri = uri.into();
        let config_path = config_path.into();
        let timestamp_path = timestamp_path.into();
        let body = requester.get(&uri).map_err(ConfigError::from)?;
        let tree = extract_config(&body, &config_path)?;
        let last_timestamp = extract_timestamp(&body, &timestamp_path)?;
        Ok(Self { priority, uri, config_path, timestamp_path, requester, tree, last_timestamp })
    }
}

impl Source for ObservableRestSource {
    fn priority(&self) -> i64 {
        self.priority
    }

    fn set_priority(&mut self, priority: i64) {
        self.priority = priority;
    }

    fn tree(&self) -> Bag {
        self.tree.clone()
    }

    fn reload(&mut self) -> Option<Result<bool, ConfigError>> {
        Some((|| {
            let body = self.requester.get(&self.uri).map_err(ConfigError::from)?;
            let timestamp = extract_timestamp(&body, &self.timestamp_path)?;
            if timestamp <= self.last_timestamp {
                return Ok(false);
            }
            self.tree = extract_config(&body, &self.config_path)?;
            self.last_timestamp = timestamp;
            Ok(true)
        })())
    }
}
