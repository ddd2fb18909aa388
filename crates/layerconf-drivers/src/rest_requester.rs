use layerconf_core::Bag;

use crate::error::DriverError;

/// Performs the blocking HTTP GET a REST config source needs. A trait
/// rather than a bare `reqwest::blocking::Client` so tests can inject a
/// stub instead of making real network calls.
pub trait RestRequester: Send + Sync {
    fn get(&self, url: &str) -> Result<serde_json::Value, DriverError>;
}

/// Builds a [`RestRequester`] from a source's declarative config lazily, at
/// the point a `RestSource`/`ObservableRestSource` is actually constructed,
/// rather than sharing one requester across every REST source — mirrors the
/// original's "generator" capability so each source can carry its own
/// client configuration (headers, timeout) without a shared-client
/// bottleneck.
pub trait RestRequesterFactory: Send + Sync {
    fn create(&self, config: &Bag) -> Result<Box<dyn RestRequester>, DriverError>;
}

/// The shipped [`RestRequester`], backed by `reqwest`'s blocking client —
/// matches the blocking HTTP client the teacher's LFS batch API client uses,
/// which fits here too since the manager's whole contract is synchronous.
pub struct ReqwestRequester {
    client: reqwest::blocking::Client,
}

impl ReqwestRequester {
    pub fn new() -> Self {
        Self { client: reqwest::blocking::Client::new() }
    }
}

impl Default for ReqwestRequester {
    fn default() -> Self {
        Self::new()
    }
}

impl RestRequester for ReqwestRequester {
    fn get(&self, url: &str) -> Result<serde_json::Value, DriverError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| DriverError::Request { url: url.to_string(), source: e })?;
        if !response.status().is_success() {
            return Err(DriverError::Status { url: url.to_string(), status: response.status().as_u16() });
        }
        response
            .json()
            .map_err(|e| DriverError::Request { url: url.to_string(), source: e })
    }
}

/// Default factory for [`ReqwestRequester`]: ignores the per-source config
/// beyond what `RestSource`/`ObservableRestSource` already read (uri,
/// priority), since the shipped client needs no further setup.
pub struct ReqwestRequesterFactory;

impl RestRequesterFactory for ReqwestRequesterFactory {
    fn create(&self, _config: &Bag) -> Result<Box<dyn RestRequester>, DriverError> {
        Ok(Box::new(ReqwestRequester::new()))
    }
}
