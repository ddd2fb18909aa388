use layerconf_core::Value;

use crate::error::DriverError;

/// Decodes raw bytes from a config format (JSON, YAML, ...) into a
/// `layerconf_core::Value`, normalized — every implementation must route its
/// decoded output through `layerconf_core::normalize` before returning, so
/// case-insensitivity and number narrowing are guaranteed regardless of
/// which parser produced the value.
pub trait Parser: Send + Sync {
    fn parse(&self, bytes: &[u8]) -> Result<Value, DriverError>;

    /// Releases any resource the parser holds. The default no-op covers the
    /// stateless JSON/YAML parsers this crate ships.
    fn close(&mut self) -> Result<(), DriverError> {
        Ok(())
    }
}
