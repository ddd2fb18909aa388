use layerconf_core::ConfigError;

/// Driver-local errors, kept separate from [`ConfigError`] because they carry
/// detail (the offending bytes' format, the HTTP status) that's only
/// meaningful while still inside this crate. Every public driver
/// constructor converts into `ConfigError` at its boundary.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("failed to read {path}: {source}")]
    Read { path: String, #[source] source: std::io::Error },

    #[error("failed to parse {path} as {format}: {source}")]
    Parse { path: String, format: String, #[source] source: Box<dyn std::error::Error + Send + Sync> },

    #[error("request to {url} failed: {source}")]
    Request { url: String, #[source] source: reqwest::Error },

    #[error("unexpected response status {status} from {url}")]
    Status { url: String, status: u16 },
}

impl From<DriverError> for ConfigError {
    fn from(err: DriverError) -> Self {
        match err {
            DriverError::Read { path, source } => ConfigError::Io {
                context: format!("reading config source {path}"),
                source,
            },
            DriverError::Parse { path, format, source } => ConfigError::Parser {
                context: format!("parsing {path} as {format}"),
                detail: source.to_string(),
            },
            DriverError::Request { url, source } => ConfigError::Parser {
                context: format!("requesting {url}"),
                detail: source.to_string(),
            },
            DriverError::Status { url, status } => ConfigError::Parser {
                context: format!("requesting {url}"),
                detail: format!("unexpected status {status}"),
            },
        }
    }
}
