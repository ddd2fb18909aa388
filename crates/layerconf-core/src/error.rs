use std::fmt;

/// Error kinds produced by the config core and propagated up through the
/// driver and facade layers.
///
/// Deliberately a hand-written enum with a manual `Display` impl rather than
/// a `thiserror` derive, since every variant here needs named fields and a
/// message format specific to the config domain rather than a wrapped
/// source error.
#[derive(Debug)]
pub enum ConfigError {
    /// A required collaborator (source, callback, requester) was missing.
    NilReference { what: &'static str },
    /// A dotted path was empty where a write was attempted, or traversed a
    /// non-mapping value.
    InvalidPath { path: String },
    /// No source is registered under the given id.
    SourceNotFound { id: String },
    /// A source is already registered under the given id.
    DuplicateSource { id: String },
    /// An observer is already registered under `(path, id)`.
    DuplicateObserver { path: String, id: String },
    /// A declarative resource config named a driver no registered factory
    /// accepts.
    UnknownResource { id: String },
    /// A declarative resource config is missing a required field or has one
    /// of the wrong shape.
    InvalidResourceConfig { id: String, reason: String },
    /// A resource id collides with one already built from declarative
    /// config.
    DuplicateResource { id: String },
    /// A REST source's response body had no `config` field.
    RestConfigNotFound { path: String },
    /// A REST source's `config` field was not a mapping.
    RestInvalidConfig { path: String },
    /// An observable REST source's response body had no timestamp field.
    RestTimestampNotFound { path: String },
    /// An observable REST source's timestamp field did not parse as
    /// RFC 3339.
    RestInvalidTimestamp { path: String },
    /// An underlying I/O operation failed.
    Io { context: String, source: std::io::Error },
    /// An underlying parse (JSON/YAML/HTTP) operation failed.
    Parser { context: String, detail: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NilReference { what } => write!(f, "nil reference: {what}"),
            Self::InvalidPath { path } => write!(f, "invalid path: {path:?}"),
            Self::SourceNotFound { id } => write!(f, "config source not found: {id}"),
            Self::DuplicateSource { id } => write!(f, "config source already registered: {id}"),
            Self::DuplicateObserver { path, id } => {
                write!(f, "observer already registered: {path} => {id}")
            }
            Self::UnknownResource { id } => {
                write!(f, "no driver accepts resource config: {id}")
            }
            Self::InvalidResourceConfig { id, reason } => {
                write!(f, "invalid resource config for {id}: {reason}")
            }
            Self::DuplicateResource { id } => write!(f, "resource already built: {id}"),
            Self::RestConfigNotFound { path } => {
                write!(f, "rest response missing config field at {path}")
            }
            Self::RestInvalidConfig { path } => {
                write!(f, "rest response config field is not a mapping at {path}")
            }
            Self::RestTimestampNotFound { path } => {
                write!(f, "rest response missing timestamp field at {path}")
            }
            Self::RestInvalidTimestamp { path } => {
                write!(f, "rest response timestamp did not parse as rfc3339 at {path}")
            }
            Self::Io { context, source } => write!(f, "{context}: {source}"),
            Self::Parser { context, detail } => write!(f, "{context}: {detail}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(source: std::io::Error) -> Self {
        Self::Io { context: "io error".to_string(), source }
    }
}
