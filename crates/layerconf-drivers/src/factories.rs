use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use layerconf_core::{Bag, ConfigError, Source, Value};

use crate::disk::Disk;
use crate::parser::Parser;
use crate::registry::{DriverFactory, Registry};
use crate::rest_requester::RestRequesterFactory;

fn required_string(config: &Bag, id: &str, field: &str) -> Result<String, ConfigError> {
    match config.get(field) {
        Value::String(s) if !s.is_empty() => Ok(s),
        _ => Err(ConfigError::InvalidResourceConfig {
            id: id.to_string(),
            reason: format!("missing or empty required field {field:?}"),
        }),
    }
}

fn resource_id(config: &Bag) -> String {
    config.string("id", "<unnamed>")
}

/// Matches the `json` parser driver (`{"driver": "json"}` or bare
/// `{"format": "json"}`, accepted either way since parser configs only ever
/// carry a format discriminator).
pub struct JsonParserFactory;

impl DriverFactory<Box<dyn Parser>> for JsonParserFactory {
    fn accept(&self, config: &Bag) -> bool {
        config.string("format", "") == "json" || config.string("driver", "") == "json"
    }

    fn create(&self, _config: &Bag) -> Result<Box<dyn Parser>, ConfigError> {
        Ok(Box::new(crate::json_parser::JsonParser))
    }
}

pub struct YamlParserFactory;

impl DriverFactory<Box<dyn Parser>> for YamlParserFactory {
    fn accept(&self, config: &Bag) -> bool {
        matches!(config.string("format", "").as_str(), "yaml" | "yml")
            || matches!(config.string("driver", "").as_str(), "yaml" | "yml")
    }

    fn create(&self, _config: &Bag) -> Result<Box<dyn Parser>, ConfigError> {
        Ok(Box::new(crate::yaml_parser::YamlParser))
    }
}

/// Builds the default parser registry with the JSON and YAML factories
/// registered, in the order a caller would normally want them tried.
pub fn default_parser_registry() -> Registry<Box<dyn Parser>> {
    let mut registry = Registry::new();
    registry.register(Box::new(JsonParserFactory));
    registry.register(Box::new(YamlParserFactory));
    registry
}

/// `{"driver": "env", "priority": <int>, "mappings": {<VAR_NAME>: <path>}, "files": [<path>, ...]}`
pub struct EnvSourceFactory {
    disk: Arc<dyn Disk>,
}

impl EnvSourceFactory {
    pub fn new(disk: Arc<dyn Disk>) -> Self {
        Self { disk }
    }
}

impl DriverFactory<Box<dyn Source>> for EnvSourceFactory {
    fn accept(&self, config: &Bag) -> bool {
        config.string("driver", "") == "env"
    }

    fn create(&self, config: &Bag) -> Result<Box<dyn Source>, ConfigError> {
        let id = resource_id(config);
        let priority = config.int("priority", 0);
        let mappings = config.map_string("mappings", Default::default());
        if mappings.is_empty() {
            return Err(ConfigError::InvalidResourceConfig {
                id,
                reason: "env source requires a non-empty mappings field".to_string(),
            });
        }
        let files: Vec<PathBuf> = config.string_seq("files", Vec::new()).into_iter().map(PathBuf::from).collect();
        if files.is_empty() {
            return Ok(Box::new(crate::sources::EnvSource::new(priority, &mappings)));
        }
        Ok(Box::new(crate::sources::EnvSource::with_files(
            priority,
            &mappings,
            &files,
            self.disk.as_ref(),
        )?))
    }
}

/// `{"driver": "file", "priority": <int>, "path": <string>, "parser": <id>}`
pub struct FileSourceFactory {
    disk: Arc<dyn Disk>,
    parsers: Arc<Mutex<Registry<Box<dyn Parser>>>>,
    default_parser_id: Option<String>,
}

impl FileSourceFactory {
    pub fn new(
        disk: Arc<dyn Disk>,
        parsers: Arc<Mutex<Registry<Box<dyn Parser>>>>,
        default_parser_id: Option<String>,
    ) -> Self {
        Self { disk, parsers, default_parser_id }
    }
}

impl DriverFactory<Box<dyn Source>> for FileSourceFactory {
    fn accept(&self, config: &Bag) -> bool {
        config.string("driver", "") == "file"
    }

    fn create(&self, config: &Bag) -> Result<Box<dyn Source>, ConfigError> {
        let id = resource_id(config);
        let priority = config.int("priority", 0);
        let path = PathBuf::from(required_string(config, &id, "path")?);
        let parser_id = config.string("parser", "");
        let parser_id = if parser_id.is_empty() { self.default_parser_id.clone() } else { Some(parser_id) };
        Ok(Box::new(crate::sources::FileSource::new(
            priority,
            &path,
            self.disk.as_ref(),
            &self.parsers,
            parser_id.as_deref(),
        )?))
    }
}

/// `{"driver": "dir", "priority": <int>, "path": <string>, "recursive": <bool>, "parser": <id>}`
pub struct DirSourceFactory {
    disk: Arc<dyn Disk>,
    parsers: Arc<Mutex<Registry<Box<dyn Parser>>>>,
    default_parser_id: Option<String>,
}

impl DirSourceFactory {
    pub fn new(
        disk: Arc<dyn Disk>,
        parsers: Arc<Mutex<Registry<Box<dyn Parser>>>>,
        default_parser_id: Option<String>,
    ) -> Self {
        Self { disk, parsers, default_parser_id }
    }
}

impl DriverFactory<Box<dyn Source>> for DirSourceFactory {
    fn accept(&self, config: &Bag) -> bool {
        config.string("driver", "") == "dir"
    }

    fn create(&self, config: &Bag) -> Result<Box<dyn Source>, ConfigError> {
        let id = resource_id(config);
        let priority = config.int("priority", 0);
        let path = PathBuf::from(required_string(config, &id, "path")?);
        let recursive = config.bool("recursive", false);
        let parser_id = config.string("parser", "");
        let parser_id = if parser_id.is_empty() { self.default_parser_id.clone() } else { Some(parser_id) };
        Ok(Box::new(crate::sources::DirSource::new(
            priority,
            &path,
            self.disk.as_ref(),
            &self.parsers,
            parser_id.as_deref(),
            recursive,
        )?))
    }
}

/// `{"driver": "observable-file", "priority": <int>, "path": <string>, "parser": <id>}`
pub struct ObservableFileSourceFactory {
    disk: Arc<dyn Disk>,
    parsers: Arc<Mutex<Registry<Box<dyn Parser>>>>,
    default_parser_id: Option<String>,
}

impl ObservableFileSourceFactory {
    pub fn new(
        disk: Arc<dyn Disk>,
        parsers: Arc<Mutex<Registry<Box<dyn Parser>>>>,
        default_parser_id: Option<String>,
    ) -> Self {
        Self { disk, parsers, default_parser_id }
    }
}

impl DriverFactory<Box<dyn Source>> for ObservableFileSourceFactory {
    fn accept(&self, config: &Bag) -> bool {
        config.string("driver", "") == "observable-file"
    }

    fn create(&self, config: &Bag) -> Result<Box<dyn Source>, ConfigError> {
        let id = resource_id(config);
        let priority = config.int("priority", 0);
        let path = PathBuf::from(required_string(config, &id, "path")?);
        let parser_id = config.string("parser", "");
        let parser_id = if parser_id.is_empty() { self.default_parser_id.clone() } else { Some(parser_id) };
        Ok(Box::new(crate::sources::ObservableFileSource::new(
            priority,
            path,
            self.disk.clone(),
            self.parsers.clone(),
            parser_id,
        )?))
    }
}

/// `{"driver": "rest", "priority": <int>, "uri": <string>, "path": {"config": <string>}}`
pub struct RestSourceFactory {
    requesters: Arc<dyn RestRequesterFactory>,
}

impl RestSourceFactory {
    pub fn new(requesters: Arc<dyn RestRequesterFactory>) -> Self {
        Self { requesters }
    }
}

impl DriverFactory<Box<dyn Source>> for RestSourceFactory {
    fn accept(&self, config: &Bag) -> bool {
        config.string("driver", "") == "rest"
    }

    fn create(&self, config: &Bag) -> Result<Box<dyn Source>, ConfigError> {
        let id = resource_id(config);
        let priority = config.int("priority", 0);
        let uri = required_string(config, &id, "uri")?;
        let config_path = required_string(config, &id, "path.config")?;
        let requester = self.requesters.create(config).map_err(ConfigError::from)?;
        Ok(Box::new(crate::sources::RestSource::new(priority, &uri, &config_path, requester.as_ref())?))
    }
}

/// `{"driver": "observable-rest", "priority": <int>, "uri": <string>, "path": {"config": <string>, "timestamp": <string>}}`
pub struct ObservableRestSourceFactory {
    requesters: Arc<dyn RestRequesterFactory>,
}

impl ObservableRestSourceFactory {
    pub fn new(requesters: Arc<dyn RestRequesterFactory>) -> Self {
        Self { requesters }
    }
}

impl DriverFactory<Box<dyn Source>> for ObservableRestSourceFactory {
    fn accept(&self, config: &Bag) -> bool {
        config.string("driver", "") == "observable-rest"
    }

    fn create(&self, config: &Bag) -> Result<Box<dyn Source>, ConfigError> {
        let id = resource_id(config);
        let priority = config.int("priority", 0);
        let uri = required_string(config, &id, "uri")?;
        let config_path = required_string(config, &id, "path.config")?;
        let timestamp_path = required_string(config, &id, "path.timestamp")?;
        let requester = self.requesters.create(config).map_err(ConfigError::from)?;
        Ok(Box::new(crate::sources::ObservableRestSource::new(
            priority,
            uri,
            config_path,
            timestamp_path,
            requester,
        )?))
    }
}

/// Builds the default source registry with every shipped driver factory
/// registered, sharing one disk handle and one parser registry across the
/// file-backed ones. `default_file_parser_id` and `default_rest_parser_id`
/// come from the well-known globals `Lifecycle::boot` reads off the
/// aggregate; a source whose declarative config omits `parser` falls back
/// to them.
pub fn default_source_registry(
    disk: Arc<dyn Disk>,
    parsers: Arc<Mutex<Registry<Box<dyn Parser>>>>,
    requesters: Arc<dyn RestRequesterFactory>,
    default_file_parser_id: Option<String>,
) -> Registry<Box<dyn Source>> {
    let mut registry = Registry::new();
    registry.register(Box::new(EnvSourceFactory::new(disk.clone())));
    registry.register(Box::new(FileSourceFactory::new(
        disk.clone(),
        parsers.clone(),
        default_file_parser_id.clone(),
    )));
    registry.register(Box::new(DirSourceFactory::new(
        disk.clone(),
        parsers.clone(),
        default_file_parser_id.clone(),
    )));
    registry.register(Box::new(ObservableFileSourceFactory::new(disk, parsers, default_file_parser_id)));
    registry.register(Box::new(RestSourceFactory::new(requesters.clone())));
    registry.register(Box::new(ObservableRestSourceFactory::new(requesters)));
    registry
}
