//! Concrete config sources, parsers and their driver registries.
//!
//! `layerconf-core` defines the shapes (`Source`, `Parser`'s cousin
//! `Value`/`Bag`) without knowing where data comes from; this crate is
//! where the env vars, files, directories and HTTP endpoints actually get
//! read, parsed and normalized into those shapes.

pub mod disk;
pub mod error;
pub mod factories;
pub mod json_parser;
pub mod parser;
pub mod registry;
pub mod rest_requester;
pub mod sources;
pub mod trigger;
pub mod yaml_parser;

pub use disk::{Disk, MemoryDisk, OsDisk};
pub use error::DriverError;
pub use parser::Parser;
pub use registry::{DriverFactory, Registry};
pub use rest_requester::{ReqwestRequester, ReqwestRequesterFactory, RestRequester, RestRequesterFactory};
pub use trigger::Trigger;
