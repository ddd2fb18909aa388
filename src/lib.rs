//! A hierarchical configuration aggregator with live observation.
//!
//! Build a [`Manager`], wire it up through [`Lifecycle`] (which installs
//! defaults, declared sources and the recurring reload trigger), and hand
//! out a [`Facade`] to application code as the one surface it depends on.
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use layerconf::{Facade, Lifecycle};
//! use layerconf_core::Manager;
//! use layerconf_drivers::OsDisk;
//!
//! let manager = Arc::new(Manager::new());
//! let mut lifecycle = Lifecycle::new(manager.clone(), Arc::new(OsDisk));
//! lifecycle.boot(Some(std::path::Path::new("config.yaml")))?;
//! lifecycle.run(Duration::from_secs(30))?;
//!
//! let config = Facade::new(manager, lifecycle.parsers());
//! let _ = config.string("app.name", "unnamed");
//! # Ok::<(), layerconf_core::ConfigError>(())
//! ```

pub mod facade;
pub mod lifecycle;

pub use facade::Facade;
pub use lifecycle::Lifecycle;

pub use layerconf_core::{Bag, ConfigError, Manager, Source, Value};
