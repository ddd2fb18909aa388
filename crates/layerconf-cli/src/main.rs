use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser as ClapParser;
use layerconf::{Facade, Lifecycle};
use layerconf_core::{ConfigError, Manager};
use layerconf_drivers::OsDisk;

/// Boots a config aggregator from a defaults file and prints a resolved
/// path, or lists every value currently known at the root.
#[derive(ClapParser)]
#[command(name = "layerconf-cli", about = "Inspect a layerconf aggregate")]
struct Cli {
    /// Path to a defaults config file (JSON or YAML, by extension).
    #[arg(long)]
    defaults: Option<PathBuf>,

    /// Dotted path to resolve and print; prints the whole tree if omitted.
    path: Option<String>,
}

fn main() -> Result<(), ConfigError> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let manager = Arc::new(Manager::new());
    let mut lifecycle = Lifecycle::new(manager.clone(), Arc::new(OsDisk));
    lifecycle.boot(cli.defaults.as_deref())?;

    let config = Facade::new(manager, lifecycle.parsers());
    match cli.path {
        Some(path) => println!("{path} = {:?}", config.get(&path)),
        None => println!("{:?}", config.get("")),
    }

    lifecycle.close()?;
    Ok(())
}
