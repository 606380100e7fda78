//! Subcommand implementations.

mod pack;
mod publish;

pub use pack::pack;
pub use publish::publish;

use super::{ConfigArgs, RuntimeConfig};
use crate::config::{Config, ConfigResolver};
use crate::error::Result;

/// Resolves the configuration named on the command line, printing it as YAML
/// in verbose mode.
fn resolve_config(args: &ConfigArgs, runtime: &RuntimeConfig) -> Result<Config> {
    let config = ConfigResolver::from_process()?.resolve(&args.config, &args.set)?;

    if runtime.output().is_verbose() {
        runtime.section("Resolved configuration")?;
        print!("{}", serde_yaml::to_string(&config)?);
    }

    Ok(config)
}
