pub mod config_cmd;
pub mod digest;
pub mod inspect;

use contextclaw_config::{ConfigError, ContextConfig};
use std::path::Path;

/// Load the config from `path` if given, else from the default location.
/// Env var overrides apply either way.
pub fn load_config(path: Option<&Path>) -> Result<ContextConfig, ConfigError> {
    match path {
        Some(path) => ContextConfig::load_with_env(path),
        None => ContextConfig::load(),
    }
}
