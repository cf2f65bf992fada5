//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::ServeConfig;
use crate::config::validation::ValidationError;

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(
        "every port needs a directory (and a fallback when any are given): \
         got {ports} ports, {directories} directories, {fallbacks} fallbacks"
    )]
    Mismatch {
        ports: usize,
        directories: usize,
        fallbacks: usize,
    },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from a TOML file. Validation happens once the command
/// line has been merged in.
pub fn load_config(path: &Path) -> Result<ServeConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: ServeConfig = toml::from_str(&content)?;
    tracing::debug!(path = %path.display(), sites = config.sites.len(), "Configuration file read");
    Ok(config)
}
