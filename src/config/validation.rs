//! Configuration validation.
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServeConfig → Result<(), Vec<ValidationError>>
//! - Runs before any listener is built
//! - Port 0 (ephemeral) may repeat

use std::collections::HashSet;

use crate::config::schema::ServeConfig;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("no sites configured")]
    NoSites,

    #[error("port {0} is used by more than one site")]
    DuplicatePort(u16),

    #[error("site {index} has an empty directory")]
    EmptyDirectory { index: usize },

    #[error("TLS certificate and key paths must both be set")]
    IncompleteTls,
}

pub fn validate_config(config: &ServeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.sites.is_empty() {
        errors.push(ValidationError::NoSites);
    }

    let mut seen = HashSet::new();
    for (index, site) in config.sites.iter().enumerate() {
        if site.port != 0 && !seen.insert(site.port) {
            errors.push(ValidationError::DuplicatePort(site.port));
        }
        if site.directory.as_os_str().is_empty() {
            errors.push(ValidationError::EmptyDirectory { index });
        }
    }

    if let Some(tls) = &config.tls {
        if tls.cert_path.as_os_str().is_empty() || tls.key_path.as_os_str().is_empty() {
            errors.push(ValidationError::IncompleteTls);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
