//! Command handlers for the ocitools CLI.
//!
//! Each submodule handles a specific CLI command or command group.
//! The main dispatch logic remains in main.rs.

pub mod audit;
pub mod completions;
pub mod compartments;
pub mod config;
pub mod to_csv;

use anyhow::{Context, Result};
use std::time::Duration;

use ocitools::cli::GlobalArgs;
use ocitools::{Config, Profile};

/// Load the configuration and the selected profile.
///
/// Both are required: every remote call needs the tenancy and an endpoint.
pub fn load_profile(global: &GlobalArgs) -> Result<(Config, Profile)> {
    let config = Config::load(global.config_file.as_deref())?;
    let profile = config.profile(&global.profile)?.clone();
    Ok((config, profile))
}

/// Per-request timeout for a profile.
pub fn request_timeout(profile: &Profile) -> Duration {
    Duration::from_secs(profile.timeout_secs)
}

/// The service endpoint, or an error naming the missing setting.
pub fn require_endpoint(endpoint: Option<String>, service: &str) -> Result<String> {
    endpoint.with_context(|| format!("profile has no {} endpoint or region", service))
}
