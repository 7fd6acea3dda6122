//! Configuration management for ocitools

mod io;
mod types;

pub use types::*;

use std::io as stdio;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::compartments::TraversalLimits;
use crate::extract::{ExtractorSettings, RecordFields};

/// Errors loading or interpreting the configuration file.
///
/// All of these are fatal and happen before any remote call.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine home directory")]
    NoHomeDir,

    #[error("config file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: stdio::Error,
    },

    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: stdio::Error,
    },

    #[error("profile '{name}' not found{}", available_suffix(.available))]
    MissingProfile {
        name: String,
        available: Vec<String>,
    },

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: String, reason: String },
}

fn available_suffix(available: &[String]) -> String {
    if available.is_empty() {
        " (no profiles configured)".to_string()
    } else {
        format!(" (available: {})", available.join(", "))
    }
}

fn invalid(field: impl Into<String>, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field: field.into(),
        reason: reason.into(),
    }
}

impl Config {
    /// Get the default config file path (~/.config/ocitools/config.toml)
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        io::config_path()
    }

    /// Resolve the path to load: explicit path if given, default otherwise.
    pub fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
        match explicit {
            Some(path) => Ok(path.to_path_buf()),
            None => io::config_path(),
        }
    }

    /// Load configuration from `explicit` or the default location.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        io::load_from(&Self::resolve_path(explicit)?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        io::load_from(path)
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        io::save_to(self, path)
    }

    /// Check every value that would otherwise fail late, mid-run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, profile) in &self.profiles {
            if profile.tenancy.trim().is_empty() {
                return Err(invalid(format!("profiles.{}.tenancy", name), "must not be empty"));
            }
            if profile.region.is_none()
                && (profile.audit_endpoint.is_none() || profile.identity_endpoint.is_none())
            {
                return Err(invalid(
                    format!("profiles.{}.region", name),
                    "required unless both endpoints are set",
                ));
            }
            if profile.timeout_secs == 0 {
                return Err(invalid(
                    format!("profiles.{}.timeout_secs", name),
                    "must be at least 1",
                ));
            }
        }
        if self.audit.window_days == Some(0) {
            return Err(invalid("audit.window_days", "must be at least 1"));
        }
        if self.audit.page_limit == 0 {
            return Err(invalid("audit.page_limit", "must be at least 1"));
        }
        self.filter_separator()?;
        self.record_fields()?;
        Ok(())
    }

    /// Look up a profile by name.
    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::MissingProfile {
                name: name.to_string(),
                available: self.profiles.keys().cloned().collect(),
            })
    }

    /// Extractor settings from the configured preset and window override.
    pub fn extractor_settings(&self) -> ExtractorSettings {
        let mut settings = self.audit.preset.settings();
        if let Some(days) = self.audit.window_days {
            settings.max_window_days = days;
        }
        settings
    }

    pub fn record_fields(&self) -> Result<RecordFields, ConfigError> {
        RecordFields::new(&self.audit.type_field, &self.audit.name_field)
            .map_err(|reason| invalid("audit.type_field/name_field", reason))
    }

    /// The filter separator as a single character.
    pub fn filter_separator(&self) -> Result<char, ConfigError> {
        let mut chars = self.audit.filter_separator.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(invalid(
                "audit.filter_separator",
                "must be exactly one character",
            )),
        }
    }

    /// Traversal limits with zero mapped to unlimited.
    pub fn traversal_limits(&self) -> TraversalLimits {
        TraversalLimits::from_counts(self.compartments.max_depth, self.compartments.max_nodes)
    }
}
