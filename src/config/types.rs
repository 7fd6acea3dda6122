//! Configuration type definitions and defaults

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::extract::record::{DEFAULT_NAME_FIELD, DEFAULT_TYPE_FIELD};
use crate::extract::{StreamerPreset, DEFAULT_TALLY_FILE};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Named account profiles, e.g. `[profiles.DEFAULT]`
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub compartments: CompartmentsConfig,
}

/// One account profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Tenancy OCID, also the default root compartment
    pub tenancy: String,
    /// Region identifier used to derive service endpoints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Overrides the region-derived audit endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_endpoint: Option<String>,
    /// Overrides the region-derived identity endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_endpoint: Option<String>,
    /// HTTP timeout per request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

pub fn default_timeout_secs() -> u64 {
    60
}

impl Profile {
    pub fn new(tenancy: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            tenancy: tenancy.into(),
            region: Some(region.into()),
            audit_endpoint: None,
            identity_endpoint: None,
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Audit service base URL: the override, else derived from the region.
    pub fn audit_endpoint(&self) -> Option<String> {
        self.audit_endpoint
            .clone()
            .or_else(|| self.region_endpoint("audit"))
    }

    /// Identity service base URL: the override, else derived from the region.
    pub fn identity_endpoint(&self) -> Option<String> {
        self.identity_endpoint
            .clone()
            .or_else(|| self.region_endpoint("identity"))
    }

    fn region_endpoint(&self, service: &str) -> Option<String> {
        self.region
            .as_deref()
            .map(|region| format!("https://{}.{}.oraclecloud.com", service, region))
    }
}

/// Audit extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Preset used when the CLI does not pick one
    #[serde(default)]
    pub preset: StreamerPreset,
    /// Overrides the preset's window size in days
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_days: Option<u32>,
    /// Where the event-name tally is written
    #[serde(default = "default_tally_file")]
    pub tally_file: String,
    /// Dotted path of the event type field
    #[serde(default = "default_type_field")]
    pub type_field: String,
    /// Dotted path of the event name field
    #[serde(default = "default_name_field")]
    pub name_field: String,
    /// Character separating filter patterns on the command line
    #[serde(default = "default_filter_separator")]
    pub filter_separator: String,
    /// Records requested per page
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
}

pub fn default_tally_file() -> String {
    DEFAULT_TALLY_FILE.to_string()
}

pub fn default_type_field() -> String {
    DEFAULT_TYPE_FIELD.to_string()
}

pub fn default_name_field() -> String {
    DEFAULT_NAME_FIELD.to_string()
}

pub fn default_filter_separator() -> String {
    ";".to_string()
}

pub fn default_page_limit() -> u32 {
    1000
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            preset: StreamerPreset::default(),
            window_days: None,
            tally_file: default_tally_file(),
            type_field: default_type_field(),
            name_field: default_name_field(),
            filter_separator: default_filter_separator(),
            page_limit: default_page_limit(),
        }
    }
}

/// Compartment traversal limits. Zero means unlimited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompartmentsConfig {
    #[serde(default)]
    pub max_depth: usize,
    #[serde(default = "default_max_nodes")]
    pub max_nodes: usize,
}

pub fn default_max_nodes() -> usize {
    10
}

impl Default for CompartmentsConfig {
    fn default() -> Self {
        Self {
            max_depth: 0,
            max_nodes: default_max_nodes(),
        }
    }
}
