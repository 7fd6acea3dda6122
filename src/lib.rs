//! ocitools Library
//!
//! Audit event extraction and compartment tooling for Oracle Cloud
//! Infrastructure tenancies.

pub mod cli;
pub mod compartments;
pub mod config;
pub mod export;
pub mod extract;
pub mod logging;
pub mod remote;

pub use compartments::{walk, Compartment, CompartmentSource, TraversalLimits, TraversalReport};
pub use config::{Config, ConfigError, Profile};
pub use extract::{
    EventSource, ExtractError, ExtractionRequest, ExtractionSummary, Extractor, ExtractorSettings,
    FetchError, StreamerPreset,
};
pub use remote::{HttpAuditSource, HttpCompartmentSource};
