//! ---
//! simlink_section: "01-core-functionality"
//! simlink_subsection: "module"
//! simlink_type: "source"
//! simlink_scope: "code"
//! simlink_description: "Shared configuration and logging bootstrap."
//! simlink_version: "v0.0.0-prealpha"
//! simlink_owner: "tbd"
//! ---
//! Configuration loading and tracing setup shared by SimLink binaries.

pub mod config;
pub mod logging;

pub use config::{
    DiagnosticsConfig, LoadedSimlinkConfig, LoggingConfig, ProtocolConfig, SimlinkConfig,
    DEFAULT_PROTOCOL_VERSION,
};
pub use logging::{init_tracing, LogFormat, LOG_ENV};
