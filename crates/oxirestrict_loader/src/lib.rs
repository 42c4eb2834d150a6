//! Build-host boundary for restricted-import scanning.
//!
//! This crate turns the core engine into something a bundler transform stage
//! or CLI can drive: a validated options model (rule file or programmatic),
//! a host trait for error/warning sinks, and [`run`], which scans one file
//! and dispatches every matching rule at its configured severity. A fatal
//! match comes back as [`LoaderError::Restricted`] so hosts can stop the
//! build; errors and warnings only land in the host's sinks.

mod collector;
mod loader;
mod options;

// Re-export public API
pub use collector::{collect_files, find_git_root};
pub use loader::{LoaderError, LoaderHost, run};
pub use options::{
    DEFAULT_INFO, LoaderOptions, OptionsConfig, OptionsError, RestrictedSpec, Rule, RuleConfig,
    Severity,
};
