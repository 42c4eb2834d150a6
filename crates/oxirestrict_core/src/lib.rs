//! Core engine for flagging restricted imports in JavaScript/TypeScript.
//!
//! This crate provides the pieces the loader boundary and the CLI build on:
//! - Scanning a single source file for import/export module paths
//! - Deciders (regex or function, sync or async) that classify paths
//! - Checking a file against a set of deciders, one result list per decider
//! - Rendering restricted imports into the report text for diagnostics
//! - A default node_modules-style filesystem resolver

mod checker;
mod constants;
mod decider;
mod deciders;
mod parser;
mod reporter;
mod resolver;
mod types;

// Re-export public API
pub use checker::{check, check_async};
pub use constants::{INDEX_FILES, JS_TS_EXTENSIONS, RESOLVE_EXTENSIONS};
pub use decider::{AsyncDecide, AsyncDecider, Decider, DeciderFn, Resolve, ResolveContext};
pub use deciders::{
    climbing_above, inside_directories, matching, matching_package, outside_directories,
};
pub use parser::imports_in;
pub use reporter::render_report;
pub use resolver::FsResolver;
pub use types::{Decision, FoundImport, RestrictedImport};
