use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};

use crate::types::Decision;

/// Synchronous decider function, normalized to return a full [`Decision`].
pub type DeciderFn = Box<dyn Fn(&str) -> Decision + Send + Sync>;

/// Classifies an import path as restricted or not.
///
/// The pattern form tests the regular expression against the path verbatim
/// and never attaches info; the function form may explain its verdict.
pub enum Decider {
    Pattern(Regex),
    Function(DeciderFn),
}

impl Decider {
    pub fn decide(&self, import_path: &str) -> Decision {
        match self {
            Decider::Pattern(re) => Decision::from(re.is_match(import_path)),
            Decider::Function(f) => f(import_path),
        }
    }
}

impl From<Regex> for Decider {
    fn from(re: Regex) -> Self {
        Decider::Pattern(re)
    }
}

/// Module resolution supplied by the host. Implementations are read-only and
/// safe to call concurrently for distinct requests.
#[async_trait]
pub trait Resolve: Send + Sync {
    /// Resolves `request` as imported from `from_dir` to an absolute
    /// location. Failures propagate to the caller; they are never swallowed
    /// into a "not restricted" answer.
    async fn resolve(&self, from_dir: &Path, request: &str) -> Result<PathBuf>;
}

/// Per-file resolution context handed to asynchronous deciders.
#[derive(Clone, Copy)]
pub struct ResolveContext<'a> {
    /// Directory of the file being scanned.
    pub from_dir: &'a Path,
    pub resolver: &'a dyn Resolve,
}

impl ResolveContext<'_> {
    pub async fn resolve(&self, request: &str) -> Result<PathBuf> {
        self.resolver.resolve(self.from_dir, request).await
    }
}

/// A decision that may consult the resolution context before it settles.
/// Implement this for custom host-aware deciders.
#[async_trait]
pub trait AsyncDecide: Send + Sync {
    async fn decide(&self, import_path: &str, ctx: &ResolveContext<'_>) -> Result<Decision>;
}

/// A decider usable in asynchronous evaluation. Synchronous deciders lift
/// into this form unchanged; function-form deciders may resolve paths
/// through the context.
pub enum AsyncDecider {
    Sync(Decider),
    Function(Box<dyn AsyncDecide>),
}

impl AsyncDecider {
    pub async fn decide(&self, import_path: &str, ctx: &ResolveContext<'_>) -> Result<Decision> {
        match self {
            AsyncDecider::Sync(decider) => Ok(decider.decide(import_path)),
            AsyncDecider::Function(f) => f.decide(import_path, ctx).await,
        }
    }
}

impl From<Decider> for AsyncDecider {
    fn from(decider: Decider) -> Self {
        AsyncDecider::Sync(decider)
    }
}

impl From<Regex> for AsyncDecider {
    fn from(re: Regex) -> Self {
        AsyncDecider::Sync(Decider::Pattern(re))
    }
}
