use anyhow::{Result, anyhow};
use async_trait::async_trait;
use dashmap::DashMap;
use log::{debug, trace};
use path_clean::PathClean;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::constants::{INDEX_FILES, RESOLVE_EXTENSIONS};
use crate::decider::Resolve;

/// Node-style filesystem resolver for hosts that bring no resolver of their
/// own (the CLI, tests).
///
/// Relative requests are cleaned lexically and probed through the
/// extension/index ladder; bare specifiers walk ancestor `node_modules`
/// directories, honoring package.json `exports`, `module` and `main`. A
/// request that resolves to nothing is an error, since unresolved requests
/// must surface rather than vanish. Results are cached per (directory,
/// request) pair; the cache is safe to share across concurrent scans.
#[derive(Default)]
pub struct FsResolver {
    cache: DashMap<(PathBuf, String), PathBuf>,
}

impl FsResolver {
    pub fn new() -> Self {
        Self::default()
    }

    fn resolve_from(&self, from_dir: &Path, request: &str) -> Result<PathBuf> {
        let key = (from_dir.to_path_buf(), request.to_string());
        if let Some(hit) = self.cache.get(&key) {
            trace!("Cache hit for resolve: '{}' from {}", request, from_dir.display());
            return Ok(hit.clone());
        }

        let resolved = if request.starts_with("./")
            || request.starts_with("../")
            || request.starts_with('/')
        {
            trace!("Resolving as relative request: '{}'", request);
            resolve_file(&from_dir.join(request).clean())
        } else {
            trace!("Resolving as node_modules package: '{}'", request);
            resolve_node_module_from_dir(from_dir, request)
        }
        .ok_or_else(|| anyhow!("cannot resolve \"{}\" from {}", request, from_dir.display()))?;

        debug!("Resolved '{}' to {}", request, resolved.display());
        self.cache.insert(key, resolved.clone());
        Ok(resolved)
    }
}

#[async_trait]
impl Resolve for FsResolver {
    async fn resolve(&self, from_dir: &Path, request: &str) -> Result<PathBuf> {
        self.resolve_from(from_dir, request)
    }
}

fn resolve_file(p: &Path) -> Option<PathBuf> {
    if p.is_file() {
        return Some(p.canonicalize().unwrap_or_else(|_| p.to_path_buf()));
    }

    for ext in RESOLVE_EXTENSIONS {
        let candidate = PathBuf::from(format!("{}.{}", p.display(), ext));
        if candidate.is_file() {
            return Some(candidate.canonicalize().unwrap_or(candidate));
        }
    }

    for index_file in INDEX_FILES {
        let candidate = p.join(index_file);
        if candidate.is_file() {
            return Some(candidate.canonicalize().unwrap_or(candidate));
        }
    }

    None
}

fn resolve_node_module_from_dir(start_dir: &Path, pkg: &str) -> Option<PathBuf> {
    trace!("Walking up from {:?} to find node_modules for '{}'", start_dir, pkg);
    let mut current_dir = Some(start_dir);

    while let Some(dir) = current_dir {
        if let Some(result) = resolve_node_module(dir, pkg) {
            return Some(result);
        }
        current_dir = dir.parent();
    }

    None
}

fn resolve_node_module(root: &Path, pkg: &str) -> Option<PathBuf> {
    // Scoped packages like @scope/pkg join into nested directories as-is.
    let nm = root.join("node_modules").join(pkg);
    if !nm.exists() {
        return None;
    }
    trace!("Checking node_modules at: {:?}", nm);

    let pkg_json = nm.join("package.json");
    if pkg_json.is_file()
        && let Ok(txt) = fs::read_to_string(&pkg_json)
        && let Ok(manifest) = serde_json::from_str::<serde_json::Value>(&txt)
    {
        if let Some(entry) = package_entry(&manifest) {
            let p = nm.join(entry.trim_start_matches("./"));
            if let Some(resolved) = resolve_file(&p) {
                return Some(resolved);
            }
        }
    }

    for index_file in INDEX_FILES {
        let candidate = nm.join(index_file);
        if candidate.is_file() {
            return Some(candidate.canonicalize().unwrap_or(candidate));
        }
    }

    None
}

/// Picks the package entry point: `exports` (string, or the "." entry with
/// import/require/default conditions), then `module`, then `main`.
fn package_entry(manifest: &serde_json::Value) -> Option<&str> {
    if let Some(exports) = manifest.get("exports") {
        if let Some(s) = exports.as_str() {
            return Some(s);
        }
        if let Some(dot) = exports.get(".") {
            if let Some(s) = dot.as_str() {
                return Some(s);
            }
            for condition in ["import", "require", "default"] {
                if let Some(s) = dot.get(condition).and_then(|c| c.as_str()) {
                    return Some(s);
                }
            }
        }
    }

    for field in ["module", "main"] {
        if let Some(s) = manifest.get(field).and_then(|f| f.as_str()) {
            return Some(s);
        }
    }

    None
}
