use anyhow::{Result, anyhow};
use ignore::WalkBuilder;
use log::{debug, trace};
use std::{
    env,
    path::{Path, PathBuf},
};

use oxirestrict_core::JS_TS_EXTENSIONS;

/// Collects the JavaScript/TypeScript files to scan beneath `root`.
///
/// The walk respects gitignore rules; test files (`*.test.*`, `*.spec.*`)
/// are skipped. Results are sorted so runs over the same tree report in the
/// same order.
pub fn collect_files(root: &Path) -> Result<Vec<PathBuf>> {
    debug!("Collecting files under {}", root.display());
    let mut files: Vec<PathBuf> = Vec::new();
    let walker = WalkBuilder::new(root).hidden(false).ignore(true).git_ignore(true).build();

    for res in walker {
        let dent = res?;
        let p = dent.path();
        if !p.is_file() {
            continue;
        }

        let path_str = p.to_string_lossy();
        if path_str.contains(".test.") || path_str.contains(".spec.") {
            trace!("Skipping test file: {}", path_str);
            continue;
        }

        if let Some(ext) = p.extension().and_then(|e| e.to_str())
            && JS_TS_EXTENSIONS.contains(&ext)
        {
            trace!("Collected file: {}", p.display());
            files.push(p.to_path_buf());
        }
    }

    files.sort();
    debug!("Collected {} files", files.len());
    Ok(files)
}

/// Walks upwards from the current directory until a `.git` directory shows
/// up.
pub fn find_git_root() -> Result<PathBuf> {
    debug!("Searching for git root");
    let mut current_dir = env::current_dir()?;

    loop {
        let git_dir = current_dir.join(".git");
        trace!("Checking for .git at: {:?}", git_dir);
        if git_dir.exists() {
            debug!("Found git root at: {:?}", current_dir);
            return Ok(current_dir);
        }

        match current_dir.parent() {
            Some(parent) => current_dir = parent.to_path_buf(),
            None => {
                return Err(anyhow!("Could not find .git directory in any parent folder"));
            }
        }
    }
}
