//! Root manifest discovery.
//!
//! Every YAML file under the stacks directory is a candidate stack root. The
//! configured `included_paths` and `excluded_paths` globs narrow the set: catalogs
//! and mixins are usually excluded because they only make sense when imported.
//!
//! Patterns are matched against the path relative to the stacks directory, both
//! with and without the file extension, so `orgs/**/*` and `orgs/**/*.yaml` select
//! the same files. `*` does not cross directory separators; use `**` for that.
//!
//! Symlinks are not followed.

use glob::{MatchOptions, Pattern};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::constants::MANIFEST_EXTENSIONS;
use crate::core::{FileOperation, FileOperationError, Result, StackError};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Compiled include and exclude globs.
#[derive(Debug, Clone)]
pub struct ManifestFilter {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl ManifestFilter {
    /// Compile the include and exclude globs.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::Pattern`] for the first invalid glob.
    pub fn new(included: &[String], excluded: &[String]) -> Result<Self> {
        Ok(Self {
            include: compile(included)?,
            exclude: compile(excluded)?,
        })
    }

    /// Whether a path relative to the stacks directory selects a root manifest.
    pub fn matches(&self, relative: &str) -> bool {
        let stem = strip_manifest_extension(relative);
        let hit = |pattern: &Pattern| {
            pattern.matches_with(relative, MATCH_OPTIONS) || pattern.matches_with(stem, MATCH_OPTIONS)
        };

        self.include.iter().any(hit) && !self.exclude.iter().any(hit)
    }
}

fn compile(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|e| StackError::Pattern {
                pattern: p.clone(),
                reason: e.to_string(),
            })
        })
        .collect()
}

/// Find root manifests under `base_dir`.
///
/// Returns paths relative to `base_dir`, sorted, so discovery order never depends
/// on directory iteration order.
///
/// # Errors
///
/// Any I/O error while walking the directory aborts discovery.
pub fn discover_manifests(base_dir: &Path, filter: &ManifestFilter) -> Result<Vec<PathBuf>> {
    debug!("Discovering stack manifests in {}", base_dir.display());

    let mut found = Vec::new();
    for entry in WalkDir::new(base_dir).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(base_dir).to_path_buf();
            FileOperationError::new(FileOperation::Walk, path, "discovering stack manifests", e.into())
        })?;

        if !entry.file_type().is_file() || !is_manifest_file(entry.path()) {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(base_dir) else {
            continue;
        };
        let relative_str = to_slash_path(relative);

        if filter.matches(&relative_str) {
            trace!("Selected manifest: {}", relative_str);
            found.push(relative.to_path_buf());
        } else {
            trace!("Skipped manifest: {}", relative_str);
        }
    }

    found.sort();
    debug!("Found {} stack manifests", found.len());
    Ok(found)
}

/// Identifier of the manifest at `path`: relative to `base_dir`, `/`-separated,
/// extension removed. `None` when `path` is outside `base_dir`.
pub fn manifest_id(base_dir: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(base_dir).ok()?;
    Some(strip_manifest_extension(&to_slash_path(relative)).to_string())
}

pub(crate) fn is_manifest_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| MANIFEST_EXTENSIONS.contains(&ext))
}

pub(crate) fn strip_manifest_extension(path: &str) -> &str {
    MANIFEST_EXTENSIONS
        .iter()
        .find_map(|ext| path.strip_suffix(ext).and_then(|rest| rest.strip_suffix('.')))
        .unwrap_or(path)
}

fn to_slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
