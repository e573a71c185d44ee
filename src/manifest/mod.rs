//! Stack manifest loading.
//!
//! A manifest is one YAML file under the stacks directory. It contributes sections
//! (`vars`, `settings`, `components`, ...) to every stack that imports it, and lists
//! the manifests it imports itself under `import:`.
//!
//! Manifests are identified by their path relative to the stacks directory, with
//! `/` separators and without the file extension (`orgs/acme/plat/dev/us-east-2`).
//! The same identifier is used in `import:` entries, provenance records and
//! dependency lists, which keeps all three platform independent.
//!
//! # Modules
//!
//! - [`discovery`] finds root manifests with include and exclude globs
//! - [`import_graph`] tracks import edges and detects cycles
//! - [`loader`] resolves `import:` entries into an ordered document list per root

pub mod discovery;
pub mod import_graph;
pub mod loader;

pub use discovery::{ManifestFilter, discover_manifests, manifest_id};
pub use import_graph::ImportGraph;
pub use loader::{LoadedStack, ManifestLoader};

use std::path::{Path, PathBuf};

use crate::constants::IMPORT_SECTION;
use crate::core::{FileOperation, FileResultExt, Result, StackError};
use crate::value::{ConfigMap, ConfigValue, parse_yaml};

/// A parsed stack manifest. Immutable once parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    /// Identifier relative to the stacks directory, without extension.
    pub id: String,
    /// Location on disk.
    pub path: PathBuf,
    /// Sections of the document, with `import` removed.
    pub content: ConfigMap,
    /// Import specifiers as written. Entries may be globs.
    pub imports: Vec<String>,
}

impl Manifest {
    /// Read and parse a manifest from disk.
    pub fn load(id: impl Into<String>, path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_file_context(
            FileOperation::Read,
            path,
            "loading stack manifest",
        )?;
        Self::parse(id, path, &text)
    }

    /// Parse manifest text.
    ///
    /// An empty document is an empty manifest. Any other non-mapping root, or an
    /// `import` that is not a string or a list of strings, is a [`StackError::Merge`].
    pub fn parse(id: impl Into<String>, path: &Path, text: &str) -> Result<Self> {
        let id = id.into();
        let merge_error = |reason: String| StackError::Merge {
            file: path.display().to_string(),
            reason,
        };

        let mut content = match parse_yaml(text).map_err(|e| merge_error(e.to_string()))? {
            ConfigValue::Null => ConfigMap::new(),
            ConfigValue::Mapping(map) => map,
            other => {
                return Err(merge_error(format!(
                    "the document root must be a mapping, found a {}",
                    other.kind()
                )));
            }
        };

        let imports = match content.remove(IMPORT_SECTION) {
            None | Some(ConfigValue::Null) => Vec::new(),
            Some(ConfigValue::String(single)) => vec![single],
            Some(ConfigValue::Sequence(items)) => items
                .into_iter()
                .map(|item| match item {
                    ConfigValue::String(s) => Ok(s),
                    other => Err(merge_error(format!(
                        "'import' entries must be strings, found a {}",
                        other.kind()
                    ))),
                })
                .collect::<Result<Vec<_>>>()?,
            Some(other) => {
                return Err(merge_error(format!(
                    "'import' must be a list of manifest paths, found a {}",
                    other.kind()
                )));
            }
        };

        Ok(Self {
            id,
            path: path.to_path_buf(),
            content,
            imports,
        })
    }
}
