//! Import resolution.
//!
//! [`ManifestLoader`] turns a root manifest into the ordered list of documents that
//! make up its stack. Imports are resolved depth first and emitted post-order: a
//! manifest's imports come before the manifest itself, in the order they are listed.
//! Merging that list front to back gives the importer precedence over everything it
//! imports, and a later import precedence over an earlier one.
//!
//! A manifest imported along two paths appears twice in the list, once per path,
//! so precedence stays positional.
//!
//! # Import specifiers
//!
//! - Paths are relative to the stacks directory.
//! - The extension is optional; `.yaml` is tried before `.yml`.
//! - Glob specifiers (`mixins/region/*`) expand to every matching manifest, sorted.
//! - A specifier that matches nothing is an [`StackError::ImportResolution`] error,
//!   unless `ignore_missing_files` is set, in which case it is skipped with a warning.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

use super::Manifest;
use super::discovery::{is_manifest_file, manifest_id, strip_manifest_extension};
use super::import_graph::ImportGraph;
use crate::constants::MANIFEST_EXTENSIONS;
use crate::core::{Result, StackError};

/// The documents contributing to one root manifest.
#[derive(Debug, Clone)]
pub struct LoadedStack {
    /// Identifier of the root manifest.
    pub root: String,
    /// Manifest identifiers in merge order; the root is last.
    pub documents: Vec<String>,
    /// Every manifest the root imports directly or transitively, sorted.
    pub imports: Vec<String>,
}

/// Loads manifests on demand and caches them for the lifetime of one resolution.
#[derive(Debug)]
pub struct ManifestLoader {
    base_dir: PathBuf,
    ignore_missing_files: bool,
    manifests: BTreeMap<String, Manifest>,
    resolved_imports: BTreeMap<String, Vec<String>>,
}

impl ManifestLoader {
    /// Create a loader for manifests under `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>, ignore_missing_files: bool) -> Self {
        Self {
            base_dir: base_dir.into(),
            ignore_missing_files,
            manifests: BTreeMap::new(),
            resolved_imports: BTreeMap::new(),
        }
    }

    /// A manifest loaded by a previous call, if any.
    pub fn manifest(&self, id: &str) -> Option<&Manifest> {
        self.manifests.get(id)
    }

    /// Load the root manifest `root` and everything it imports.
    ///
    /// # Errors
    ///
    /// - [`StackError::ImportResolution`] for unresolvable imports and import cycles
    /// - [`StackError::Merge`] for manifests that are not valid YAML mappings
    /// - [`StackError::File`] for I/O failures
    pub fn load_stack(&mut self, root: &str, root_path: &Path) -> Result<LoadedStack> {
        debug!("Loading stack manifest '{}'", root);
        self.load_manifest(root, root_path)?;

        let mut graph = ImportGraph::new();
        graph.ensure_node(root);
        let mut visited = BTreeSet::from([root.to_string()]);
        let mut pending = vec![root.to_string()];
        while let Some(id) = pending.pop() {
            for imported in self.imports_of(&id)? {
                trace!("Import edge: {} -> {}", id, imported);
                graph.add_import(&id, &imported);
                if visited.insert(imported.clone()) {
                    if !self.manifests.contains_key(&imported) {
                        let path = self.manifest_path(&imported)?;
                        self.load_manifest(&imported, &path)?;
                    }
                    pending.push(imported);
                }
            }
        }

        if let Some(cycle) = graph.find_cycle() {
            let importer = cycle.iter().rev().nth(1).cloned().unwrap_or_else(|| root.to_string());
            let import = cycle.last().cloned().unwrap_or_default();
            return Err(StackError::ImportResolution {
                import,
                importer,
                reason: format!("Circular import detected: {}", cycle.join(" -> ")),
            });
        }

        let mut documents = Vec::new();
        self.collect_post_order(root, &mut documents);

        Ok(LoadedStack {
            root: root.to_string(),
            documents,
            imports: graph.transitive_imports(root).into_iter().collect(),
        })
    }

    fn collect_post_order(&self, id: &str, out: &mut Vec<String>) {
        if let Some(imports) = self.resolved_imports.get(id) {
            for imported in imports {
                self.collect_post_order(imported, out);
            }
        }
        out.push(id.to_string());
    }

    fn load_manifest(&mut self, id: &str, path: &Path) -> Result<()> {
        if !self.manifests.contains_key(id) {
            trace!("Parsing manifest {}", path.display());
            let manifest = Manifest::load(id, path)?;
            self.manifests.insert(id.to_string(), manifest);
        }
        Ok(())
    }

    /// Resolved import identifiers of a loaded manifest, computed once.
    fn imports_of(&mut self, id: &str) -> Result<Vec<String>> {
        if let Some(resolved) = self.resolved_imports.get(id) {
            return Ok(resolved.clone());
        }

        let specifiers = self.manifests.get(id).map(|m| m.imports.clone()).unwrap_or_default();
        let mut resolved = Vec::new();
        for specifier in &specifiers {
            resolved.extend(self.resolve_specifier(id, specifier)?);
        }

        self.resolved_imports.insert(id.to_string(), resolved.clone());
        Ok(resolved)
    }

    fn resolve_specifier(&self, importer: &str, specifier: &str) -> Result<Vec<String>> {
        let specifier = specifier.trim().trim_start_matches("./");
        let matches = if is_glob(specifier) {
            self.expand_glob(importer, specifier)?
        } else {
            self.candidate_paths(specifier)
                .into_iter()
                .find(|path| path.is_file())
                .into_iter()
                .collect()
        };

        let ids: Vec<String> =
            matches.iter().filter_map(|path| manifest_id(&self.base_dir, path)).collect();

        if ids.is_empty() {
            if self.ignore_missing_files {
                warn!("Skipping missing import '{}' in the stack manifest '{}'", specifier, importer);
                return Ok(Vec::new());
            }
            return Err(StackError::ImportResolution {
                import: specifier.to_string(),
                importer: importer.to_string(),
                reason: format!("no manifest matches under {}", self.base_dir.display()),
            });
        }

        Ok(ids)
    }

    fn candidate_paths(&self, specifier: &str) -> Vec<PathBuf> {
        if strip_manifest_extension(specifier) == specifier {
            MANIFEST_EXTENSIONS
                .iter()
                .map(|ext| self.base_dir.join(format!("{specifier}.{ext}")))
                .collect()
        } else {
            vec![self.base_dir.join(specifier)]
        }
    }

    fn expand_glob(&self, importer: &str, specifier: &str) -> Result<Vec<PathBuf>> {
        let base = glob::Pattern::escape(&self.base_dir.to_string_lossy());
        let patterns: Vec<String> = if strip_manifest_extension(specifier) == specifier {
            MANIFEST_EXTENSIONS.iter().map(|ext| format!("{base}/{specifier}.{ext}")).collect()
        } else {
            vec![format!("{base}/{specifier}")]
        };

        let mut found = Vec::new();
        for pattern in &patterns {
            let paths = glob::glob(pattern).map_err(|e| StackError::Pattern {
                pattern: specifier.to_string(),
                reason: e.to_string(),
            })?;
            for entry in paths {
                let path = entry.map_err(|e| StackError::ImportResolution {
                    import: specifier.to_string(),
                    importer: importer.to_string(),
                    reason: e.to_string(),
                })?;
                if path.is_file() && is_manifest_file(&path) {
                    found.push(path);
                }
            }
        }

        found.sort();
        found.dedup();
        Ok(found)
    }

    fn manifest_path(&self, id: &str) -> Result<PathBuf> {
        self.candidate_paths(id).into_iter().find(|path| path.is_file()).ok_or_else(|| {
            StackError::ImportResolution {
                import: id.to_string(),
                importer: id.to_string(),
                reason: "the manifest disappeared while loading".to_string(),
            }
        })
    }
}

fn is_glob(specifier: &str) -> bool {
    specifier.contains(['*', '?', '['])
}
