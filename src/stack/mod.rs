//! Stack resolution.
//!
//! [`StackResolver`] discovers root manifests under the stacks directory, loads
//! each one with its imports, merges the documents in order and processes the
//! components. The result is a [`ResolvedStacks`]: the resolved stack map, keyed by
//! root manifest identifier, plus the provenance of every key.
//!
//! # Modes
//!
//! When the requested stack token names a root manifest, only that manifest is
//! resolved ([`StackMode::Directory`]). Otherwise every root is resolved and the
//! token is matched against rendered stack names by [`find_stack`]
//! ([`StackMode::Logical`]).

pub mod locator;
pub mod processor;

pub use locator::{StackMatch, find_stack};
pub use processor::{ComponentSources, ProcessedComponents, process_components};

use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::constants::{COMPONENTS_SECTION, IMPORTS_SECTION};
use crate::core::{FileOperation, FileResultExt, Result, StackError};
use crate::manifest::{ManifestFilter, ManifestLoader, discover_manifests, manifest_id};
use crate::merge::{KeyPath, ProvenanceIndex, deep_merge_tracked};
use crate::value::{ConfigMap, ConfigValue};

/// How a stack token is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackMode {
    /// The token names a root manifest.
    Directory,
    /// The token is a logical name rendered from each stack's context.
    Logical,
}

/// Every resolved stack of one resolution.
#[derive(Debug, Clone)]
pub struct ResolvedStacks {
    pub mode: StackMode,
    /// `<root manifest> -> resolved stack`, with `components` processed and
    /// `imports` listing every imported manifest.
    pub stacks: ConfigMap,
    /// Contributors of every key of each stack's merged documents.
    pub provenance: BTreeMap<String, ProvenanceIndex>,
    pub component_sources: BTreeMap<String, ComponentSources>,
}

impl ResolvedStacks {
    /// Root manifest identifiers in sorted order.
    pub fn stack_names(&self) -> impl Iterator<Item = &str> {
        self.stacks.keys().map(String::as_str)
    }

    /// Provenance restricted to the key paths feeding one component.
    pub fn component_provenance(
        &self,
        stack: &str,
        component_type: &str,
        component: &str,
    ) -> ProvenanceIndex {
        let prefixes = self.source_prefixes(stack, component_type, component);
        self.provenance
            .get(stack)
            .map(|index| index.filtered(prefixes))
            .unwrap_or_default()
    }

    /// Key paths feeding one component, lowest precedence first.
    pub fn source_prefixes(&self, stack: &str, component_type: &str, component: &str) -> &[KeyPath] {
        self.component_sources
            .get(stack)
            .and_then(|types| types.get(component_type))
            .and_then(|components| components.get(component))
            .map_or(&[][..], Vec::as_slice)
    }
}

/// Discovers, loads and merges stack manifests.
#[derive(Debug, Clone)]
pub struct StackResolver {
    base_dir: PathBuf,
    filter: ManifestFilter,
    ignore_missing_files: bool,
}

impl StackResolver {
    /// Create a resolver for the manifests under `base_dir`.
    ///
    /// # Errors
    ///
    /// [`StackError::Pattern`] when an include or exclude glob is invalid.
    pub fn new(
        base_dir: impl Into<PathBuf>,
        included_paths: &[String],
        excluded_paths: &[String],
    ) -> Result<Self> {
        Ok(Self {
            base_dir: base_dir.into(),
            filter: ManifestFilter::new(included_paths, excluded_paths)?,
            ignore_missing_files: false,
        })
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        Ok(Self::new(
            config.stacks_base_dir(),
            &config.stacks.included_paths,
            &config.stacks.excluded_paths,
        )?
        .ignore_missing_files(config.ignore_missing_files))
    }

    /// Skip imports that match no manifest instead of failing.
    #[must_use]
    pub fn ignore_missing_files(mut self, ignore: bool) -> Self {
        self.ignore_missing_files = ignore;
        self
    }

    /// Root manifests as `(identifier, absolute path)`, sorted by identifier.
    ///
    /// # Errors
    ///
    /// File errors when the stacks directory cannot be read.
    pub fn discover(&self) -> Result<Vec<(String, PathBuf)>> {
        let base = self.canonical_base()?;
        let roots = discover_manifests(&base, &self.filter)?
            .into_iter()
            .filter_map(|relative| {
                let path = base.join(relative);
                manifest_id(&base, &path).map(|id| (id, path))
            })
            .collect();
        Ok(roots)
    }

    /// Resolve the stacks needed to look up `stack_token`, or every stack.
    ///
    /// # Errors
    ///
    /// Any error loading, merging or processing a selected manifest.
    pub fn resolve(&self, stack_token: Option<&str>) -> Result<ResolvedStacks> {
        let base = self.canonical_base()?;
        let roots = self.discover()?;

        let (mode, selected): (StackMode, Vec<(String, PathBuf)>) = match stack_token
            .and_then(|token| roots.iter().find(|(id, _)| id == token))
        {
            Some(root) => (StackMode::Directory, vec![root.clone()]),
            None => (StackMode::Logical, roots),
        };
        info!("Resolving {} stack manifest(s) in {:?} mode", selected.len(), mode);

        let mut loader = ManifestLoader::new(&base, self.ignore_missing_files);
        let mut resolved = ResolvedStacks {
            mode,
            stacks: ConfigMap::new(),
            provenance: BTreeMap::new(),
            component_sources: BTreeMap::new(),
        };

        for (id, path) in selected {
            let loaded = loader.load_stack(&id, &path)?;
            debug!("Stack '{}' merges {} document(s)", id, loaded.documents.len());

            let mut merged = ConfigMap::new();
            let mut provenance = ProvenanceIndex::new();
            for document in &loaded.documents {
                let manifest = loader.manifest(document).ok_or_else(|| StackError::ImportResolution {
                    import: document.clone(),
                    importer: id.clone(),
                    reason: "manifest was not loaded".to_string(),
                })?;
                deep_merge_tracked(&mut merged, &manifest.content, document, &mut provenance);
            }

            let processed = process_components(&merged, &id)?;
            if merged.contains_key(COMPONENTS_SECTION) {
                merged.insert(
                    COMPONENTS_SECTION.to_string(),
                    ConfigValue::Mapping(processed.components),
                );
            }
            merged.insert(IMPORTS_SECTION.to_string(), loaded.imports.into());

            resolved.stacks.insert(id.clone(), ConfigValue::Mapping(merged));
            resolved.provenance.insert(id.clone(), provenance);
            resolved.component_sources.insert(id, processed.sources);
        }

        Ok(resolved)
    }

    fn canonical_base(&self) -> Result<PathBuf> {
        Ok(self.base_dir.canonicalize().with_file_context(
            FileOperation::Canonicalize,
            &self.base_dir,
            "locating the stacks directory",
        )?)
    }
}

/// Resolve the stacks configured in `config`.
pub fn resolve_stacks(config: &EngineConfig, stack_token: Option<&str>) -> Result<ResolvedStacks> {
    StackResolver::from_config(config)?.resolve(stack_token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(dir: &Path, relative: &str, content: &str) {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn resolver(dir: &Path) -> StackResolver {
        StackResolver::new(dir, &["orgs/**/*".to_string()], &["**/_defaults*".to_string()])
            .unwrap()
    }

    #[test]
    fn test_import_precedence() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "catalog/a.yaml", "vars: {x: a, from_a: true}\n");
        write(temp.path(), "catalog/b.yaml", "vars: {x: b}\n");
        write(
            temp.path(),
            "orgs/dev.yaml",
            "import: [catalog/a, catalog/b]\ncomponents:\n  terraform:\n    vpc: {}\n",
        );

        let resolved = resolver(temp.path()).resolve(None).unwrap();
        assert_eq!(resolved.mode, StackMode::Logical);

        let stack = resolved.stacks["orgs/dev"].as_mapping().unwrap();
        let vars = stack["vars"].as_mapping().unwrap();
        assert_eq!(vars["x"], ConfigValue::from("b"));
        assert_eq!(stack["imports"].string_list(), vec!["catalog/a", "catalog/b"]);

        let vpc_vars = stack["components"]
            .get_path(&["terraform", "vpc", "vars"])
            .and_then(ConfigValue::as_mapping)
            .unwrap();
        assert_eq!(vpc_vars["x"], ConfigValue::from("b"));
        assert_eq!(vpc_vars["from_a"], ConfigValue::Bool(true));
    }

    #[test]
    fn test_directory_mode_resolves_one_root() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "orgs/dev.yaml", "vars: {stage: dev}\n");
        write(temp.path(), "orgs/prod.yaml", "vars: {stage: prod}\n");
        write(temp.path(), "orgs/_defaults.yaml", "vars: {}\n");

        let resolver = resolver(temp.path());
        let ids: Vec<String> = resolver.discover().unwrap().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["orgs/dev", "orgs/prod"]);

        let resolved = resolver.resolve(Some("orgs/prod")).unwrap();
        assert_eq!(resolved.mode, StackMode::Directory);
        assert_eq!(resolved.stack_names().collect::<Vec<_>>(), vec!["orgs/prod"]);
    }

    #[test]
    fn test_component_provenance_is_filtered() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "catalog/vpc.yaml", "components: {terraform: {vpc: {vars: {cidr: x}}}}\n");
        write(temp.path(), "catalog/eks.yaml", "components: {terraform: {eks: {vars: {size: 3}}}}\n");
        write(temp.path(), "orgs/dev.yaml", "import: [catalog/vpc, catalog/eks]\nvars: {stage: dev}\n");

        let resolved = resolver(temp.path()).resolve(None).unwrap();
        let provenance = resolved.component_provenance("orgs/dev", "terraform", "vpc");
        let sources: Vec<&str> = provenance
            .iter()
            .flat_map(|(_, files)| files.iter().map(String::as_str))
            .collect();
        assert!(sources.contains(&"catalog/vpc"));
        assert!(sources.contains(&"orgs/dev"));
        assert!(!sources.contains(&"catalog/eks"));
    }

    #[test]
    fn test_missing_base_dir_is_file_error() {
        let temp = TempDir::new().unwrap();
        let err = resolver(&temp.path().join("missing")).resolve(None).unwrap_err();
        assert!(matches!(err, StackError::File(_)));
    }
}
