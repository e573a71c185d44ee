//! Dependency extraction from provenance.
//!
//! A component depends on every manifest that contributed to its resolved
//! configuration. Build caches use these lists as invalidation keys, so both lists
//! are sorted and deduplicated.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::constants::COMPONENTS_SECTION;
use crate::merge::{KeyPath, ProvenanceIndex};
use crate::value::ConfigMap;

/// Manifests a component's configuration depends on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DependencySet {
    /// The first contributor of each key path.
    pub direct: Vec<String>,
    /// Every contributor of every key path, plus the stack's own manifest.
    pub transitive: Vec<String>,
}

/// Extract direct and transitive dependencies from provenance entries.
pub fn extract_dependencies(
    current_stack_file: &str,
    provenance: &ProvenanceIndex,
) -> DependencySet {
    let mut direct = BTreeSet::new();
    let mut transitive = BTreeSet::new();

    for (_, sources) in provenance.iter() {
        if let Some(first) = sources.first() {
            direct.insert(first.clone());
        }
        transitive.extend(sources.iter().cloned());
    }
    transitive.insert(current_stack_file.to_string());

    DependencySet {
        direct: direct.into_iter().collect(),
        transitive: transitive.into_iter().collect(),
    }
}

/// Contributors per key of one section (`vars`, `settings`, `env`), across the
/// component's source prefixes.
///
/// A prefix naming the section itself (`vars`, `terraform.vars`) contributes its
/// direct children; a component prefix (`components.terraform.vpc`) contributes the
/// children of its `section` key.
pub fn section_sources(
    provenance: &ProvenanceIndex,
    source_prefixes: &[KeyPath],
    section: &str,
) -> ConfigMap {
    let mut sources: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for prefix in source_prefixes {
        let section_path = if prefix.last() == Some(section) {
            prefix.clone()
        } else if prefix.segments().first().map(String::as_str) == Some(COMPONENTS_SECTION) {
            prefix.child(section)
        } else {
            continue;
        };

        for (path, files) in provenance.iter() {
            if path.len() != section_path.len() + 1 || !path.starts_with(&section_path) {
                continue;
            }
            let Some(key) = path.last() else { continue };
            let entry = sources.entry(key.to_string()).or_default();
            for file in files {
                if !entry.contains(file) {
                    entry.push(file.clone());
                }
            }
        }
    }

    sources.into_iter().map(|(key, files)| (key, files.into())).collect()
}
