//! Deep merge of stack documents.
//!
//! # Merge policy
//!
//! - Mappings merge key by key, recursively.
//! - Scalars, sequences and `null` replace the previous value wholly. Sequences are
//!   never concatenated, so merging the same document twice is a no-op.
//! - A mapping replaced by a non-mapping loses its keys, and their provenance.
//!
//! Precedence is positional: the later document wins.

pub mod provenance;

pub use provenance::{KeyPath, ProvenanceIndex};

use crate::value::{ConfigMap, ConfigValue};

/// Merge `source` into `target`, recording `source_id` as a contributor of every
/// key path it sets.
pub fn deep_merge_tracked(
    target: &mut ConfigMap,
    source: &ConfigMap,
    source_id: &str,
    provenance: &mut ProvenanceIndex,
) {
    merge_at(target, source, &KeyPath::root(), source_id, provenance);
}

fn merge_at(
    target: &mut ConfigMap,
    source: &ConfigMap,
    prefix: &KeyPath,
    source_id: &str,
    provenance: &mut ProvenanceIndex,
) {
    for (key, value) in source {
        let path = prefix.child(key);
        provenance.record(path.clone(), source_id);

        match value {
            ConfigValue::Mapping(incoming) => {
                let slot = target
                    .entry(key.clone())
                    .or_insert_with(|| ConfigValue::Mapping(ConfigMap::new()));
                if !matches!(slot, ConfigValue::Mapping(_)) {
                    *slot = ConfigValue::Mapping(ConfigMap::new());
                }
                if let ConfigValue::Mapping(existing) = slot {
                    merge_at(existing, incoming, &path, source_id, provenance);
                }
            }
            other => {
                if matches!(target.get(key), Some(ConfigValue::Mapping(_))) {
                    provenance.remove_descendants(&path);
                }
                target.insert(key.clone(), other.clone());
            }
        }
    }
}

/// Merge `source` into `target` without provenance.
pub fn deep_merge(target: &mut ConfigMap, source: &ConfigMap) {
    for (key, value) in source {
        match (target.get_mut(key), value) {
            (Some(ConfigValue::Mapping(existing)), ConfigValue::Mapping(incoming)) => {
                deep_merge(existing, incoming);
            }
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Merge mappings front to back into a new mapping.
pub fn merge_all<'a>(layers: impl IntoIterator<Item = &'a ConfigMap>) -> ConfigMap {
    let mut merged = ConfigMap::new();
    for layer in layers {
        deep_merge(&mut merged, layer);
    }
    merged
}
