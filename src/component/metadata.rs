//! Component classification: abstract flag, base component and module path.

use crate::constants::{ABSTRACT_COMPONENT_TYPE, COMPONENT_SECTION, METADATA_SECTION};
use crate::value::{ConfigMap, ConfigMapExt, ConfigValue};

/// What a component's `metadata` and `component` attribute say about it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    /// The component's own `metadata` section.
    pub metadata: ConfigMap,
    /// Component whose module this component deploys. Empty when it deploys its own.
    pub base_component: String,
    /// `metadata.type: abstract`; such components are templates only.
    pub is_abstract: bool,
}

/// Classify a component section.
///
/// The base component comes from the `component` attribute, overridden by
/// `metadata.component`. A base naming the component itself is no base.
pub fn classify_component(component: &str, section: &ConfigMap) -> Classification {
    let metadata = section.mapping_or_empty(METADATA_SECTION);

    let mut base_component = section.string_or_empty(COMPONENT_SECTION);
    if let Some(from_metadata) = metadata.get(COMPONENT_SECTION).and_then(ConfigValue::as_str)
        && !from_metadata.is_empty()
    {
        base_component = from_metadata.to_string();
    }
    if base_component == component {
        base_component.clear();
    }

    let is_abstract =
        metadata.get("type").and_then(ConfigValue::as_str) == Some(ABSTRACT_COMPONENT_TYPE);

    Classification {
        metadata,
        base_component,
        is_abstract,
    }
}

/// A component name split on `/` into folder prefix and module directory name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentPath {
    /// Everything before the last `/`, empty when there is none.
    pub folder_prefix: String,
    /// The last path segment: the actual module directory.
    pub leaf: String,
}

impl ComponentPath {
    pub fn split(name: &str) -> Self {
        match name.rsplit_once('/') {
            Some((prefix, leaf)) => Self {
                folder_prefix: prefix.to_string(),
                leaf: leaf.to_string(),
            },
            None => Self {
                folder_prefix: String::new(),
                leaf: name.to_string(),
            },
        }
    }
}

/// The module a component deploys, and where it lives under the tool base path.
///
/// The folder prefix comes from the base component when there is one, otherwise
/// from the component itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleLocation {
    /// Base component name, or the component name when there is no base.
    pub final_component: String,
    pub folder_prefix: String,
    /// Module directory name.
    pub leaf: String,
}

impl ModuleLocation {
    pub fn new(component: &str, base_component: &str) -> Self {
        let final_component = if base_component.is_empty() { component } else { base_component };
        let ComponentPath { folder_prefix, leaf } = ComponentPath::split(final_component);
        Self {
            final_component: final_component.to_string(),
            folder_prefix,
            leaf,
        }
    }

    /// `<base_path>/<tool_base_path>/<folder_prefix>/<leaf>`, skipping empty and `.` parts.
    pub fn module_path(&self, base_path: &str, tool_base_path: &str) -> String {
        let joined = [base_path, tool_base_path, &self.folder_prefix, &self.leaf]
            .iter()
            .flat_map(|part| part.split('/'))
            .filter(|part| !part.is_empty() && *part != ".")
            .collect::<Vec<_>>()
            .join("/");

        if base_path.starts_with('/') { format!("/{joined}") } else { joined }
    }
}
