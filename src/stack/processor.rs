//! Per-stack component processing.
//!
//! After a stack's documents are merged, every component under
//! `components.<type>` is rebuilt from its layers, lowest precedence first:
//!
//! 1. global `vars`, `settings` and `env`
//! 2. the type-level section (`terraform.vars`, `terraform.backend`, ...)
//! 3. ancestor components, furthest first
//! 4. the component itself
//!
//! Type-level and component-level `overrides` are applied last.
//!
//! Ancestors come from the `component` attribute, when it names a component
//! defined in the same stack, followed by `metadata.inherits` in listed order.
//! `metadata` is never inherited.

use std::collections::BTreeMap;
use tracing::trace;

use crate::constants::{
    BACKEND_SECTION, BACKEND_TYPE_SECTION, COMMAND_SECTION, COMPONENT_SECTION,
    COMPONENTS_SECTION, ENV_SECTION, INHERITANCE_SECTION, INHERITS_SECTION, METADATA_SECTION,
    OVERRIDES_SECTION, SETTINGS_SECTION, VARS_SECTION,
};
use crate::core::{Result, StackError};
use crate::merge::{KeyPath, deep_merge, merge_all};
use crate::value::{ConfigMap, ConfigMapExt, ConfigValue};

/// Sections every component receives from the global and type-level layers.
const LAYERED_SECTIONS: [&str; 3] = [VARS_SECTION, SETTINGS_SECTION, ENV_SECTION];

/// Type-level sections that feed a component.
const TYPE_SECTIONS: [&str; 7] = [
    VARS_SECTION,
    SETTINGS_SECTION,
    ENV_SECTION,
    BACKEND_TYPE_SECTION,
    BACKEND_SECTION,
    OVERRIDES_SECTION,
    COMMAND_SECTION,
];

/// Key paths, per component type and component, whose provenance feeds the component.
pub type ComponentSources = BTreeMap<String, BTreeMap<String, Vec<KeyPath>>>;

/// Components of one stack after processing.
#[derive(Debug, Clone, Default)]
pub struct ProcessedComponents {
    /// `<type> -> <component> -> section`.
    pub components: ConfigMap,
    pub sources: ComponentSources,
}

/// Process every component of a merged stack.
///
/// # Errors
///
/// [`StackError::Structure`] when a section has the wrong shape, an inherited
/// component is not defined, or components inherit from each other in a cycle.
pub fn process_components(merged: &ConfigMap, stack_file: &str) -> Result<ProcessedComponents> {
    let mut processed = ProcessedComponents::default();

    let components = match merged.get(COMPONENTS_SECTION) {
        None | Some(ConfigValue::Null) => return Ok(processed),
        Some(ConfigValue::Mapping(components)) => components,
        Some(other) => {
            return Err(StackError::structure(format!(
                "'components' section in the stack file '{stack_file}' must be a mapping, found a {}",
                other.kind()
            )));
        }
    };

    let globals = Layer::read(merged, &LAYERED_SECTIONS, "", stack_file)?;

    for (component_type, type_components) in components {
        let type_components = match type_components {
            ConfigValue::Null => continue,
            ConfigValue::Mapping(map) => map,
            other => {
                return Err(StackError::structure(format!(
                    "'components/{component_type}' section in the stack file '{stack_file}' must be a mapping, found a {}",
                    other.kind()
                )));
            }
        };

        let type_layer = match merged.get(component_type) {
            None | Some(ConfigValue::Null) => Layer::default(),
            Some(ConfigValue::Mapping(section)) => {
                Layer::read(section, &TYPE_SECTIONS, component_type, stack_file)?
            }
            Some(other) => {
                return Err(StackError::structure(format!(
                    "'{component_type}' section in the stack file '{stack_file}' must be a mapping, found a {}",
                    other.kind()
                )));
            }
        };

        let mut type_output = ConfigMap::new();
        let mut type_sources = BTreeMap::new();

        for name in type_components.keys() {
            let ancestors =
                resolve_ancestors(name, type_components, component_type, stack_file)?;
            trace!(
                "Component '{}/{}' in '{}' inherits from {:?}",
                component_type, name, stack_file, ancestors
            );

            let section = build_component(
                name,
                type_components,
                &ancestors,
                &globals,
                &type_layer,
                stack_file,
            )?;

            let mut prefixes: Vec<KeyPath> = LAYERED_SECTIONS
                .iter()
                .map(|section| KeyPath::new([*section]))
                .collect();
            prefixes.extend(
                TYPE_SECTIONS
                    .iter()
                    .map(|section| KeyPath::new([component_type.as_str(), *section])),
            );
            for component in ancestors.iter().chain(std::iter::once(name)) {
                let prefix =
                    KeyPath::new([COMPONENTS_SECTION, component_type.as_str(), component.as_str()]);
                if !prefixes.contains(&prefix) {
                    prefixes.push(prefix);
                }
            }

            type_output.insert(name.clone(), ConfigValue::Mapping(section));
            type_sources.insert(name.clone(), prefixes);
        }

        processed.components.insert(component_type.clone(), ConfigValue::Mapping(type_output));
        processed.sources.insert(component_type.clone(), type_sources);
    }

    Ok(processed)
}

/// Sections read from one level of the stack, absent ones left empty.
#[derive(Debug, Default)]
struct Layer {
    sections: BTreeMap<&'static str, ConfigMap>,
    backend_type: String,
    command: String,
    has_vars: bool,
}

impl Layer {
    fn read(
        source: &ConfigMap,
        names: &[&'static str],
        scope: &str,
        stack_file: &str,
    ) -> Result<Self> {
        let mut layer = Self::default();
        for &name in names {
            match (name, source.get(name)) {
                (_, None | Some(ConfigValue::Null)) => {}
                (BACKEND_TYPE_SECTION, Some(value)) => {
                    layer.backend_type = value.scalar_to_string().unwrap_or_default();
                }
                (COMMAND_SECTION, Some(value)) => {
                    layer.command = value.scalar_to_string().unwrap_or_default();
                }
                (_, Some(ConfigValue::Mapping(map))) => {
                    layer.has_vars |= name == VARS_SECTION;
                    layer.sections.insert(name, map.clone());
                }
                (_, Some(other)) => {
                    let location = if scope.is_empty() {
                        format!("'{name}'")
                    } else {
                        format!("'{scope}/{name}'")
                    };
                    return Err(StackError::structure(format!(
                        "{location} section in the stack file '{stack_file}' must be a mapping, found a {}",
                        other.kind()
                    )));
                }
            }
        }
        Ok(layer)
    }

    fn section(&self, name: &str) -> &ConfigMap {
        static EMPTY: ConfigMap = ConfigMap::new();
        self.sections.get(name).unwrap_or(&EMPTY)
    }
}

/// Ancestors of `name` in merge order: furthest first, each listed once.
fn resolve_ancestors(
    name: &str,
    components: &ConfigMap,
    component_type: &str,
    stack_file: &str,
) -> Result<Vec<String>> {
    let mut ancestors = Vec::new();
    let mut visiting = vec![name.to_string()];
    collect_ancestors(name, components, component_type, stack_file, &mut visiting, &mut ancestors)?;
    Ok(ancestors)
}

fn collect_ancestors(
    name: &str,
    components: &ConfigMap,
    component_type: &str,
    stack_file: &str,
    visiting: &mut Vec<String>,
    ancestors: &mut Vec<String>,
) -> Result<()> {
    for parent in direct_parents(name, components, component_type, stack_file)? {
        if visiting.contains(&parent) {
            let mut cycle = visiting.clone();
            cycle.push(parent);
            return Err(StackError::structure(format!(
                "inheritance cycle between components in 'components/{component_type}' of the stack file '{stack_file}': {}",
                cycle.join(" -> ")
            )));
        }

        visiting.push(parent.clone());
        collect_ancestors(&parent, components, component_type, stack_file, visiting, ancestors)?;
        visiting.pop();

        if !ancestors.contains(&parent) {
            ancestors.push(parent);
        }
    }
    Ok(())
}

fn direct_parents(
    name: &str,
    components: &ConfigMap,
    component_type: &str,
    stack_file: &str,
) -> Result<Vec<String>> {
    let Some(ConfigValue::Mapping(section)) = components.get(name) else {
        return Err(StackError::structure(format!(
            "the config of the component '{name}' in the stack file '{stack_file}' must be a mapping"
        )));
    };

    let mut parents = Vec::new();

    // A `component` attribute that is not a defined component only names a module.
    let base = section.string_or_empty(COMPONENT_SECTION);
    if !base.is_empty() && base != name && components.contains_key(&base) {
        parents.push(base);
    }

    let inherits = section
        .mapping_or_empty(METADATA_SECTION)
        .get(INHERITS_SECTION)
        .map(ConfigValue::string_list)
        .unwrap_or_default();
    for parent in inherits {
        if !components.contains_key(&parent) {
            return Err(StackError::structure(format!(
                "the component '{name}' in the stack file '{stack_file}' inherits from \
                 '{parent}', but '{parent}' is not defined in 'components/{component_type}'"
            )));
        }
        if parent != name && !parents.contains(&parent) {
            parents.push(parent);
        }
    }

    Ok(parents)
}

fn build_component(
    name: &str,
    components: &ConfigMap,
    ancestors: &[String],
    globals: &Layer,
    type_layer: &Layer,
    stack_file: &str,
) -> Result<ConfigMap> {
    let mut layers = Vec::with_capacity(ancestors.len() + 1);
    for ancestor in ancestors {
        let mut section = match components.get(ancestor) {
            Some(ConfigValue::Mapping(section)) => section.clone(),
            _ => ConfigMap::new(),
        };
        section.remove(METADATA_SECTION);
        layers.push(section);
    }
    if let Some(ConfigValue::Mapping(own)) = components.get(name) {
        layers.push(own.clone());
    }
    let component = merge_all(&layers);
    let own = Layer::read(&component, &TYPE_SECTIONS, name, stack_file)?;
    let mut result = component;

    for section in LAYERED_SECTIONS {
        let merged = merge_all([
            globals.section(section),
            type_layer.section(section),
            own.section(section),
        ]);
        if section != VARS_SECTION || globals.has_vars || type_layer.has_vars || own.has_vars {
            result.insert(section.to_string(), merged.into());
        }
    }

    let backend_type = if own.backend_type.is_empty() {
        type_layer.backend_type.clone()
    } else {
        own.backend_type.clone()
    };
    if !backend_type.is_empty() {
        let backend = merge_all([
            &type_layer.section(BACKEND_SECTION).mapping_or_empty(&backend_type),
            &own.section(BACKEND_SECTION).mapping_or_empty(&backend_type),
        ]);
        result.insert(BACKEND_TYPE_SECTION.to_string(), backend_type.into());
        result.insert(BACKEND_SECTION.to_string(), backend.into());
    }

    let command = if own.command.is_empty() { &type_layer.command } else { &own.command };
    if !command.is_empty() {
        result.insert(COMMAND_SECTION.to_string(), command.as_str().into());
    }

    let overrides = merge_all([own.section(OVERRIDES_SECTION), type_layer.section(OVERRIDES_SECTION)]);
    if !overrides.is_empty() {
        apply_overrides(&mut result, &overrides);
        result.insert(OVERRIDES_SECTION.to_string(), overrides.into());
    }

    if !ancestors.is_empty() {
        let nearest_first: Vec<String> = ancestors.iter().rev().cloned().collect();
        result.insert(INHERITANCE_SECTION.to_string(), nearest_first.into());
    }

    Ok(result)
}

fn apply_overrides(component: &mut ConfigMap, overrides: &ConfigMap) {
    for section in LAYERED_SECTIONS {
        if let Some(ConfigValue::Mapping(patch)) = overrides.get(section)
            && let Some(ConfigValue::Mapping(target)) = component.get_mut(section)
        {
            deep_merge(target, patch);
        }
    }
    if let Some(command) = overrides.get(COMMAND_SECTION).and_then(ConfigValue::scalar_to_string)
        && !command.is_empty()
    {
        component.insert(COMMAND_SECTION.to_string(), command.into());
    }
}
