//! Component lookup in resolved stacks.
//!
//! [`locate_component`] descends `stack -> components -> <type> -> <name>` in a
//! resolved stack map and extracts the sections an invoker needs into a
//! [`ComponentRecord`]. Each missing level has its own error message, since those
//! messages are what users see when a manifest is misconfigured.
//!
//! `vars` is required. Every other section defaults to empty.

pub mod metadata;

pub use metadata::{Classification, ComponentPath, ModuleLocation, classify_component};

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::constants::{
    BACKEND_SECTION, BACKEND_TYPE_SECTION, COMMAND_SECTION, COMPONENTS_SECTION, ENV_SECTION,
    IMPORTS_SECTION, INHERITANCE_SECTION, OVERRIDES_SECTION, SETTINGS_SECTION, VARS_SECTION,
};
use crate::core::suggest::find_similar;
use crate::core::{Result, StackError};
use crate::value::{ConfigMap, ConfigMapExt, ConfigValue};

/// The tool a component is deployed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ComponentType {
    Terraform,
    Helmfile,
}

impl ComponentType {
    pub const ALL: [Self; 2] = [Self::Terraform, Self::Helmfile];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Terraform => "terraform",
            Self::Helmfile => "helmfile",
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentType {
    type Err = StackError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "terraform" => Ok(Self::Terraform),
            "helmfile" => Ok(Self::Helmfile),
            other => Err(StackError::validation(format!(
                "invalid component type '{other}', expected 'terraform' or 'helmfile'"
            ))),
        }
    }
}

/// One component of one stack, with defaults applied. Built fresh per request.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentRecord {
    pub stack: String,
    pub component_type: String,
    pub component: String,
    /// The whole component section as resolved.
    pub section: ConfigMap,
    pub vars: ConfigMap,
    pub settings: ConfigMap,
    pub overrides: ConfigMap,
    /// Environment variables with `null` entries removed.
    pub env: ConfigMap,
    pub backend: ConfigMap,
    pub backend_type: String,
    pub command: String,
    /// Manifests the stack imports, sorted.
    pub imports: Vec<String>,
    /// Ancestor components, nearest first.
    pub inheritance: Vec<String>,
    pub metadata: ConfigMap,
    /// Empty when the component deploys its own module.
    pub base_component: String,
    pub is_abstract: bool,
}

impl ComponentRecord {
    /// Environment as sorted `KEY=value` pairs for a child process.
    ///
    /// Mappings and sequences are rendered as JSON.
    pub fn env_list(&self) -> Vec<String> {
        self.env
            .iter()
            .map(|(key, value)| {
                let rendered = value
                    .scalar_to_string()
                    .or_else(|| value.to_json_string(false).ok())
                    .unwrap_or_default();
                format!("{key}={rendered}")
            })
            .collect()
    }

    /// Where the component's module lives.
    pub fn module_location(&self) -> ModuleLocation {
        ModuleLocation::new(&self.component, &self.base_component)
    }
}

/// Find a component in a resolved stack map.
///
/// # Errors
///
/// - [`StackError::Validation`] when `stack`, `component_type` or `component` is empty
/// - [`StackError::NotFound`] naming the missing level: stack, `components`,
///   `components/<type>`, or the component (with close names as suggestions)
/// - [`StackError::Structure`] when a level is not a mapping or `vars` is missing
pub fn locate_component(
    stacks: &ConfigMap,
    stack: &str,
    component_type: &str,
    component: &str,
) -> Result<ComponentRecord> {
    validate_request(stack, component_type, component)?;

    let stack_section = match stacks.get(stack) {
        None => return Err(StackError::not_found(format!("could not find the stack '{stack}'"))),
        Some(ConfigValue::Mapping(map)) => map,
        Some(other) => {
            return Err(StackError::structure(format!(
                "the stack '{stack}' must be a mapping, found a {}",
                other.kind()
            )));
        }
    };

    let components = descend(
        stack_section,
        COMPONENTS_SECTION,
        || format!("'components' section is missing in the stack file '{stack}'"),
        || format!("'components' section in the stack file '{stack}'"),
    )?;

    let type_section = descend(
        components,
        component_type,
        || format!("'components/{component_type}' section is missing in the stack file '{stack}'"),
        || format!("'components/{component_type}' section in the stack file '{stack}'"),
    )?;

    let section = match type_section.get(component) {
        None => {
            let suggestions = find_similar(component, type_section.keys().map(String::as_str));
            return Err(StackError::not_found(format!(
                "no config found for the component '{component}' in the stack file '{stack}'"
            ))
            .with_suggestions(suggestions));
        }
        Some(ConfigValue::Mapping(map)) => map,
        Some(other) => {
            return Err(StackError::structure(format!(
                "the config of the component '{component}' in the stack file '{stack}' must be a mapping, found a {}",
                other.kind()
            )));
        }
    };

    let vars = match section.get(VARS_SECTION) {
        Some(ConfigValue::Mapping(vars)) => vars.clone(),
        Some(ConfigValue::Null) | None => {
            return Err(StackError::structure(format!(
                "missing 'vars' section for the component '{component}' in the stack file '{stack}'"
            )));
        }
        Some(other) => {
            return Err(StackError::structure(format!(
                "'vars' section for the component '{component}' in the stack file '{stack}' must be a mapping, found a {}",
                other.kind()
            )));
        }
    };

    let env = section
        .mapping_or_empty(ENV_SECTION)
        .into_iter()
        .filter(|(_, value)| !value.is_null())
        .collect();

    let Classification {
        metadata,
        base_component,
        is_abstract,
    } = classify_component(component, section);

    Ok(ComponentRecord {
        stack: stack.to_string(),
        component_type: component_type.to_string(),
        component: component.to_string(),
        vars,
        settings: section.mapping_or_empty(SETTINGS_SECTION),
        overrides: section.mapping_or_empty(OVERRIDES_SECTION),
        env,
        backend: section.mapping_or_empty(BACKEND_SECTION),
        backend_type: section.string_or_empty(BACKEND_TYPE_SECTION),
        command: section.string_or_empty(COMMAND_SECTION),
        imports: stack_section
            .get(IMPORTS_SECTION)
            .map(ConfigValue::string_list)
            .unwrap_or_default(),
        inheritance: section
            .get(INHERITANCE_SECTION)
            .map(ConfigValue::string_list)
            .unwrap_or_default(),
        metadata,
        base_component,
        is_abstract,
        section: section.clone(),
    })
}

/// Reject empty stack, component type or component names.
pub fn validate_request(stack: &str, component_type: &str, component: &str) -> Result<()> {
    if stack.is_empty() {
        return Err(StackError::validation("stack must be provided and must not be empty"));
    }
    if component.is_empty() {
        return Err(StackError::validation("component must be provided and must not be empty"));
    }
    if component_type.is_empty() {
        return Err(StackError::validation(
            "component type must be provided and must not be empty",
        ));
    }
    Ok(())
}

fn descend<'a>(
    parent: &'a ConfigMap,
    key: &str,
    missing: impl FnOnce() -> String,
    described: impl FnOnce() -> String,
) -> Result<&'a ConfigMap> {
    match parent.get(key) {
        None | Some(ConfigValue::Null) => Err(StackError::not_found(missing())),
        Some(ConfigValue::Mapping(map)) => Ok(map),
        Some(other) => Err(StackError::structure(format!(
            "{} must be a mapping, found a {}",
            described(),
            other.kind()
        ))),
    }
}
