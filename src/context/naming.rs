//! Logical stack names and remote execution project names.

use std::collections::BTreeMap;

use super::{ContextIdentity, replace_context_tokens};
use crate::config::ProjectTemplate;
use crate::constants::NAME_PATTERN_DELIMITER;
use crate::core::{Result, StackError};
use crate::value::{ConfigMap, ConfigValue};

/// Render the stack name pattern against an identity.
///
/// `stack_token` and `stack_file` only appear in error messages. Placeholder
/// segments require the matching field; literal segments are kept as written.
///
/// # Errors
///
/// - [`StackError::Config`] for an empty pattern
/// - [`StackError::Structure`] when a placeholder's field is empty
pub fn render_prefix(
    stack_token: &str,
    identity: &ContextIdentity,
    name_pattern: &str,
    stack_file: &str,
) -> Result<String> {
    if name_pattern.is_empty() {
        return Err(StackError::config(
            "the stack name pattern must be provided in 'stacks.name_pattern'",
        ));
    }

    let mut parts = Vec::new();
    for segment in name_pattern.split(NAME_PATTERN_DELIMITER) {
        let field = match segment {
            "{namespace}" => "namespace",
            "{tenant}" => "tenant",
            "{environment}" => "environment",
            "{stage}" => "stage",
            literal => {
                parts.push(literal.to_string());
                continue;
            }
        };

        let value = identity.field(field).unwrap_or_default();
        if value.is_empty() {
            return Err(StackError::structure(format!(
                "the stack name pattern '{name_pattern}' specifies '{field}', but the stack \
                 '{stack_token}' does not have a {field} defined in the stack file '{stack_file}'"
            )));
        }
        parts.push(value.to_string());
    }

    Ok(parts.join("-"))
}

/// The stack prefix used in derived names.
///
/// Without a name pattern the stack token itself is used, with `/` replaced by `-`.
pub(crate) fn context_prefix(
    stack_token: &str,
    identity: &ContextIdentity,
    name_pattern: &str,
) -> Result<String> {
    if name_pattern.is_empty() {
        Ok(stack_token.replace('/', "-"))
    } else {
        render_prefix(stack_token, identity, name_pattern, stack_token)
    }
}

/// Spacelift stack name, when `settings.spacelift.workspace_enabled` is true.
///
/// `settings.spacelift.stack_name_pattern` wins over the default
/// `<stack prefix>-<component>`. Any `/` in the result becomes `-`.
pub fn spacelift_stack_name(
    settings: &ConfigMap,
    identity: &ContextIdentity,
    stack_token: &str,
    name_pattern: &str,
) -> Result<Option<String>> {
    let Some(spacelift) = settings.get("spacelift").and_then(ConfigValue::as_mapping) else {
        return Ok(None);
    };
    if spacelift.get("workspace_enabled").and_then(ConfigValue::as_bool) != Some(true) {
        return Ok(None);
    }

    let identity = ContextIdentity {
        component: identity.component.replace('/', "-"),
        ..identity.clone()
    };

    let name = match spacelift.get("stack_name_pattern").and_then(ConfigValue::as_str) {
        Some(pattern) if !pattern.is_empty() => replace_context_tokens(&identity, pattern),
        _ => {
            let prefix = context_prefix(stack_token, &identity, name_pattern)?;
            format!("{prefix}-{}", identity.component)
        }
    };

    Ok(Some(name.replace('/', "-")))
}

/// Atlantis project name.
///
/// An inline `settings.atlantis.project_template` wins over
/// `settings.atlantis.project_template_name`, which names one of the configured
/// templates. Without a template name there is no project.
pub fn atlantis_project_name(
    settings: &ConfigMap,
    identity: &ContextIdentity,
    templates: &BTreeMap<String, ProjectTemplate>,
) -> Option<String> {
    let atlantis = settings.get("atlantis").and_then(ConfigValue::as_mapping)?;

    let template_name = if let Some(inline) = atlantis.get("project_template") {
        inline.get("name").and_then(ConfigValue::as_str).map(str::to_string)
    } else {
        atlantis
            .get("project_template_name")
            .and_then(ConfigValue::as_str)
            .and_then(|name| templates.get(name))
            .map(|template| template.name.clone())
    };

    template_name
        .filter(|name| !name.is_empty())
        .map(|name| replace_context_tokens(identity, &name))
}
