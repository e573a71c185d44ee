//! Deployment workspace names.
//!
//! Precedence, highest first:
//!
//! 1. `metadata.terraform_workspace`, used as written
//! 2. `metadata.terraform_workspace_pattern`, with context tokens replaced
//! 3. the stack prefix, disambiguated by [`disambiguate_workspace`]
//!
//! Any `/` in the result becomes `-`.

use super::naming::context_prefix;
use super::{ContextIdentity, replace_context_tokens};
use crate::constants::{WORKSPACE_OVERRIDE_KEY, WORKSPACE_PATTERN_KEY};
use crate::core::Result;
use crate::value::{ConfigMap, ConfigValue};

/// Derive the workspace for a component in a stack.
///
/// `identity.component` is the component name and `identity.base_component` its
/// base, empty when it has none.
pub fn derive_workspace(
    stack_token: &str,
    name_pattern: &str,
    metadata: &ConfigMap,
    identity: &ContextIdentity,
) -> Result<String> {
    let explicit = |key: &str| {
        metadata.get(key).and_then(ConfigValue::as_str).filter(|value| !value.is_empty())
    };

    let workspace = if let Some(workspace) = explicit(WORKSPACE_OVERRIDE_KEY) {
        workspace.to_string()
    } else if let Some(pattern) = explicit(WORKSPACE_PATTERN_KEY) {
        replace_context_tokens(identity, pattern)
    } else {
        let prefix = context_prefix(stack_token, identity, name_pattern)?;
        disambiguate_workspace(&prefix, identity)
    };

    Ok(workspace.replace('/', "-"))
}

/// Default workspace for a stack prefix.
///
/// A component deploying its own module owns the stack prefix as its workspace.
/// Components sharing a module through a base component all render to the same
/// prefix, so they get `<prefix>-<component>` to keep state separate.
pub fn disambiguate_workspace(prefix: &str, identity: &ContextIdentity) -> String {
    if identity.base_component.is_empty() {
        prefix.to_string()
    } else {
        format!("{prefix}-{}", identity.component)
    }
}
