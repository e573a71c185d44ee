//! Mapping a stack token to exactly one stack.
//!
//! In logical mode the token is compared with the name each stack renders from its
//! own context. The search runs in two phases: every stack is rendered first, then
//! the matches are counted. One match is returned, several are a
//! [`StackError::DuplicateStack`] error, and none is a [`StackError::NotFound`]
//! error listing close names.
//!
//! A stack whose component is malformed, or whose context cannot render the name
//! pattern, is skipped. Its reason is listed in the `NotFound` message when nothing
//! matches.

use std::collections::BTreeSet;
use tracing::{debug, trace};

use super::{ResolvedStacks, StackMode};
use crate::component::{ComponentRecord, locate_component, validate_request};
use crate::context::{ContextIdentity, extract_context, render_prefix};
use crate::core::suggest::find_similar;
use crate::core::{Result, StackError};
use crate::value::ConfigValue;

/// The stack a token resolved to, with the component found in it.
#[derive(Debug, Clone)]
pub struct StackMatch {
    /// Root manifest identifier of the stack.
    pub stack_key: String,
    pub record: ComponentRecord,
    pub identity: ContextIdentity,
}

/// Find the stack `stack_token` refers to and the component in it.
///
/// # Errors
///
/// - [`StackError::Validation`] for empty inputs
/// - [`StackError::NotFound`] when no stack matches, or when the stack matched in
///   directory mode lacks the component
/// - [`StackError::DuplicateStack`] when several stacks render to the token
/// - [`StackError::Structure`] for a malformed component in directory mode
pub fn find_stack(
    resolved: &ResolvedStacks,
    stack_token: &str,
    component_type: &str,
    component: &str,
    name_pattern: &str,
) -> Result<StackMatch> {
    validate_request(stack_token, component_type, component)?;

    if resolved.mode == StackMode::Directory {
        let record = locate_component(&resolved.stacks, stack_token, component_type, component)?;
        return Ok(matched(stack_token, record));
    }

    let mut matches = Vec::new();
    let mut rendered_names = BTreeSet::new();
    let mut known_components = BTreeSet::new();
    let mut skipped = Vec::new();

    for stack_key in resolved.stack_names() {
        let record = match locate_component(&resolved.stacks, stack_key, component_type, component)
        {
            Ok(record) => record,
            Err(StackError::NotFound { .. }) => {
                known_components.extend(component_names(resolved, stack_key, component_type));
                trace!("Stack '{}' has no component '{}'", stack_key, component);
                continue;
            }
            Err(e) => {
                debug!("Skipping stack '{}': {}", stack_key, e);
                skipped.push(format!("{stack_key}: {e}"));
                continue;
            }
        };

        let candidate = matched(stack_key, record);
        let prefix = match render_prefix(stack_token, &candidate.identity, name_pattern, stack_key) {
            Ok(prefix) => prefix,
            Err(e) => {
                debug!("Skipping stack '{}': {}", stack_key, e);
                skipped.push(format!("{stack_key}: {e}"));
                continue;
            }
        };
        trace!("Stack '{}' renders to '{}'", stack_key, prefix);

        if prefix == stack_token {
            matches.push(candidate);
        } else {
            rendered_names.insert(prefix);
        }
    }

    match matches.len() {
        0 => {
            for stack_key in resolved.stack_names() {
                trace!("Searched stack manifest '{}'", stack_key);
            }
            let suggestions = if rendered_names.is_empty() {
                find_similar(component, known_components.iter().map(String::as_str))
            } else {
                find_similar(stack_token, rendered_names.iter().map(String::as_str))
            };
            let mut message = format!(
                "Searched all stack YAML files, but could not find config for the component \
                 '{component}' in the stack '{stack_token}'.\n\
                 Check that all variables in the stack name pattern '{name_pattern}' are correctly \
                 defined in the stack config files.\n\
                 Are the component and stack names correct? Did you forget an import?"
            );
            if !skipped.is_empty() {
                message.push_str("\nStacks that could not be checked:");
                for reason in &skipped {
                    message.push_str("\n  ");
                    message.push_str(reason);
                }
            }
            Err(StackError::not_found(message).with_suggestions(suggestions))
        }
        1 => {
            let found = matches.remove(0);
            debug!("Stack '{}' resolved to the manifest '{}'", stack_token, found.stack_key);
            Ok(found)
        }
        _ => Err(StackError::DuplicateStack {
            component: component.to_string(),
            stack: stack_token.to_string(),
            name_pattern: name_pattern.to_string(),
            files: matches.into_iter().map(|m| m.stack_key).collect(),
        }),
    }
}

fn matched(stack_key: &str, record: ComponentRecord) -> StackMatch {
    let identity =
        extract_context(&record.vars).with_component(&record.component, &record.base_component);
    StackMatch {
        stack_key: stack_key.to_string(),
        record,
        identity,
    }
}

fn component_names(resolved: &ResolvedStacks, stack_key: &str, component_type: &str) -> Vec<String> {
    resolved
        .stacks
        .get(stack_key)
        .and_then(|stack| stack.get_path(&["components", component_type]))
        .and_then(ConfigValue::as_mapping)
        .map(|components| components.keys().cloned().collect())
        .unwrap_or_default()
}
