//! Stack identity and derived names.
//!
//! A component's `vars` carry the context it is deployed in: `namespace`,
//! `tenant`, `environment`, `stage`, `region`, `attributes`. [`extract_context`]
//! reads them into a [`ContextIdentity`], which the rest of this module renders
//! through name patterns:
//!
//! - [`render_prefix`]: the logical stack name compared against user stack tokens
//! - [`derive_workspace`]: the deployment workspace
//! - [`spacelift_stack_name`] and [`atlantis_project_name`]: remote execution names
//!
//! The identity is a read-only view. Nothing here modifies a component.

pub mod naming;
pub mod workspace;

pub use naming::{atlantis_project_name, render_prefix, spacelift_stack_name};
pub use workspace::{derive_workspace, disambiguate_workspace};

use regex::Regex;
use std::sync::LazyLock;

use crate::value::{ConfigMap, ConfigValue};

/// Placeholders allowed in `stacks.name_pattern`.
pub const CONTEXT_PLACEHOLDERS: [&str; 4] =
    ["{namespace}", "{tenant}", "{environment}", "{stage}"];

static TOKEN_REGEX: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\{([a-z][a-z-]*)\}").ok());

/// Naming context of one component in one stack.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextIdentity {
    pub namespace: String,
    pub tenant: String,
    pub environment: String,
    pub stage: String,
    pub region: String,
    pub attributes: Vec<String>,
    /// Component name, `/` replaced with `-` where used in names.
    pub component: String,
    pub base_component: String,
    /// Set once the workspace has been derived.
    pub workspace: String,
}

impl ContextIdentity {
    /// Set the component names this identity describes.
    #[must_use]
    pub fn with_component(mut self, component: &str, base_component: &str) -> Self {
        self.component = component.to_string();
        self.base_component = base_component.to_string();
        self
    }

    /// Value of a context field by placeholder name, without braces.
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            "namespace" => Some(&self.namespace),
            "tenant" => Some(&self.tenant),
            "environment" => Some(&self.environment),
            "stage" => Some(&self.stage),
            "region" => Some(&self.region),
            "component" => Some(&self.component),
            "base-component" => Some(&self.base_component),
            "workspace" => Some(&self.workspace),
            _ => None,
        }
    }
}

/// Read the context fields from a component's `vars`.
///
/// Missing keys leave their field empty. Numbers and booleans are rendered as text.
pub fn extract_context(vars: &ConfigMap) -> ContextIdentity {
    let text = |key: &str| {
        vars.get(key).and_then(ConfigValue::scalar_to_string).unwrap_or_default()
    };

    let attributes = match vars.get("attributes") {
        Some(ConfigValue::Sequence(items)) => {
            items.iter().filter_map(ConfigValue::scalar_to_string).collect()
        }
        _ => Vec::new(),
    };

    ContextIdentity {
        namespace: text("namespace"),
        tenant: text("tenant"),
        environment: text("environment"),
        stage: text("stage"),
        region: text("region"),
        attributes,
        ..ContextIdentity::default()
    }
}

/// Substitute context tokens in `pattern`.
///
/// Supported tokens: `{namespace}`, `{tenant}`, `{environment}`, `{stage}`,
/// `{region}`, `{component}`, `{base-component}`, `{attributes}` (joined with `-`)
/// and `{workspace}`. Unknown tokens are left as written.
pub fn replace_context_tokens(identity: &ContextIdentity, pattern: &str) -> String {
    let Some(regex) = TOKEN_REGEX.as_ref() else {
        return pattern.to_string();
    };

    regex
        .replace_all(pattern, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            if name == "attributes" {
                identity.attributes.join("-")
            } else {
                identity.field(name).map_or_else(|| caps[0].to_string(), str::to_string)
            }
        })
        .into_owned()
}
