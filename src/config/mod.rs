//! Engine configuration.
//!
//! [`EngineConfig`] tells the engine where stack manifests and component modules
//! live and how logical stack names are built. It is an explicit value handed to
//! every operation; nothing is read from process-global state.
//!
//! # Example (`stackres.yaml`)
//!
//! ```yaml
//! base_path: .
//! stacks:
//!   base_path: stacks
//!   included_paths: ["orgs/**/*"]
//!   excluded_paths: ["**/_defaults.yaml"]
//!   name_pattern: "{tenant}-{environment}-{stage}"
//! components:
//!   terraform:
//!     base_path: components/terraform
//!   helmfile:
//!     base_path: components/helmfile
//! integrations:
//!   atlantis:
//!     project_templates:
//!       project-1:
//!         name: "{tenant}-{environment}-{stage}-{component}"
//! ignore_missing_files: false
//! strip_sections: []
//! ```
//!
//! The same structure is accepted as TOML when the file ends in `.toml`.

pub mod parser;

pub use parser::parse_config;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::component::ComponentType;
use crate::constants::{
    DEFAULT_HELMFILE_BASE_PATH, DEFAULT_INCLUDED_PATH, DEFAULT_NAME_PATTERN,
    DEFAULT_STACKS_BASE_PATH, DEFAULT_TERRAFORM_BASE_PATH, NAME_PATTERN_DELIMITER,
};
use crate::context::CONTEXT_PLACEHOLDERS;
use crate::core::{Result, StackError};

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Root that `stacks.base_path` and component base paths are relative to.
    pub base_path: PathBuf,
    pub stacks: StacksConfig,
    pub components: ComponentsConfig,
    pub integrations: IntegrationsConfig,
    /// Skip `import:` entries that reference missing files instead of failing.
    pub ignore_missing_files: bool,
    /// Top-level keys removed from every described component.
    pub strip_sections: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("."),
            stacks: StacksConfig::default(),
            components: ComponentsConfig::default(),
            integrations: IntegrationsConfig::default(),
            ignore_missing_files: false,
            strip_sections: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StacksConfig {
    pub base_path: String,
    /// Globs, relative to the stacks directory, selecting root manifests.
    pub included_paths: Vec<String>,
    /// Globs removing manifests (catalogs, mixins) from the root set.
    pub excluded_paths: Vec<String>,
    /// Logical stack name pattern, e.g. `{tenant}-{environment}-{stage}`.
    ///
    /// Empty disables logical stack lookup; stack tokens must then name a manifest.
    pub name_pattern: String,
}

impl Default for StacksConfig {
    fn default() -> Self {
        Self {
            base_path: DEFAULT_STACKS_BASE_PATH.to_string(),
            included_paths: vec![DEFAULT_INCLUDED_PATH.to_string()],
            excluded_paths: Vec::new(),
            name_pattern: DEFAULT_NAME_PATTERN.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentsConfig {
    pub terraform: ToolConfig,
    pub helmfile: ToolConfig,
}

impl Default for ComponentsConfig {
    fn default() -> Self {
        Self {
            terraform: ToolConfig {
                base_path: DEFAULT_TERRAFORM_BASE_PATH.to_string(),
            },
            helmfile: ToolConfig {
                base_path: DEFAULT_HELMFILE_BASE_PATH.to_string(),
            },
        }
    }
}

/// Where the modules of one component type live.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    pub base_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrationsConfig {
    pub atlantis: AtlantisConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlantisConfig {
    /// Named project templates referenced by `settings.atlantis.project_template_name`.
    pub project_templates: BTreeMap<String, ProjectTemplate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectTemplate {
    /// Project name pattern with context tokens.
    pub name: String,
}

impl EngineConfig {
    /// Load a configuration file, falling back to defaults for absent keys.
    pub fn load(path: &Path) -> Result<Self> {
        let config: Self = parse_config(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Directory holding the stack manifests.
    pub fn stacks_base_dir(&self) -> PathBuf {
        self.base_path.join(&self.stacks.base_path)
    }

    /// Configured module base path for a component type, relative to `base_path`.
    pub fn tool_base_path(&self, component_type: ComponentType) -> &str {
        match component_type {
            ComponentType::Terraform => &self.components.terraform.base_path,
            ComponentType::Helmfile => &self.components.helmfile.base_path,
        }
    }

    /// Reject configurations that would make every lookup fail later.
    ///
    /// The name pattern may be empty. Otherwise every `-`-separated segment must be
    /// non-empty and every `{placeholder}` must be one the naming engine renders.
    pub fn validate(&self) -> Result<()> {
        if self.stacks.included_paths.is_empty() {
            return Err(StackError::config(
                "stacks.included_paths must list at least one glob pattern",
            ));
        }

        for pattern in self.stacks.included_paths.iter().chain(&self.stacks.excluded_paths) {
            glob::Pattern::new(pattern).map_err(|e| StackError::Pattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })?;
        }

        let name_pattern = &self.stacks.name_pattern;
        if name_pattern.is_empty() {
            return Ok(());
        }

        for segment in name_pattern.split(NAME_PATTERN_DELIMITER) {
            if segment.is_empty() {
                return Err(StackError::config(format!(
                    "stacks.name_pattern '{name_pattern}' contains an empty segment"
                )));
            }
            if segment.starts_with('{') && !CONTEXT_PLACEHOLDERS.contains(&segment) {
                return Err(StackError::config(format!(
                    "stacks.name_pattern '{name_pattern}' uses the unknown placeholder '{segment}'; \
                     supported placeholders are {}",
                    CONTEXT_PLACEHOLDERS.join(", ")
                )));
            }
        }

        Ok(())
    }
}
